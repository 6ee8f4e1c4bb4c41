mod cli;

use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use qrs_reclaim::{
    error::{self, ReclaimError},
    qrs::{Filter, FilterOp, RepositoryClient},
    reclaim::{
        eligibility::{cutoff_date, MAX_RETENTION_DAYS},
        LicenseReclaimer, MissingLastUsedPolicy,
    },
    utils, Config,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "qrs_reclaim=debug,info"
    } else {
        "qrs_reclaim=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    install_cancellation(&config, cancel.clone());

    let result = match cli.command {
        Commands::Reclaim { dry_run, yes, retention_days, missing_last_used } => {
            run_reclaim(&config, cancel, dry_run, yes, retention_days, missing_last_used).await
        }

        Commands::List { full, filter_property, filter_op, filter_value, format } => {
            list_entries(&config, cancel, full, filter_property, filter_op, filter_value, &format).await
        }

        Commands::LoginAccess { full } => login_access(&config, cancel, full).await,

        Commands::Delete { id, yes } => delete_entry(&config, cancel, &id, yes).await,

        Commands::ProxyStatus { endpoint } => proxy_status(&config, cancel, &endpoint).await,

        Commands::ShowConfig => show_config(&config),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

/// Ctrl-C and the optional run deadline both cancel in-flight work
fn install_cancellation(config: &Config, cancel: CancellationToken) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    if let Some(deadline) = config.run_timeout() {
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            warn!("Run exceeded {:?}, cancelling", deadline);
            cancel.cancel();
        });
    }
}

fn connect(config: &Config, cancel: CancellationToken) -> error::Result<RepositoryClient> {
    info!("Connecting to QRS at {}", config.repository.server);
    RepositoryClient::connect(config.connection_profile(), config.request_timeout(), cancel)
}

async fn run_reclaim(
    config: &Config,
    cancel: CancellationToken,
    dry_run: bool,
    yes: bool,
    retention_days: Option<u32>,
    missing_last_used: Option<MissingLastUsedPolicy>,
) -> error::Result<()> {
    let mut options = config.reclaim_options();
    options.dry_run |= dry_run;
    if let Some(days) = retention_days {
        if days == 0 || days > MAX_RETENTION_DAYS {
            return Err(ReclaimError::Config(format!(
                "--retention-days must be between 1 and {}",
                MAX_RETENTION_DAYS
            )));
        }
        options.retention_days = days;
    }
    if let Some(policy) = missing_last_used {
        options.missing_last_used = policy;
    }

    let today = Local::now().date_naive();
    let cutoff = cutoff_date(today, options.retention_days)?;
    println!(
        "{}",
        format!("Deleting licenses unused since {} (today {})", cutoff, today).cyan()
    );

    if !yes && !options.dry_run
        && !utils::confirm_action(&format!("Delete every allocation last used on or before {}?", cutoff))?
    {
        println!("Cancelled");
        return Ok(());
    }

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .map_err(|e| ReclaimError::Config(e.to_string()))?,
    );

    let client = connect(config, cancel.clone())?;
    let mut reclaimer = LicenseReclaimer::new(client, options, cancel).with_progress(progress);
    let summary = reclaimer.run(today).await?;

    for report in &summary.reports {
        println!(
            "{:<16} {:<24} {:<10} {}",
            utils::format_id(&report.id),
            report.user_name,
            utils::format_last_used(report.last_used.as_deref()),
            utils::format_outcome(&report.outcome)
        );
    }

    summary.print_summary();

    match summary.failure() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn list_entries(
    config: &Config,
    cancel: CancellationToken,
    full: bool,
    filter_property: Option<String>,
    filter_op: FilterOp,
    filter_value: Option<String>,
    format: &str,
) -> error::Result<()> {
    let filter = match (filter_property, filter_value) {
        (Some(property), Some(value)) => Some(Filter::new(&property, filter_op, &value)?),
        _ => None,
    };

    let client = connect(config, cancel)?;
    let entries = client.get_user_access_type(full, filter.as_ref()).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", format!("{} user access allocations", entries.len()).cyan().bold());
    utils::print_table_border(56);
    utils::print_table_row(&["Id", "User", "Last Used"], &[16, 24, 12]);
    utils::print_table_border(56);
    for entry in &entries {
        utils::print_table_row(
            &[
                &utils::format_id(&entry.id),
                entry.user_name(),
                &utils::format_last_used(entry.last_used.as_deref()),
            ],
            &[16, 24, 12],
        );
    }
    utils::print_table_border(56);

    Ok(())
}

async fn login_access(config: &Config, cancel: CancellationToken, full: bool) -> error::Result<()> {
    let client = connect(config, cancel)?;
    let rules = client.get_login_access_type(full, None).await?;
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}

async fn delete_entry(config: &Config, cancel: CancellationToken, id: &str, yes: bool) -> error::Result<()> {
    if !yes && !utils::confirm_action(&format!("Delete allocation {}?", id))? {
        println!("Cancelled");
        return Ok(());
    }

    let client = connect(config, cancel)?;
    let status = client.delete_user_access_type(id).await?;
    println!("result={}", status);

    if !(200..300).contains(&status) {
        return Err(ReclaimError::RemoteRejected { status, body: String::new() });
    }
    Ok(())
}

async fn proxy_status(config: &Config, cancel: CancellationToken, endpoint: &str) -> error::Result<()> {
    let client = connect(config, cancel)?;
    let status = client.get_proxy_status(endpoint).await?;
    println!("{} {}", client.profile().proxy_host(), status);
    Ok(())
}

fn show_config(config: &Config) -> error::Result<()> {
    let rendered = toml::to_string_pretty(&config.redacted())
        .map_err(|e| ReclaimError::Config(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}
