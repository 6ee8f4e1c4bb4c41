use clap::{Parser, Subcommand};
use qrs_reclaim::{qrs::FilterOp, reclaim::MissingLastUsedPolicy};

#[derive(Parser)]
#[command(name = "qrs-reclaim")]
#[command(about = "Reclaim unused named-user licenses from a Qlik Sense repository")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (extension optional)
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Delete allocations unused for longer than the retention window
    Reclaim {
        /// Report what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Override the configured retention window
        #[arg(long)]
        retention_days: Option<u32>,

        /// Override the policy for entries without a lastUsed date
        #[arg(long, value_enum)]
        missing_last_used: Option<MissingLastUsedPolicy>,
    },

    /// List user access allocations
    List {
        /// Include the full user record
        #[arg(long)]
        full: bool,

        /// Property to filter on, e.g. user.name
        #[arg(long, requires = "filter_value")]
        filter_property: Option<String>,

        /// Filter operator
        #[arg(long, value_enum, default_value = "eq")]
        filter_op: FilterOp,

        /// Value to filter on
        #[arg(long, requires = "filter_property")]
        filter_value: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Dump login access type rules as JSON
    LoginAccess {
        /// Include full records
        #[arg(long)]
        full: bool,
    },

    /// Delete a single allocation by id
    Delete {
        /// Allocation id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Query a proxy service endpoint and print the status code
    ProxyStatus {
        /// Endpoint path relative to the proxy host, e.g. qps/user
        endpoint: String,
    },

    /// Print the effective configuration
    ShowConfig,
}
