use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::{
    qrs::types::{ConnectionProfile, DomainCredential, IdentityClaim},
    reclaim::{
        eligibility::{MissingLastUsedPolicy, DEFAULT_RETENTION_DAYS, MAX_RETENTION_DAYS},
        engine::ReclaimOptions,
    },
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub repository: RepositoryConfig,
    pub certificates: CertificateConfig,
    #[serde(default)]
    pub identity: IdentityClaim,
    #[serde(default)]
    pub credential: Option<DomainCredential>,
    #[serde(default)]
    pub reclaim: ReclaimConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RepositoryConfig {
    /// `host:port` of the repository service, e.g. `qlik.example.com:4242`
    pub server: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CertificateConfig {
    pub client: PathBuf,
    pub client_key: PathBuf,
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReclaimConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default)]
    pub missing_last_used: MissingLastUsedPolicy,
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            missing_last_used: MissingLastUsedPolicy::default(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound for a whole run; unset means unbounded
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            run_timeout_secs: None,
        }
    }
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Layer `path` (any extension the `config` crate knows) under `QRS__*` env vars.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("QRS").separator("__"))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.repository.server.trim().is_empty() {
            anyhow::bail!("repository.server must not be empty");
        }
        if self.repository.server.contains('/') {
            anyhow::bail!(
                "repository.server must be host:port, not a URL: {}",
                self.repository.server
            );
        }
        if self.reclaim.retention_days == 0 || self.reclaim.retention_days > MAX_RETENTION_DAYS {
            anyhow::bail!(
                "reclaim.retention_days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS,
                self.reclaim.retention_days
            );
        }
        if self.credential.is_some() {
            anyhow::bail!(
                "[credential] needs NTLM, which is not supported; remove it and use client certificates"
            );
        }
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn connection_profile(&self) -> ConnectionProfile {
        let mut profile = ConnectionProfile::new(
            &self.repository.server,
            self.certificates.client.clone(),
            self.certificates.client_key.clone(),
        )
        .with_identity(self.identity.clone());

        if let Some(root) = &self.certificates.root {
            profile = profile.with_root_cert(root.clone());
        }
        if let Some(credential) = &self.credential {
            profile = profile.with_credential(credential.clone());
        }
        profile
    }

    pub fn reclaim_options(&self) -> ReclaimOptions {
        ReclaimOptions {
            retention_days: self.reclaim.retention_days,
            missing_last_used: self.reclaim.missing_last_used,
            dry_run: self.reclaim.dry_run,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.http.run_timeout_secs.map(Duration::from_secs)
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(credential) = config.credential.as_mut() {
            credential.password = "********".to_string();
        }
        config
    }
}
