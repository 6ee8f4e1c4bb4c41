use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReclaimError {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote service rejected request with status {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid lastUsed date '{value}' on entry {id}")]
    InvalidDate { id: String, value: String },

    #[error("Entry {id} has no lastUsed date")]
    MissingLastUsed { id: String },

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReclaimError {
    /// Network-level failures: the request never produced an HTTP status.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, ReclaimError::Transport(_) | ReclaimError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, ReclaimError>;
