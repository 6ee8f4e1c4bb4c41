pub mod qrs;
pub mod reclaim;
pub mod config;
pub mod error;
pub mod utils;

pub use error::{Result, ReclaimError};
pub use config::Config;
pub use qrs::RepositoryClient;
pub use reclaim::LicenseReclaimer;
