pub mod eligibility;
pub mod engine;
pub mod summary;

pub use eligibility::{EligibilityChecker, MissingLastUsedPolicy};
pub use engine::{LicenseReclaimer, ReclaimOptions, ReclaimPhase};
pub use summary::{EntryOutcome, EntryReport, ReclaimSummary};
