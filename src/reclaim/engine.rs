use chrono::NaiveDate;
use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::{ReclaimError, Result},
    qrs::{client::RepositoryClient, types::UserAccessEntry},
    reclaim::{
        eligibility::{Eligibility, EligibilityChecker, MissingLastUsedPolicy, DEFAULT_RETENTION_DAYS},
        summary::{EntryOutcome, EntryReport, ReclaimSummary},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimPhase {
    Idle,
    Fetching,
    Evaluating,
    Deleting,
    Done,
}

#[derive(Debug, Clone, Copy)]
pub struct ReclaimOptions {
    pub retention_days: u32,
    pub missing_last_used: MissingLastUsedPolicy,
    pub dry_run: bool,
}

impl Default for ReclaimOptions {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            missing_last_used: MissingLastUsedPolicy::default(),
            dry_run: false,
        }
    }
}

/// Deletes user access allocations that have been idle longer than the retention window.
pub struct LicenseReclaimer {
    client: RepositoryClient,
    options: ReclaimOptions,
    cancel: CancellationToken,
    progress: ProgressBar,
    phase: ReclaimPhase,
}

impl LicenseReclaimer {
    pub fn new(client: RepositoryClient, options: ReclaimOptions, cancel: CancellationToken) -> Self {
        Self {
            client,
            options,
            cancel,
            progress: ProgressBar::hidden(),
            phase: ReclaimPhase::Idle,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn phase(&self) -> ReclaimPhase {
        self.phase
    }

    /// One reclaim pass relative to `today`.
    ///
    /// Only an invalid retention window or a failed fetch aborts with an error.
    /// Per-entry failures are recorded in the summary; cancellation stops the
    /// loop and marks it.
    pub async fn run(&mut self, today: NaiveDate) -> Result<ReclaimSummary> {
        let checker = EligibilityChecker::new(today, self.options.retention_days, self.options.missing_last_used)?;

        self.phase = ReclaimPhase::Fetching;
        let entries = match self.client.get_user_access_type(true, None).await {
            Ok(entries) => entries,
            Err(e) => {
                self.phase = ReclaimPhase::Done;
                return Err(e);
            }
        };

        let mut summary = ReclaimSummary::new(today, checker.cutoff(), entries.len(), self.options.dry_run);

        info!(
            "Reclaiming licenses unused since {} (today {}), {} allocations fetched",
            checker.cutoff(),
            today,
            entries.len()
        );

        summary.server_count = self.verify_listing(entries.len()).await;

        self.progress.set_length(entries.len() as u64);

        for entry in &entries {
            if self.cancel.is_cancelled() {
                warn!("Reclaim cancelled after {} of {} entries", summary.processed(), entries.len());
                summary.cancelled = true;
                break;
            }

            self.phase = ReclaimPhase::Evaluating;
            self.progress.set_message(entry.user_name().to_string());
            debug!("{} ({}): {}", entry.id, entry.user_name(), checker.describe(entry));

            let outcome = match checker.evaluate(entry) {
                Ok(Eligibility::Eligible { .. }) => {
                    self.phase = ReclaimPhase::Deleting;
                    self.reclaim_entry(entry).await
                }
                Ok(Eligibility::Retained { .. }) => EntryOutcome::Retained,
                Ok(Eligibility::NeverUsed) => EntryOutcome::Skipped,
                Err(e) => {
                    warn!("Cannot evaluate {} ({}): {}", entry.id, entry.user_name(), e);
                    EntryOutcome::Failed(e)
                }
            };

            let cancelled = matches!(outcome, EntryOutcome::Failed(ReclaimError::Cancelled));

            summary.record(EntryReport {
                id: entry.id.clone(),
                user_name: entry.user_name().to_string(),
                last_used: entry.last_used.clone(),
                outcome,
            });
            self.progress.inc(1);

            if cancelled {
                summary.cancelled = true;
                break;
            }
        }

        self.progress.finish_and_clear();
        self.phase = ReclaimPhase::Done;

        info!(
            "Reclaim complete: {} deleted, {} retained, {} skipped, {} failed",
            summary.deleted + summary.would_delete,
            summary.retained,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    async fn reclaim_entry(&self, entry: &UserAccessEntry) -> EntryOutcome {
        if self.options.dry_run {
            info!("DRY RUN: would delete {} ({})", entry.id, entry.user_name());
            return EntryOutcome::WouldDelete;
        }

        match self.client.delete_user_access_type(&entry.id).await {
            Ok(status) if (200..300).contains(&status) => {
                info!("✓ Deleted {} ({}) status={}", entry.id, entry.user_name(), status);
                EntryOutcome::Deleted { status }
            }
            Ok(status) => {
                warn!("Delete of {} ({}) returned status {}", entry.id, entry.user_name(), status);
                EntryOutcome::Failed(ReclaimError::RemoteRejected {
                    status,
                    body: String::new(),
                })
            }
            Err(e) => {
                warn!("Delete of {} ({}) failed: {}", entry.id, entry.user_name(), e);
                EntryOutcome::Failed(e)
            }
        }
    }

    /// Compare the fetched length with the server-side count. Returns the
    /// count only when more allocations exist than were listed.
    async fn verify_listing(&self, fetched: usize) -> Option<u64> {
        match self.client.count_user_access_type(None).await {
            Ok(count) if count > fetched as u64 => {
                warn!(
                    "Server reports {} allocations but only {} were listed; the rest are not processed",
                    count, fetched
                );
                Some(count)
            }
            Ok(_) => None,
            Err(e) => {
                debug!("Could not verify allocation count: {}", e);
                None
            }
        }
    }
}
