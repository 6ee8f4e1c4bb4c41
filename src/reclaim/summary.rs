use chrono::NaiveDate;
use colored::Colorize;

use crate::error::ReclaimError;

/// What happened to one fetched entry
#[derive(Debug)]
pub enum EntryOutcome {
    Deleted { status: u16 },
    /// Dry run: would have been deleted
    WouldDelete,
    Retained,
    Skipped,
    Failed(ReclaimError),
}

impl EntryOutcome {
    pub fn label(&self) -> String {
        match self {
            EntryOutcome::Deleted { status } => format!("deleted ({})", status),
            EntryOutcome::WouldDelete => "would delete".to_string(),
            EntryOutcome::Retained => "retained".to_string(),
            EntryOutcome::Skipped => "skipped".to_string(),
            EntryOutcome::Failed(e) => format!("failed: {}", e),
        }
    }
}

#[derive(Debug)]
pub struct EntryReport {
    pub id: String,
    pub user_name: String,
    pub last_used: Option<String>,
    pub outcome: EntryOutcome,
}

/// Result of one reclaim pass
#[derive(Debug)]
pub struct ReclaimSummary {
    pub today: NaiveDate,
    pub cutoff: NaiveDate,
    pub total_entries: usize,
    /// Server-side count, when it disagrees with what was fetched
    pub server_count: Option<u64>,
    pub deleted: usize,
    pub would_delete: usize,
    pub retained: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub dry_run: bool,
    pub reports: Vec<EntryReport>,
}

impl ReclaimSummary {
    pub fn new(today: NaiveDate, cutoff: NaiveDate, total_entries: usize, dry_run: bool) -> Self {
        Self {
            today,
            cutoff,
            total_entries,
            server_count: None,
            deleted: 0,
            would_delete: 0,
            retained: 0,
            skipped: 0,
            failed: 0,
            cancelled: false,
            dry_run,
            reports: Vec::new(),
        }
    }

    pub fn record(&mut self, report: EntryReport) {
        match &report.outcome {
            EntryOutcome::Deleted { .. } => self.deleted += 1,
            EntryOutcome::WouldDelete => self.would_delete += 1,
            EntryOutcome::Retained => self.retained += 1,
            EntryOutcome::Skipped => self.skipped += 1,
            EntryOutcome::Failed(_) => self.failed += 1,
        }
        self.reports.push(report);
    }

    /// Entries actually evaluated (less than `total_entries` after cancellation)
    pub fn processed(&self) -> usize {
        self.reports.len()
    }

    /// The error a run ends with: cancellation first, then failed entries
    pub fn failure(&self) -> Option<ReclaimError> {
        if self.cancelled {
            Some(ReclaimError::Cancelled)
        } else if self.failed > 0 {
            Some(ReclaimError::Other(anyhow::anyhow!(
                "{} of {} entries failed",
                self.failed,
                self.processed()
            )))
        } else {
            None
        }
    }

    /// Share of attempted deletions that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.deleted + self.failed;
        if attempted == 0 {
            0.0
        } else {
            (self.deleted as f64 / attempted as f64) * 100.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=== License Reclaim Summary ===".cyan().bold());
        println!("Window:          {} .. {}", self.cutoff, self.today);
        println!("Fetched:         {}", self.total_entries);
        if let Some(count) = self.server_count {
            println!(
                "Server count:    {} {}",
                count,
                "(listing incomplete)".yellow()
            );
        }
        println!("Processed:       {}", self.processed());
        if self.dry_run {
            println!("Would delete:    {}", self.would_delete.to_string().yellow());
        } else {
            println!("Deleted:         {} ✓", self.deleted.to_string().green());
        }
        println!("Retained:        {}", self.retained);
        println!("Skipped:         {}", self.skipped);
        println!("Failed:          {} ✗", self.failed.to_string().red());
        if !self.dry_run && self.deleted + self.failed > 0 {
            println!("Success rate:    {:.1}%", self.success_rate());
        }
        if self.cancelled {
            println!("{}", "Run was cancelled before all entries were processed".red());
        }
        println!("{}", "===============================".cyan());
    }
}
