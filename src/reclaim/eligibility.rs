use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ReclaimError, Result},
    qrs::types::UserAccessEntry,
};

/// Days of inactivity after which an allocation is reclaimed
pub const DEFAULT_RETENTION_DAYS: u32 = 8;

/// Largest accepted retention window (about 100 years)
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// What to do with an entry that has no `lastUsed` date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingLastUsedPolicy {
    /// Leave the allocation alone and report it as skipped
    #[default]
    Skip,
    /// Report the entry as a failure
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Last used on or before the cutoff
    Eligible { last_used: NaiveDate },
    /// Used after the cutoff
    Retained { last_used: NaiveDate },
    /// No `lastUsed` and the policy is `Skip`
    NeverUsed,
}

/// `today - retention_days`. Entries last used on this date are still eligible.
pub fn cutoff_date(today: NaiveDate, retention_days: u32) -> Result<NaiveDate> {
    if retention_days > MAX_RETENTION_DAYS {
        return Err(ReclaimError::Config(format!(
            "retention_days must be at most {}, got {}",
            MAX_RETENTION_DAYS, retention_days
        )));
    }

    today
        .checked_sub_days(Days::new(retention_days as u64))
        .ok_or_else(|| {
            ReclaimError::Config(format!(
                "retention window of {} days reaches before the earliest date",
                retention_days
            ))
        })
}

/// Parse a QRS `lastUsed` value into a calendar date.
///
/// Accepts RFC 3339 timestamps (`2024-03-02T10:00:00.000Z`), naive timestamps
/// and bare dates. The date is taken as written, without shifting time zones.
pub fn parse_last_used(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub struct EligibilityChecker {
    cutoff: NaiveDate,
    policy: MissingLastUsedPolicy,
}

impl EligibilityChecker {
    pub fn new(today: NaiveDate, retention_days: u32, policy: MissingLastUsedPolicy) -> Result<Self> {
        Ok(Self {
            cutoff: cutoff_date(today, retention_days)?,
            policy,
        })
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Classify one entry. Malformed dates are always an error; missing
    /// dates follow the configured policy.
    pub fn evaluate(&self, entry: &UserAccessEntry) -> Result<Eligibility> {
        let raw = match entry.last_used.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                return match self.policy {
                    MissingLastUsedPolicy::Skip => {
                        debug!("Entry {} has never been used, skipping", entry.id);
                        Ok(Eligibility::NeverUsed)
                    }
                    MissingLastUsedPolicy::Fail => Err(ReclaimError::MissingLastUsed {
                        id: entry.id.clone(),
                    }),
                };
            }
        };

        let last_used = parse_last_used(raw).ok_or_else(|| ReclaimError::InvalidDate {
            id: entry.id.clone(),
            value: raw.to_string(),
        })?;

        if last_used <= self.cutoff {
            Ok(Eligibility::Eligible { last_used })
        } else {
            Ok(Eligibility::Retained { last_used })
        }
    }

    /// Human-readable reason for the decision on an entry
    pub fn describe(&self, entry: &UserAccessEntry) -> String {
        match self.evaluate(entry) {
            Ok(Eligibility::Eligible { last_used }) => {
                format!("Last used {} (on or before cutoff {})", last_used, self.cutoff)
            }
            Ok(Eligibility::Retained { last_used }) => {
                let days_left = (last_used - self.cutoff).num_days();
                format!("Used {}, eligible in {} days", last_used, days_left)
            }
            Ok(Eligibility::NeverUsed) => "Never used (skipped by policy)".to_string(),
            Err(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(id: &str, last_used: Option<&str>) -> UserAccessEntry {
        UserAccessEntry {
            id: id.to_string(),
            last_used: last_used.map(str::to_string),
            user: None,
        }
    }

    #[test]
    fn test_cutoff_is_eight_days_back() {
        assert_eq!(cutoff_date(date("2024-03-10"), DEFAULT_RETENTION_DAYS).unwrap(), date("2024-03-02"));
        assert_eq!(cutoff_date(date("2024-03-05"), 8).unwrap(), date("2024-02-26"));
    }

    #[test]
    fn test_oversized_retention_is_an_error() {
        assert!(matches!(
            cutoff_date(date("2024-03-10"), 4_000_000_000),
            Err(ReclaimError::Config(_))
        ));
        assert!(matches!(
            EligibilityChecker::new(date("2024-03-10"), u32::MAX, MissingLastUsedPolicy::Skip),
            Err(ReclaimError::Config(_))
        ));
        assert_eq!(
            cutoff_date(date("2024-03-10"), MAX_RETENTION_DAYS).unwrap(),
            date("2024-03-10") - Days::new(MAX_RETENTION_DAYS as u64)
        );
    }

    #[test]
    fn test_window_before_earliest_date_is_an_error() {
        assert!(cutoff_date(NaiveDate::MIN, 1).is_err());
    }

    #[test]
    fn test_inclusive_boundary() {
        let checker = EligibilityChecker::new(date("2024-03-10"), 8, MissingLastUsedPolicy::Skip).unwrap();

        assert_eq!(
            checker.evaluate(&entry("a", Some("2024-03-02T10:00:00Z"))).unwrap(),
            Eligibility::Eligible { last_used: date("2024-03-02") }
        );
        assert_eq!(
            checker.evaluate(&entry("b", Some("2024-03-03T00:00:00Z"))).unwrap(),
            Eligibility::Retained { last_used: date("2024-03-03") }
        );
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(parse_last_used("2024-03-02T10:00:00.000Z"), Some(date("2024-03-02")));
        assert_eq!(parse_last_used("2024-03-02T23:30:00+05:00"), Some(date("2024-03-02")));
        assert_eq!(parse_last_used("2024-03-02T10:00:00.123"), Some(date("2024-03-02")));
        assert_eq!(parse_last_used("2024-03-02"), Some(date("2024-03-02")));
        assert_eq!(parse_last_used("1753-01-01T00:00:00.000Z"), Some(date("1753-01-01")));
        assert_eq!(parse_last_used("yesterday"), None);
        assert_eq!(parse_last_used("2024-13-45T00:00:00Z"), None);
    }

    #[test]
    fn test_parsed_order_matches_string_order() {
        let samples = [
            "1753-01-01T00:00:00.000Z",
            "2023-12-31T23:59:59.999Z",
            "2024-01-01T00:00:00.000Z",
            "2024-02-29T12:00:00.000Z",
            "2024-03-02T10:00:00.000Z",
            "2024-03-10T00:00:00.000Z",
        ];

        for a in &samples {
            for b in &samples {
                let by_date = parse_last_used(a).unwrap().cmp(&parse_last_used(b).unwrap());
                let by_string = a[..10].cmp(&b[..10]);
                assert_eq!(by_date, by_string, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_missing_date_policy() {
        let skip = EligibilityChecker::new(date("2024-03-10"), 8, MissingLastUsedPolicy::Skip).unwrap();
        let fail = EligibilityChecker::new(date("2024-03-10"), 8, MissingLastUsedPolicy::Fail).unwrap();

        assert_eq!(skip.evaluate(&entry("c", None)).unwrap(), Eligibility::NeverUsed);
        assert_eq!(skip.evaluate(&entry("c", Some("  "))).unwrap(), Eligibility::NeverUsed);
        assert!(matches!(
            fail.evaluate(&entry("c", None)),
            Err(ReclaimError::MissingLastUsed { id }) if id == "c"
        ));
    }

    #[test]
    fn test_malformed_date_is_never_eligible() {
        let checker = EligibilityChecker::new(date("2024-03-10"), 8, MissingLastUsedPolicy::Skip).unwrap();
        // "2024-01" would sort before the cutoff as a plain string
        assert!(matches!(
            checker.evaluate(&entry("x", Some("2024-01"))),
            Err(ReclaimError::InvalidDate { value, .. }) if value == "2024-01"
        ));
    }

    #[test]
    fn test_describe() {
        let checker = EligibilityChecker::new(date("2024-03-10"), 8, MissingLastUsedPolicy::Skip).unwrap();
        assert_eq!(
            checker.describe(&entry("b", Some("2024-03-07"))),
            "Used 2024-03-07, eligible in 5 days"
        );
        assert_eq!(checker.describe(&entry("c", None)), "Never used (skipped by policy)");
    }
}
