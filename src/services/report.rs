//! Batch pass reports
//!
//! Sweeps and notification fan-out never stop at the first failure. Each
//! processed subscription gets its own outcome entry instead.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{dates::date_format, format_date, Subscription, SubscriptionId};

/// Outcome of rolling one past-due subscription forward
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub subscription_id: SubscriptionId,
    pub name: String,
    /// `None` when the stored record could not be read
    #[serde(serialize_with = "serialize_optional_date")]
    pub previous_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub status: SweepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepStatus {
    Updated {
        #[serde(with = "date_format")]
        next_payment_date: NaiveDate,
    },
    Failed {
        error: String,
    },
}

/// Result of a past-due sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub outcomes: Vec<SweepOutcome>,
}

impl SweepReport {
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SweepStatus::Updated { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.updated_count()
    }
}

/// Outcome of one reminder
#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub subscription_id: SubscriptionId,
    pub name: String,
    pub days_until: i64,
    #[serde(flatten)]
    pub status: NotificationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    /// Candidate no longer passes the narrow notify check
    Skipped,
    Failed { error: String },
}

/// Result of a notification fan-out
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationReport {
    pub outcomes: Vec<NotificationOutcome>,
}

impl NotificationReport {
    fn count(&self, wanted: fn(&NotificationStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| wanted(&o.status)).count()
    }

    pub fn sent_count(&self) -> usize {
        self.count(|s| matches!(s, NotificationStatus::Sent))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|s| matches!(s, NotificationStatus::Skipped))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, NotificationStatus::Failed { .. }))
    }
}

/// Everything one check pass did
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub sweep: SweepReport,
    pub candidates: Vec<Subscription>,
    pub notifications: NotificationReport,
    pub completed_at: DateTime<Utc>,
}

fn serialize_optional_date<S: serde::Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_str(&format_date(*date)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: SweepStatus) -> SweepOutcome {
        SweepOutcome {
            subscription_id: 1,
            name: "Spotify".to_string(),
            previous_date: NaiveDate::from_ymd_opt(2025, 1, 31),
            status,
        }
    }

    #[test]
    fn test_sweep_report_counts() {
        let report = SweepReport {
            outcomes: vec![
                outcome(SweepStatus::Updated {
                    next_payment_date: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
                }),
                outcome(SweepStatus::Failed {
                    error: "boom".to_string(),
                }),
            ],
        };

        assert_eq!(report.updated_count(), 1);
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn test_sweep_outcome_serializes_flat() {
        let json = serde_json::to_value(outcome(SweepStatus::Updated {
            next_payment_date: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
        }))
        .unwrap();

        assert_eq!(json["status"], "updated");
        assert_eq!(json["previous_date"], "31-01-2025");
        assert_eq!(json["next_payment_date"], "28-02-2025");
    }

    #[test]
    fn test_unreadable_record_has_null_previous_date() {
        let mut failed = outcome(SweepStatus::Failed {
            error: "bad cycle".to_string(),
        });
        failed.previous_date = None;

        let json = serde_json::to_value(failed).unwrap();

        assert_eq!(json["status"], "failed");
        assert!(json["previous_date"].is_null());
    }

    #[test]
    fn test_check_report_candidates_use_dd_mm_yyyy() {
        use crate::domain::{BillingCycle, Price};

        let at = Utc::now();
        let report = CheckReport {
            sweep: SweepReport::default(),
            candidates: vec![Subscription {
                id: 4,
                name: "Netflix".to_string(),
                price: "15.99".parse::<Price>().unwrap(),
                currency: "USD".to_string(),
                cycle: BillingCycle::Monthly,
                next_payment_date: NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
                created_at: at,
                updated_at: at,
            }],
            notifications: NotificationReport::default(),
            completed_at: at,
        };

        let json = serde_json::to_value(report).unwrap();

        assert_eq!(json["candidates"][0]["next_payment_date"], "12-06-2025");
    }

    #[test]
    fn test_notification_report_default() {
        let report = NotificationReport::default();
        assert_eq!(report.sent_count(), 0);
        assert_eq!(report.skipped_count(), 0);
        assert_eq!(report.failed_count(), 0);
    }
}
