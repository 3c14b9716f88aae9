//! Subscription service
//!
//! The single entry point shared by the CLI, the web API and the scheduler.
//! Validation always runs before the store is touched.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    rollforward, should_notify, DomainError, NewSubscription, Subscription, SubscriptionChanges,
    SubscriptionId, NOTIFICATION_WINDOW_DAYS,
};
use crate::notify::{Notifier, NotifyError, PaymentReminder};
use crate::store::{StoreError, SubscriptionStore};

use super::report::{
    CheckReport, NotificationOutcome, NotificationReport, NotificationStatus, SweepOutcome,
    SweepReport, SweepStatus,
};

/// Raw text fields for a new subscription, as typed by the user
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SubscriptionInput {
    pub name: String,
    pub price: String,
    pub currency: String,
    pub cycle: String,
    pub payment_date: String,
}

/// Raw text fields for a partial update; absent or empty means unchanged
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SubscriptionPatch {
    pub name: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub cycle: Option<String>,
    pub payment_date: Option<String>,
}

/// Service errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::Domain(DomainError::NotFound(id)),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Subscription operations over injected store and notifier
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn add(&self, input: &SubscriptionInput) -> ServiceResult<Subscription> {
        let new = NewSubscription::parse(
            &input.name,
            &input.price,
            &input.currency,
            &input.cycle,
            &input.payment_date,
        )?;

        let created = self.store.create(&new).await?;
        tracing::info!(
            subscription_id = created.id,
            name = %created.name,
            next_payment = %created.formatted_payment_date(),
            "Subscription added"
        );
        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// Every supplied field is validated before the record is read, so a bad
    /// field never produces a partial write.
    pub async fn update(
        &self,
        id: SubscriptionId,
        patch: &SubscriptionPatch,
    ) -> ServiceResult<Subscription> {
        let changes = SubscriptionChanges::parse(
            patch.name.as_deref(),
            patch.price.as_deref(),
            patch.currency.as_deref(),
            patch.cycle.as_deref(),
            patch.payment_date.as_deref(),
        )?;

        let current = self.get_subscription(id).await?;
        if changes.is_empty() {
            return Ok(current);
        }

        let updated = self.store.update(&current.apply(changes)).await?;
        tracing::info!(subscription_id = id, "Subscription updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: SubscriptionId) -> ServiceResult<()> {
        self.store.delete(id).await?;
        tracing::info!(subscription_id = id, "Subscription deleted");
        Ok(())
    }

    pub async fn get_subscription(&self, id: SubscriptionId) -> ServiceResult<Subscription> {
        self.store
            .fetch_by_id(id)
            .await?
            .ok_or(ServiceError::Domain(DomainError::NotFound(id)))
    }

    pub async fn list(&self) -> ServiceResult<Vec<Subscription>> {
        Ok(self.store.fetch_all().await?)
    }

    /// Roll every past-due subscription forward to its next future date.
    ///
    /// One failing record is reported and logged; the rest still update.
    pub async fn update_past_due(&self, now: DateTime<Utc>) -> ServiceResult<SweepReport> {
        let past_due = self.store.fetch_past_due(now).await?;
        let mut report = SweepReport::default();

        for row in past_due {
            let sub = match row {
                Ok(sub) => sub,
                Err(StoreError::Corrupt { id, name, reason }) => {
                    tracing::error!(
                        subscription_id = id,
                        name = %name,
                        error = %reason,
                        "Unreadable past-due subscription"
                    );
                    report.outcomes.push(SweepOutcome {
                        subscription_id: id,
                        name,
                        previous_date: None,
                        status: SweepStatus::Failed { error: reason },
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = match self.roll_one(&sub, now).await {
                Ok(next) => {
                    tracing::info!(
                        subscription_id = sub.id,
                        name = %sub.name,
                        next_payment = %crate::domain::format_date(next),
                        "Rolled past-due subscription forward"
                    );
                    SweepStatus::Updated {
                        next_payment_date: next,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        subscription_id = sub.id,
                        name = %sub.name,
                        error = %e,
                        "Failed to roll subscription forward"
                    );
                    SweepStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            report.outcomes.push(SweepOutcome {
                subscription_id: sub.id,
                name: sub.name,
                previous_date: Some(sub.next_payment_date),
                status,
            });
        }

        Ok(report)
    }

    async fn roll_one(
        &self,
        sub: &Subscription,
        now: DateTime<Utc>,
    ) -> ServiceResult<chrono::NaiveDate> {
        let next = rollforward(sub.next_payment_date, sub.cycle, now)?;
        let rolled = Subscription {
            next_payment_date: next,
            ..sub.clone()
        };
        self.store.update(&rolled).await?;
        Ok(next)
    }

    /// Candidates for a reminder, earliest first
    pub async fn upcoming(&self, now: DateTime<Utc>) -> ServiceResult<Vec<Subscription>> {
        Ok(self
            .store
            .fetch_due_within(now, NOTIFICATION_WINDOW_DAYS)
            .await?)
    }

    /// Send a reminder for each candidate that still passes the notify check.
    ///
    /// Transport failures are recorded and logged, never returned.
    pub async fn send_notifications(
        &self,
        candidates: &[Subscription],
        now: DateTime<Utc>,
    ) -> NotificationReport {
        let mut report = NotificationReport::default();

        for sub in candidates {
            let (days_until, status) = match should_notify(sub, now, NOTIFICATION_WINDOW_DAYS) {
                None => {
                    let days = crate::domain::days_until_date(sub.next_payment_date, now);
                    tracing::debug!(subscription_id = sub.id, days, "Outside notify range, skipped");
                    (days, NotificationStatus::Skipped)
                }
                Some(days) => {
                    let reminder = PaymentReminder::for_subscription(sub, days);
                    match self.notifier.send(&reminder).await {
                        Ok(()) => {
                            tracing::info!(subscription_id = sub.id, name = %sub.name, days, "Reminder sent");
                            (days, NotificationStatus::Sent)
                        }
                        Err(e) => {
                            tracing::error!(
                                subscription_id = sub.id,
                                name = %sub.name,
                                days,
                                error = %e,
                                "Failed to send reminder"
                            );
                            (days, NotificationStatus::Failed {
                                error: e.to_string(),
                            })
                        }
                    }
                }
            };

            report.outcomes.push(NotificationOutcome {
                subscription_id: sub.id,
                name: sub.name.clone(),
                days_until,
                status,
            });
        }

        report
    }

    /// One full pass: sweep past-due records, then notify upcoming ones
    pub async fn run_check(&self, now: DateTime<Utc>) -> ServiceResult<CheckReport> {
        let sweep = self.update_past_due(now).await?;
        let candidates = self.upcoming(now).await?;
        let notifications = self.send_notifications(&candidates, now).await;

        tracing::info!(
            rolled_forward = sweep.updated_count(),
            sweep_failures = sweep.failed_count(),
            candidates = candidates.len(),
            sent = notifications.sent_count(),
            send_failures = notifications.failed_count(),
            "Check pass complete"
        );

        Ok(CheckReport {
            sweep,
            candidates,
            notifications,
            completed_at: Utc::now(),
        })
    }

    pub async fn notifier_health(&self) -> Result<(), NotifyError> {
        self.notifier.health_check().await
    }

    pub async fn store_health(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_becomes_domain_not_found() {
        let err = ServiceError::from(StoreError::NotFound(7));
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(7))));
    }

    #[test]
    fn test_corrupt_row_stays_a_store_error() {
        let err = ServiceError::from(StoreError::Corrupt {
            id: 7,
            name: "Gym".to_string(),
            reason: "bad cycle".to_string(),
        });
        assert!(matches!(err, ServiceError::Store(StoreError::Corrupt { id: 7, .. })));
    }
}
