//! Subscription persistence
//!
//! The core reads snapshots from and writes records to a
//! [`SubscriptionStore`]. The production implementation is SQLite; tests
//! substitute an in-memory double.

mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewSubscription, Subscription, SubscriptionId};

pub use sqlite::SqliteSubscriptionStore;

/// Storage capability set used by the subscription service.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Every subscription, ordered by id
    async fn fetch_all(&self) -> Result<Vec<Subscription>, StoreError>;

    async fn fetch_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, StoreError>;

    /// Subscriptions whose next payment instant is strictly before `now`.
    ///
    /// Every matching row is returned. A row that no longer decodes comes
    /// back as [`StoreError::Corrupt`] in its own slot.
    async fn fetch_past_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Result<Subscription, StoreError>>, StoreError>;

    /// Subscriptions due in `[now, now + days]`, inclusive on both ends,
    /// earliest first
    async fn fetch_due_within(
        &self,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<Vec<Subscription>, StoreError>;

    /// Insert a new record; the store assigns id and timestamps
    async fn create(&self, new: &NewSubscription) -> Result<Subscription, StoreError>;

    /// Overwrite the record with the same id.
    ///
    /// Fails with [`StoreError::NotFound`] if the id does not exist.
    async fn update(&self, subscription: &Subscription) -> Result<Subscription, StoreError>;

    /// Fails with [`StoreError::NotFound`] if the id does not exist.
    async fn delete(&self, id: SubscriptionId) -> Result<(), StoreError>;

    /// Connectivity check for health endpoints
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Errors that can occur in the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("subscription not found: {0}")]
    NotFound(SubscriptionId),

    /// Stored row no longer decodes into a valid subscription
    #[error("corrupt subscription record {id}: {reason}")]
    Corrupt {
        id: SubscriptionId,
        name: String,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
