//! Common test utilities
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use subtrack::domain::{
    classify_upcoming, BillingCycle, NewSubscription, Price, Subscription, SubscriptionId,
};
use subtrack::notify::{Notifier, NotifyError, PaymentReminder};
use subtrack::store::{SqliteSubscriptionStore, StoreError, SubscriptionStore};
use subtrack::SubscriptionService;

/// Fixed evaluation instant used across the suites
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
}

pub fn date(d: u32, m: u32, y: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn new_sub(name: &str, cycle: BillingCycle, next_payment_date: NaiveDate) -> NewSubscription {
    NewSubscription {
        name: name.to_string(),
        price: "9.99".parse::<Price>().unwrap(),
        currency: "USD".to_string(),
        cycle,
        next_payment_date,
    }
}

// =========================================================================
// In-memory store
// =========================================================================

#[derive(Default)]
struct MemoryState {
    subs: Vec<Subscription>,
    next_id: SubscriptionId,
    failing_updates: HashSet<SubscriptionId>,
    update_calls: usize,
}

/// Vec-backed store with the same query semantics as the SQLite one
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every update of `id` fail with a database error
    pub fn fail_updates_for(&self, id: SubscriptionId) {
        self.state.lock().unwrap().failing_updates.insert(id);
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }

    pub fn snapshot(&self) -> Vec<Subscription> {
        self.state.lock().unwrap().subs.clone()
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<Subscription>, StoreError> {
        Ok(self.snapshot())
    }

    async fn fetch_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        Ok(self.snapshot().into_iter().find(|s| s.id == id))
    }

    async fn fetch_past_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Result<Subscription, StoreError>>, StoreError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|s| s.is_past_due(now))
            .map(Ok)
            .collect())
    }

    async fn fetch_due_within(
        &self,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<Vec<Subscription>, StoreError> {
        Ok(classify_upcoming(&self.snapshot(), now, days))
    }

    async fn create(&self, new: &NewSubscription) -> Result<Subscription, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let at = Utc::now();
        let sub = Subscription {
            id: state.next_id,
            name: new.name.clone(),
            price: new.price,
            currency: new.currency.clone(),
            cycle: new.cycle,
            next_payment_date: new.next_payment_date,
            created_at: at,
            updated_at: at,
        };
        state.subs.push(sub.clone());
        Ok(sub)
    }

    async fn update(&self, subscription: &Subscription) -> Result<Subscription, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.update_calls += 1;
        if state.failing_updates.contains(&subscription.id) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let slot = state
            .subs
            .iter_mut()
            .find(|s| s.id == subscription.id)
            .ok_or(StoreError::NotFound(subscription.id))?;
        *slot = Subscription {
            updated_at: Utc::now(),
            ..subscription.clone()
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: SubscriptionId) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let before = state.subs.len();
        state.subs.retain(|s| s.id != id);
        if state.subs.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

// =========================================================================
// Recording notifier
// =========================================================================

/// Records every reminder; names in `failing` fail to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<PaymentReminder>>,
    failing: Mutex<HashSet<String>>,
    healthy: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            healthy: Mutex::new(true),
            ..Self::default()
        }
    }

    pub fn fail_for(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock().unwrap() = healthy;
    }

    pub fn sent(&self) -> Vec<PaymentReminder> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_names(&self) -> Vec<String> {
        self.sent().into_iter().map(|r| r.name).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, reminder: &PaymentReminder) -> Result<(), NotifyError> {
        if self.failing.lock().unwrap().contains(&reminder.name) {
            return Err(NotifyError::TransportFailure(format!(
                "refused {}",
                reminder.name
            )));
        }
        self.sent.lock().unwrap().push(reminder.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), NotifyError> {
        if *self.healthy.lock().unwrap() {
            Ok(())
        } else {
            Err(NotifyError::TransportFailure("bot unreachable".to_string()))
        }
    }
}

// =========================================================================
// Wiring helpers
// =========================================================================

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: Arc<SubscriptionService>,
}

/// Service over the in-memory doubles
pub fn memory_harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = Arc::new(SubscriptionService::new(store.clone(), notifier.clone()));
    Harness {
        store,
        notifier,
        service,
    }
}

/// Fresh SQLite store on a private in-memory database
pub async fn sqlite_store() -> SqliteSubscriptionStore {
    let pool = subtrack::db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");
    SqliteSubscriptionStore::new(pool)
}
