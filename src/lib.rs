//! SubTrack Library
//!
//! Subscription payment tracking: date rollforward, upcoming-payment
//! reminders, and the store, notifier, scheduler and web layers around them.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod jobs;
pub mod notify;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use domain::{BillingCycle, DomainError, Price, Subscription, SubscriptionId};
pub use error::{AppError, AppResult};
pub use notify::{Notifier, NotifyError, PaymentReminder, TelegramNotifier};
pub use services::{CheckReport, SubscriptionService};
pub use store::{SqliteSubscriptionStore, StoreError, SubscriptionStore};
