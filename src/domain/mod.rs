//! Domain module
//!
//! Core domain types and business logic. Nothing in here touches storage,
//! the network, or the clock; "now" is always an argument.

pub mod cycle;
pub mod dates;
pub mod error;
pub mod price;
pub mod subscription;
pub mod upcoming;

pub use cycle::BillingCycle;
pub use dates::{
    advance_one_cycle, days_until, days_until_date, format_date, parse_date, payment_instant,
    rollforward,
};
pub use error::DomainError;
pub use price::Price;
pub use subscription::{NewSubscription, Subscription, SubscriptionChanges, SubscriptionId};
pub use upcoming::{classify_upcoming, should_notify, NOTIFICATION_WINDOW_DAYS};
