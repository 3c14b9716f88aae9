//! Payment reminders
//!
//! The core hands a [`PaymentReminder`] to a [`Notifier`] and never knows
//! which transport delivers it.

mod telegram;

use async_trait::async_trait;

use crate::domain::{BillingCycle, Price, Subscription};

pub use telegram::TelegramNotifier;

/// One reminder about an upcoming charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReminder {
    pub name: String,
    pub price: Price,
    pub currency: String,
    pub days_until: i64,
    pub cycle: BillingCycle,
    /// `DD-MM-YYYY`
    pub payment_date: String,
}

impl PaymentReminder {
    pub fn for_subscription(sub: &Subscription, days_until: i64) -> Self {
        Self {
            name: sub.name.clone(),
            price: sub.price,
            currency: sub.currency.clone(),
            days_until,
            cycle: sub.cycle,
            payment_date: sub.formatted_payment_date(),
        }
    }

    /// Message text sent to the user
    pub fn render(&self) -> String {
        format!(
            "📢 Subscription Alert: {}\n💰 Price: {} {}\n📅 Payment in: {} days\n🔄 Cycle: {}\n📆 Next payment: {}",
            self.name, self.price, self.currency, self.days_until, self.cycle, self.payment_date
        )
    }
}

/// Notification transport capability set
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, reminder: &PaymentReminder) -> Result<(), NotifyError>;

    /// Verify the transport is reachable and authorized
    async fn health_check(&self) -> Result<(), NotifyError>;
}

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Delivery failed; logged by callers, never escalated
    #[error("notification transport failure: {0}")]
    TransportFailure(String),

    /// Request URL stripped, since it embeds the bot token
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err.without_url())
    }
}
