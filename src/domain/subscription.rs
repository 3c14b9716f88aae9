//! Subscription entity and its mutations
//!
//! Raw text input from the CLI or the web API is validated into
//! [`NewSubscription`] / [`SubscriptionChanges`] before anything reaches the
//! store. A failed validation leaves the stored record untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dates::{self, parse_date};
use super::{BillingCycle, DomainError, Price};

/// Store-assigned identifier
pub type SubscriptionId = i64;

/// A tracked recurring payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub name: String,
    pub price: Price,
    pub currency: String,
    pub cycle: BillingCycle,
    #[serde(with = "dates::date_format")]
    pub next_payment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Next payment date in `DD-MM-YYYY`
    pub fn formatted_payment_date(&self) -> String {
        dates::format_date(self.next_payment_date)
    }

    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        dates::is_past_due(self.next_payment_date, now)
    }

    /// Apply validated changes; omitted fields keep their values.
    pub fn apply(mut self, changes: SubscriptionChanges) -> Self {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(currency) = changes.currency {
            self.currency = currency;
        }
        if let Some(cycle) = changes.cycle {
            self.cycle = cycle;
        }
        if let Some(date) = changes.next_payment_date {
            self.next_payment_date = date;
        }
        self
    }
}

/// A validated subscription that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub name: String,
    pub price: Price,
    pub currency: String,
    pub cycle: BillingCycle,
    pub next_payment_date: NaiveDate,
}

impl NewSubscription {
    /// Validate raw text fields. All of them are required.
    pub fn parse(
        name: &str,
        price: &str,
        currency: &str,
        cycle: &str,
        payment_date: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: required("name", name)?,
            price: price.parse()?,
            currency: required("currency", currency)?,
            cycle: cycle.trim().parse()?,
            next_payment_date: parse_date(payment_date.trim())?,
        })
    }
}

/// Partial update; `None` means "keep the current value"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionChanges {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub currency: Option<String>,
    pub cycle: Option<BillingCycle>,
    pub next_payment_date: Option<NaiveDate>,
}

impl SubscriptionChanges {
    /// Validate raw text fields. Empty or absent fields are left unchanged.
    pub fn parse(
        name: Option<&str>,
        price: Option<&str>,
        currency: Option<&str>,
        cycle: Option<&str>,
        payment_date: Option<&str>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: supplied(name).map(str::to_string),
            price: supplied(price).map(str::parse::<Price>).transpose()?,
            currency: supplied(currency).map(str::to_string),
            cycle: supplied(cycle).map(str::parse::<BillingCycle>).transpose()?,
            next_payment_date: supplied(payment_date).map(parse_date).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn required(field: &'static str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(value.to_string())
}

fn supplied(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
