//! Upcoming payment classification
//!
//! Two stages decide who gets a reminder. The candidate query is broad and
//! inclusive: next payment within `[now, now + window]`. The notify check at
//! send time is narrow: `0 <= days_until < window`. Candidates computed once
//! are re-validated at send time, so a delayed pass never over-notifies.

use chrono::{DateTime, Duration, Utc};

use super::dates::{days_until_date, payment_instant};
use super::Subscription;

/// Look-ahead window for reminders, in days
pub const NOTIFICATION_WINDOW_DAYS: i64 = 5;

/// Inclusive instant bounds of the candidate window
pub fn window_bounds(now: DateTime<Utc>, window_days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::days(window_days))
}

/// Select subscriptions due within the window, earliest first.
pub fn classify_upcoming(
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<Subscription> {
    let (start, end) = window_bounds(now, window_days);
    let mut selected: Vec<Subscription> = subscriptions
        .iter()
        .filter(|sub| {
            let due = payment_instant(sub.next_payment_date);
            due >= start && due <= end
        })
        .cloned()
        .collect();
    selected.sort_by_key(|sub| (sub.next_payment_date, sub.id));
    selected
}

/// Day count to report if a reminder should fire now, `None` otherwise
pub fn should_notify(sub: &Subscription, now: DateTime<Utc>, window_days: i64) -> Option<i64> {
    let days = days_until_date(sub.next_payment_date, now);
    (0..window_days).contains(&days).then_some(days)
}
