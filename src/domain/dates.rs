//! Payment date arithmetic
//!
//! Conversions between calendar dates and the `DD-MM-YYYY` text format,
//! day counting relative to "now", and cycle advancement.
//!
//! A payment date has no time of day. Whenever it is compared with an
//! instant it is treated as 00:00:00 UTC of that day. "Now" is always passed
//! in by the caller so every function here is deterministic.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};

use super::{BillingCycle, DomainError};

/// chrono format string for `DD-MM-YYYY`
pub const DATE_FORMAT: &str = "%d-%m-%Y";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Parse a `DD-MM-YYYY` date.
///
/// Only the exact shape is accepted: two-digit day, two-digit month,
/// four-digit year, dash separated.
pub fn parse_date(text: &str) -> Result<NaiveDate, DomainError> {
    let invalid = || DomainError::InvalidFormat(text.to_string());

    let bytes = text.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[2] == b'-'
        && bytes[5] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Midnight UTC of `date`
pub fn payment_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Whole days from `now` until `instant`, rounded to the nearest day.
///
/// Any instant before `now` yields `-1`, no matter how far back. Callers
/// rely on that sentinel to mean "overdue".
pub fn days_until(instant: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta = instant - now;
    if delta < chrono::Duration::zero() {
        return -1;
    }
    let seconds = delta.num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_DAY).round() as i64
}

/// [`days_until`] for a payment date
pub fn days_until_date(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    days_until(payment_instant(date), now)
}

/// Add one billing cycle to `date`.
///
/// Month-end dates clamp to the last day of the target month:
/// 31-01-2025 monthly gives 28-02-2025, 29-02-2024 yearly gives 28-02-2025.
pub fn advance_one_cycle(date: NaiveDate, cycle: BillingCycle) -> Result<NaiveDate, DomainError> {
    date.checked_add_months(Months::new(cycle.months()))
        .ok_or_else(|| DomainError::DateOutOfRange(format!("{} + one {} cycle", date, cycle)))
}

/// Advance `date` cycle by cycle until it is no longer before `now`.
///
/// Returns `date` unchanged when it is already current.
pub fn rollforward(
    date: NaiveDate,
    cycle: BillingCycle,
    now: DateTime<Utc>,
) -> Result<NaiveDate, DomainError> {
    let mut next = date;
    while payment_instant(next) < now {
        next = advance_one_cycle(next, cycle)?;
    }
    Ok(next)
}

/// Whether the payment date is strictly before `now`
pub fn is_past_due(date: NaiveDate, now: DateTime<Utc>) -> bool {
    payment_instant(date) < now
}

/// Serde adapter for `DD-MM-YYYY` dates, for `#[serde(with = "...")]`
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_date(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 14, 30, 0).unwrap()
    }

    // =========================================================================
    // parse_date / format_date
    // =========================================================================

    #[test]
    fn test_parse_valid_dates() {
        assert_eq!(parse_date("15-02-2025").unwrap(), ymd(2025, 2, 15));
        assert_eq!(parse_date("31-12-2025").unwrap(), ymd(2025, 12, 31));
        assert_eq!(parse_date("29-02-2024").unwrap(), ymd(2024, 2, 29));
    }

    #[test]
    fn test_parse_rejects_wrong_field_order() {
        assert_eq!(
            parse_date("2025-02-15"),
            Err(DomainError::InvalidFormat("2025-02-15".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_impossible_dates() {
        assert!(parse_date("31-02-2025").is_err());
        assert!(parse_date("29-02-2025").is_err());
        assert!(parse_date("00-01-2025").is_err());
        assert!(parse_date("15-13-2025").is_err());
    }

    #[test]
    fn test_parse_rejects_loose_shapes() {
        for input in ["", "5-2-2025", "05/02/2025", "05-02-25", "+5-02-2025", "05-02-2025 "] {
            assert!(parse_date(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_format_zero_pads() {
        assert_eq!(format_date(ymd(2025, 1, 5)), "05-01-2025");
        assert_eq!(format_date(ymd(2025, 2, 15)), "15-02-2025");
    }

    #[test]
    fn test_parse_format_round_trip() {
        let mut date = ymd(2024, 1, 1);
        while date < ymd(2025, 1, 1) {
            let text = format_date(date);
            assert_eq!(format_date(parse_date(&text).unwrap()), text);
            date = date.succ_opt().unwrap();
        }
    }

    // =========================================================================
    // days_until
    // =========================================================================

    #[test]
    fn test_days_until_future() {
        let now = fixed_now();
        assert_eq!(days_until(now + Duration::hours(2), now), 0);
        assert_eq!(days_until(now + Duration::hours(24), now), 1);
        assert_eq!(days_until(now + Duration::hours(5 * 24), now), 5);
        assert_eq!(days_until(now + Duration::hours(36), now), 2);
        assert_eq!(days_until(now + Duration::hours(35), now), 1);
    }

    #[test]
    fn test_days_until_now_is_zero() {
        let now = fixed_now();
        assert_eq!(days_until(now, now), 0);
    }

    #[test]
    fn test_days_until_past_collapses_to_sentinel() {
        let now = fixed_now();
        assert_eq!(days_until(now - Duration::hours(1), now), -1);
        assert_eq!(days_until(now - Duration::days(1), now), -1);
        assert_eq!(days_until(now - Duration::days(400), now), -1);
    }

    #[test]
    fn test_days_until_date_uses_midnight() {
        let now = fixed_now();
        // Today's midnight has already passed at 14:30.
        assert_eq!(days_until_date(ymd(2025, 6, 10), now), -1);
        // 9h30m ahead rounds to zero days.
        assert_eq!(days_until_date(ymd(2025, 6, 11), now), 0);
        // 4 days 9h30m ahead.
        assert_eq!(days_until_date(ymd(2025, 6, 15), now), 4);
    }

    // =========================================================================
    // advance_one_cycle
    // =========================================================================

    #[test]
    fn test_advance_monthly_and_yearly() {
        let base = ymd(2025, 2, 15);
        assert_eq!(advance_one_cycle(base, BillingCycle::Monthly).unwrap(), ymd(2025, 3, 15));
        assert_eq!(advance_one_cycle(base, BillingCycle::Yearly).unwrap(), ymd(2026, 2, 15));
    }

    #[test]
    fn test_advance_crosses_year_boundary() {
        assert_eq!(
            advance_one_cycle(ymd(2025, 12, 20), BillingCycle::Monthly).unwrap(),
            ymd(2026, 1, 20)
        );
    }

    #[test]
    fn test_month_end_clamps() {
        assert_eq!(
            advance_one_cycle(ymd(2025, 1, 31), BillingCycle::Monthly).unwrap(),
            ymd(2025, 2, 28)
        );
        assert_eq!(
            advance_one_cycle(ymd(2024, 1, 31), BillingCycle::Monthly).unwrap(),
            ymd(2024, 2, 29)
        );
        assert_eq!(
            advance_one_cycle(ymd(2025, 3, 31), BillingCycle::Monthly).unwrap(),
            ymd(2025, 4, 30)
        );
        assert_eq!(
            advance_one_cycle(ymd(2024, 2, 29), BillingCycle::Yearly).unwrap(),
            ymd(2025, 2, 28)
        );
    }

    #[test]
    fn test_advance_out_of_range() {
        let result = advance_one_cycle(NaiveDate::MAX, BillingCycle::Monthly);
        assert!(matches!(result, Err(DomainError::DateOutOfRange(_))));
    }

    // =========================================================================
    // rollforward
    // =========================================================================

    #[test]
    fn test_rollforward_future_date_unchanged() {
        let now = fixed_now();
        let future = ymd(2025, 7, 10);
        assert_eq!(rollforward(future, BillingCycle::Monthly, now).unwrap(), future);
        assert_eq!(rollforward(future, BillingCycle::Yearly, now).unwrap(), future);
    }

    #[test]
    fn test_rollforward_is_idempotent() {
        let now = fixed_now();
        let once = rollforward(ymd(2023, 3, 3), BillingCycle::Monthly, now).unwrap();
        let twice = rollforward(once, BillingCycle::Monthly, now).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rollforward_fifteen_days_monthly_adds_one_cycle() {
        let now = fixed_now();
        let start = (now - Duration::days(15)).date_naive();
        let rolled = rollforward(start, BillingCycle::Monthly, now).unwrap();

        assert!(payment_instant(rolled) > now);
        assert_eq!(rolled, advance_one_cycle(start, BillingCycle::Monthly).unwrap());
    }

    #[test]
    fn test_rollforward_four_hundred_days_yearly() {
        let now = fixed_now();
        let start = (now - Duration::days(400)).date_naive();
        let rolled = rollforward(start, BillingCycle::Yearly, now).unwrap();

        assert!(payment_instant(rolled) >= now);
        assert_eq!(rolled, ymd(2026, 5, 6));
    }

    #[test]
    fn test_rollforward_many_missed_cycles() {
        let now = fixed_now();
        let rolled = rollforward(ymd(2020, 1, 15), BillingCycle::Monthly, now).unwrap();
        assert_eq!(rolled, ymd(2025, 6, 15));
    }

    #[test]
    fn test_rollforward_today_moves_to_next_cycle() {
        let now = fixed_now();
        let rolled = rollforward(ymd(2025, 6, 10), BillingCycle::Monthly, now).unwrap();
        assert_eq!(rolled, ymd(2025, 7, 10));
    }

    #[test]
    fn test_is_past_due() {
        let now = fixed_now();
        assert!(is_past_due(ymd(2025, 6, 10), now));
        assert!(!is_past_due(ymd(2025, 6, 11), now));
    }
}
