//! SQLite-backed subscription store

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::domain::{
    payment_instant, BillingCycle, NewSubscription, Price, Subscription, SubscriptionId,
};

use super::{StoreError, SubscriptionStore};

const SELECT_COLUMNS: &str =
    "SELECT id, name, price, currency, cycle, next_payment_at, created_at, updated_at FROM subscriptions";

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    name: String,
    price: String,
    currency: String,
    cycle: String,
    next_payment_at: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let name = row.name.clone();
        let corrupt = |reason: String| StoreError::Corrupt {
            id,
            name: name.clone(),
            reason,
        };

        let price = row.price.parse::<Price>().map_err(|e| corrupt(format!("{}", e)))?;
        let cycle = row.cycle.parse::<BillingCycle>().map_err(|e| corrupt(format!("{}", e)))?;
        let next_payment_date = date_from_timestamp(row.next_payment_at)
            .ok_or_else(|| corrupt(format!("bad payment timestamp {}", row.next_payment_at)))?;

        Ok(Subscription {
            id,
            name: row.name,
            price,
            currency: row.currency,
            cycle,
            next_payment_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn date_to_timestamp(date: NaiveDate) -> i64 {
    payment_instant(date).timestamp()
}

fn date_from_timestamp(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|at| at.date_naive())
}

/// Smallest whole second not before `at`
fn ceil_timestamp(at: DateTime<Utc>) -> i64 {
    if at.timestamp_subsec_nanos() > 0 {
        at.timestamp() + 1
    } else {
        at.timestamp()
    }
}

/// Decode rows for bulk reads, skipping records that no longer decode
fn decode_rows(rows: Vec<SubscriptionRow>) -> Vec<Subscription> {
    rows.into_iter()
        .filter_map(|row| match Subscription::try_from(row) {
            Ok(sub) => Some(sub),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable subscription record");
                None
            }
        })
        .collect()
}

/// Subscription store on top of a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteSubscriptionStore {
    pool: SqlitePool,
}

impl SqliteSubscriptionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SubscriptionStore for SqliteSubscriptionStore {
    async fn fetch_all(&self) -> Result<Vec<Subscription>, StoreError> {
        let rows: Vec<SubscriptionRow> =
            sqlx::query_as(&format!("{} ORDER BY id", SELECT_COLUMNS))
                .fetch_all(&self.pool)
                .await?;

        Ok(decode_rows(rows))
    }

    async fn fetch_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE id = ?", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Subscription::try_from).transpose()
    }

    async fn fetch_past_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Result<Subscription, StoreError>>, StoreError> {
        // Payment instants are whole seconds, so `instant < now` is
        // `instant < ceil(now)`.
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE next_payment_at < ? ORDER BY next_payment_at, id",
            SELECT_COLUMNS
        ))
        .bind(ceil_timestamp(now))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Subscription::try_from).collect())
    }

    async fn fetch_due_within(
        &self,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<Vec<Subscription>, StoreError> {
        let end = now + Duration::days(days);

        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE next_payment_at >= ? AND next_payment_at <= ? ORDER BY next_payment_at, id",
            SELECT_COLUMNS
        ))
        .bind(ceil_timestamp(now))
        .bind(end.timestamp())
        .fetch_all(&self.pool)
        .await?;

        Ok(decode_rows(rows))
    }

    async fn create(&self, new: &NewSubscription) -> Result<Subscription, StoreError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions
                (name, price, currency, cycle, next_payment_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(String::from(new.price))
        .bind(&new.currency)
        .bind(new.cycle.as_str())
        .bind(date_to_timestamp(new.next_payment_date))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(subscription_id = id, name = %new.name, "Subscription created");

        Ok(Subscription {
            id,
            name: new.name.clone(),
            price: new.price,
            currency: new.currency.clone(),
            cycle: new.cycle,
            next_payment_date: new.next_payment_date,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, subscription: &Subscription) -> Result<Subscription, StoreError> {
        let now = Utc::now();

        let rows_affected = sqlx::query(
            r#"
            UPDATE subscriptions
            SET name = ?, price = ?, currency = ?, cycle = ?, next_payment_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&subscription.name)
        .bind(String::from(subscription.price))
        .bind(&subscription.currency)
        .bind(subscription.cycle.as_str())
        .bind(date_to_timestamp(subscription.next_payment_date))
        .bind(now)
        .bind(subscription.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound(subscription.id));
        }

        Ok(Subscription {
            updated_at: now,
            ..subscription.clone()
        })
    }

    async fn delete(&self, id: SubscriptionId) -> Result<(), StoreError> {
        let rows_affected = sqlx::query("DELETE FROM subscriptions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::verify_connection(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let secs = date_to_timestamp(date);

        assert_eq!(secs % 86_400, 0);
        assert_eq!(date_from_timestamp(secs), Some(date));
    }

    #[test]
    fn test_ceil_timestamp() {
        let whole = Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap();
        assert_eq!(ceil_timestamp(whole), whole.timestamp());

        let fractional = whole + Duration::milliseconds(250);
        assert_eq!(ceil_timestamp(fractional), whole.timestamp() + 1);
    }
}
