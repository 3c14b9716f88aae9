//! Database module
//!
//! SQLite connection and schema utilities.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const CREATE_SUBSCRIPTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS subscriptions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT    NOT NULL,
    price           TEXT    NOT NULL,
    currency        TEXT    NOT NULL,
    cycle           TEXT    NOT NULL,
    next_payment_at INTEGER NOT NULL,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT    NOT NULL
)
"#;

const CREATE_NEXT_PAYMENT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_subscriptions_next_payment_at
    ON subscriptions (next_payment_at)
"#;

/// Open (creating if missing) the database file and ensure the schema exists
pub async fn connect(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    tracing::info!(db_path = %db_path, "Database ready");

    Ok(pool)
}

/// Private in-memory database, used by tests.
///
/// A single connection that never expires: every new connection to
/// `sqlite::memory:` would see an empty database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// Create tables and indexes if they do not exist
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_SUBSCRIPTIONS).execute(pool).await?;
    sqlx::query(CREATE_NEXT_PAYMENT_INDEX).execute(pool).await?;
    Ok(())
}

/// Simple connectivity check
pub async fn verify_connection(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if the subscriptions table exists
pub async fn check_schema(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let found: i64 = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind("subscriptions")
    .fetch_one(pool)
    .await?;

    let exists = found == 1;
    if !exists {
        tracing::error!("Required table 'subscriptions' does not exist");
    }
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_schema_is_created() {
        let pool = connect_in_memory().await.unwrap();

        verify_connection(&pool).await.unwrap();
        assert!(check_schema(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_init_schema_is_repeatable() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        assert!(check_schema(&pool).await.unwrap());
    }
}
