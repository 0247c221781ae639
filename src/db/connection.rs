use once_cell::sync::OnceCell;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, warn};

use crate::db::errors::{DatabaseError, Result};

static DB_POOL: OnceCell<PgPool> = OnceCell::new();

/// Initialize the database connection pool
/// This should be called once at application startup
pub async fn init_pool() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        DatabaseError::ConnectionError("DATABASE_URL environment variable not set".to_string())
    })?;

    info!("Initializing database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(10))
        .max_lifetime(Duration::from_secs(300))
        .test_before_acquire(true)
        .connect_lazy(&database_url)
        .map_err(|e| DatabaseError::ConnectionError(format!("Failed to create pool: {}", e)))?;

    // Test the connection
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("Failed to test connection: {}", e)))?;

    DB_POOL
        .set(pool.clone())
        .map_err(|_| DatabaseError::ConnectionError("Pool already initialized".to_string()))?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Get a reference to the database pool
pub fn get_pool() -> Result<&'static PgPool> {
    DB_POOL.get().ok_or_else(|| {
        DatabaseError::ConnectionError(
            "Database pool not initialized. Call init_pool() first".to_string(),
        )
    })
}

/// Close the database pool (useful for cleanup)
pub async fn close_pool() -> Result<()> {
    if let Some(pool) = DB_POOL.get() {
        pool.close().await;
        info!("Database pool closed");
    }
    Ok(())
}

/// Execute a function with retry logic for handling transient errors
pub async fn with_retry<F, Fut, T>(max_retries: u8, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                warn!(
                    attempt = attempt,
                    max_retries = max_retries,
                    error = %e,
                    "Retryable error occurred, retrying..."
                );

                // Exponential backoff with jitter, capped at 1 second
                let delay_ms =
                    (50 * 2_u64.pow(attempt as u32 - 1)).min(1000) + (rand::random::<u64>() % 50);

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(e) if attempt >= max_retries && e.is_retryable() => {
                return Err(DatabaseError::RetryLimitExceeded {
                    attempts: max_retries,
                });
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_logic() {
        let mut call_count = 0;

        let result = with_retry(3, || {
            call_count += 1;
            async move {
                if call_count < 3 {
                    Err(DatabaseError::ConnectionError("test error".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_limit_exceeded() {
        let result: Result<i32> = with_retry(2, || async {
            Err(DatabaseError::ConnectionError("test error".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            DatabaseError::RetryLimitExceeded { .. }
        ));
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_immediately() {
        let mut call_count = 0;

        let result: Result<i32> = with_retry(5, || {
            call_count += 1;
            async move { Err(DatabaseError::InvalidData("bad input".to_string())) }
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            DatabaseError::InvalidData(_)
        ));
        assert_eq!(call_count, 1);
    }
}
