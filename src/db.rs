use std::time::Duration;

use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

/// Acquire is bounded so a dead database surfaces as a retry-able error
/// instead of a hung request.
pub async fn init_db(database_url: &str, acquire_timeout_secs: u64) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .connect(database_url)
        .await
}
