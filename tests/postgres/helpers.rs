//! Shared helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use std::sync::{Mutex, PoisonError};
use taskmate::config::DatabaseSettings;
use taskmate::task::adapters::postgres::{SCHEMA_SQL, TaskPgPool};
use uuid::Uuid;

/// Environment variable naming the scratch database.
pub const DATABASE_URL_ENV: &str = "TASKMATE_TEST_DATABASE_URL";

static SCHEMA_APPLIED: Mutex<bool> = Mutex::new(false);

/// Connects to the scratch database and applies the schema once per process.
///
/// Returns `None` when no database is configured.
///
/// # Errors
///
/// Returns an error when the pool cannot be built or the schema fails to
/// apply.
pub fn test_pool() -> eyre::Result<Option<TaskPgPool>> {
    let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
        return Ok(None);
    };
    let pool = DatabaseSettings { url, pool_size: 8 }.connect()?;

    let mut applied = SCHEMA_APPLIED.lock().unwrap_or_else(PoisonError::into_inner);
    if !*applied {
        pool.get()?.batch_execute(SCHEMA_SQL)?;
        *applied = true;
    }
    Ok(Some(pool))
}

/// Returns a positive identifier no other test run is likely to use.
pub fn unique_id() -> i64 {
    let (high, _) = Uuid::new_v4().as_u64_pair();
    i64::try_from(high >> 1).unwrap_or(1)
}
