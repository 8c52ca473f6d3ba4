//! Runtime settings for the reconciliation service
//!
//! Tunables live in the shared `settings` table so operators can adjust
//! them without redeploying. Missing keys fall back to compiled
//! defaults; unparsable values are a fatal pre-flight error (a typo in a
//! batch-size setting must not silently run with a default).

use roadlens_common::{Error, Result};
use sqlx::SqlitePool;

/// Default number of records dispatched concurrently per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Default budget for retrying a locked database write
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5_000;

/// Default per-record timeout around store calls
pub const DEFAULT_RECORD_TIMEOUT_MS: u64 = 30_000;

/// Settings loaded once before batch work starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconSettings {
    /// Records per concurrently-dispatched chunk
    pub chunk_size: usize,
    /// Maximum total time to retry a locked database write
    pub max_lock_wait_ms: u64,
    /// Per-record timeout around store calls
    pub record_timeout_ms: u64,
}

impl Default for ReconSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
            record_timeout_ms: DEFAULT_RECORD_TIMEOUT_MS,
        }
    }
}

impl ReconSettings {
    /// Load settings from the shared settings table.
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let defaults = Self::default();
        let chunk_size =
            read_setting(pool, "recon_chunk_size", defaults.chunk_size as u64).await? as usize;
        let max_lock_wait_ms =
            read_setting(pool, "recon_db_max_lock_wait_ms", defaults.max_lock_wait_ms).await?;
        let record_timeout_ms =
            read_setting(pool, "recon_record_timeout_ms", defaults.record_timeout_ms).await?;

        if chunk_size == 0 {
            return Err(Error::Config(
                "recon_chunk_size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            chunk_size,
            max_lock_wait_ms,
            record_timeout_ms,
        })
    }
}

async fn read_setting(pool: &SqlitePool, key: &str, default: u64) -> Result<u64> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::Config(format!("Setting {} has non-numeric value '{}'", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadlens_common::db::init_memory_pool;

    async fn put_setting(pool: &SqlitePool, key: &str, value: &str) {
        sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_keys_fall_back_to_defaults() {
        let pool = init_memory_pool().await.unwrap();
        let settings = ReconSettings::load(&pool).await.unwrap();
        assert_eq!(settings, ReconSettings::default());
    }

    #[tokio::test]
    async fn stored_values_override_defaults() {
        let pool = init_memory_pool().await.unwrap();
        put_setting(&pool, "recon_chunk_size", "10").await;
        put_setting(&pool, "recon_db_max_lock_wait_ms", "250").await;

        let settings = ReconSettings::load(&pool).await.unwrap();
        assert_eq!(settings.chunk_size, 10);
        assert_eq!(settings.max_lock_wait_ms, 250);
        assert_eq!(settings.record_timeout_ms, DEFAULT_RECORD_TIMEOUT_MS);
    }

    #[tokio::test]
    async fn garbage_value_is_a_config_error() {
        let pool = init_memory_pool().await.unwrap();
        put_setting(&pool, "recon_chunk_size", "fifty").await;

        let err = ReconSettings::load(&pool).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn zero_chunk_size_is_rejected() {
        let pool = init_memory_pool().await.unwrap();
        put_setting(&pool, "recon_chunk_size", "0").await;

        let err = ReconSettings::load(&pool).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
