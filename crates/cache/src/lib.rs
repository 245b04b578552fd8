//! Leaderboard cache store for Ladder.
//!
//! This crate owns everything that touches the database:
//! - The backend adapter (embedded SQLite or networked PostgreSQL)
//! - Board tables and their upgrade to the current window columns
//! - Ingestion of raw metrics into per-window deltas
//! - Ranked and identity queries
//! - Epoch-aligned window resets
//!
//! [`Cache`] is the entry point. Its operations never fail outward: backend
//! errors are logged and turned into safe defaults or sentinel entries.

pub mod cache;
pub mod dialect;
pub mod error;
pub mod ingest;
pub mod models;
pub mod postgres;
pub mod query;
pub mod repos;
pub mod reset;
pub mod store;

pub use cache::Cache;
pub use dialect::Dialect;
pub use error::{CacheError, CacheResult};
pub use models::{IngestOutcome, InsertOutcome, ResetReport, StatRecord, WindowState};
pub use postgres::{PoolSettings, PostgresStore};
pub use store::{LeaderboardStore, SqliteStore};

use ladder_core::config::StorageConfig;
use std::sync::Arc;

/// Create a leaderboard store from configuration.
pub async fn from_config(config: &StorageConfig) -> CacheResult<Arc<dyn LeaderboardStore>> {
    config.validate().map_err(CacheError::Config)?;

    match config {
        StorageConfig::Embedded {
            path,
            busy_timeout_secs,
        } => {
            let store = SqliteStore::new(path, Some(*busy_timeout_secs)).await?;
            Ok(Arc::new(store) as Arc<dyn LeaderboardStore>)
        }
        StorageConfig::Networked {
            url,
            host,
            port,
            username,
            password,
            database,
            ssl_mode,
            max_connections,
            acquire_timeout_secs,
            statement_timeout_ms,
            ..
        } => {
            let settings = PoolSettings {
                max_connections: *max_connections,
                acquire_timeout_secs: *acquire_timeout_secs,
                statement_timeout_ms: *statement_timeout_ms,
            };
            let store = if let Some(url) = url {
                // URL takes precedence over individual fields
                tracing::info!("Connecting to PostgreSQL using connection URL");
                PostgresStore::from_url(url, settings).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresStore::from_params(
                    host,
                    port.unwrap_or(5432),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *ssl_mode,
                    settings,
                )
                .await?
            } else {
                return Err(CacheError::Config(
                    "networked storage requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn LeaderboardStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_embedded() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("cache.db");
        let config = StorageConfig::Embedded {
            path: db_path.clone(),
            busy_timeout_secs: 5,
        };

        let store = from_config(&config).await.unwrap();
        store.health_check().await.unwrap();
        assert_eq!(store.dialect(), Dialect::Sqlite);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_from_config_rejects_invalid_networked() {
        let config = StorageConfig::Networked {
            url: None,
            host: Some("localhost".to_string()),
            port: Some(5432),
            username: None,
            password: None,
            database: None,
            ssl_mode: None,
            table_prefix: String::new(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            statement_timeout_ms: None,
        };

        let err = match from_config(&config).await {
            Err(e) => e,
            Ok(_) => panic!("expected a configuration error"),
        };
        assert!(matches!(err, CacheError::Config(_)));
    }
}
