//! Configuration types shared across crates.

use crate::board::validate_table_prefix;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Storage backend configuration, selected by `method`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Embedded SQLite file, one long-lived connection.
    Embedded {
        /// Database file path.
        #[serde(default = "default_embedded_path")]
        path: PathBuf,
        /// Busy timeout in seconds while waiting on the file lock.
        #[serde(default = "default_busy_timeout_secs")]
        busy_timeout_secs: u64,
    },
    /// Networked PostgreSQL server, pooled connections.
    Networked {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host (e.g., "localhost" or "db.example.com").
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer LADDER_STORAGE__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// SSL mode for connections.
        ssl_mode: Option<PgSslMode>,
        /// Prefix prepended to every board table name.
        #[serde(default)]
        table_prefix: String,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Seconds to wait for a pooled connection before giving up.
        #[serde(default = "default_acquire_timeout_secs")]
        acquire_timeout_secs: u64,
        /// Statement timeout in milliseconds (prevents hung queries).
        #[serde(default = "default_statement_timeout_ms")]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_embedded_path() -> PathBuf {
    PathBuf::from("./data/cache.db")
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_statement_timeout_ms() -> Option<u64> {
    Some(30_000)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Embedded {
            path: default_embedded_path(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl StorageConfig {
    /// The table prefix in effect. The embedded backend never uses one.
    pub fn table_prefix(&self) -> &str {
        match self {
            Self::Embedded { .. } => "",
            Self::Networked { table_prefix, .. } => table_prefix,
        }
    }

    /// Short backend label for logs.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Embedded { .. } => "embedded",
            Self::Networked { .. } => "networked",
        }
    }

    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Embedded { .. } => Ok(()),
            Self::Networked {
                url,
                host,
                database,
                table_prefix,
                max_connections,
                ..
            } => {
                validate_table_prefix(table_prefix).map_err(|e| e.to_string())?;
                if *max_connections == 0 {
                    return Err("storage.max_connections must be at least 1".to_string());
                }
                // Must have either url OR (host + database)
                match (url.as_ref(), host.as_ref(), database.as_ref()) {
                    (Some(_), _, _) => Ok(()),
                    (None, Some(_), Some(_)) => Ok(()),
                    (None, None, _) => Err(
                        "networked storage requires either 'url' or 'host' + 'database'"
                            .to_string(),
                    ),
                    (None, Some(_), None) => Err(
                        "networked storage requires 'database' when using individual fields"
                            .to_string(),
                    ),
                }
            }
        }
    }
}

/// Complete cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Backend selection and connection parameters.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Display name of "no data" placeholder entries.
    #[serde(default = "default_no_data_name")]
    pub no_data_name: String,
}

fn default_no_data_name() -> String {
    crate::DEFAULT_NO_DATA_NAME.to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            no_data_name: default_no_data_name(),
        }
    }
}

impl CacheConfig {
    /// Embedded configuration pointing at `path`.
    pub fn embedded(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig::Embedded {
                path: path.into(),
                busy_timeout_secs: default_busy_timeout_secs(),
            },
            no_data_name: default_no_data_name(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()
    }
}
