//! Cache test utilities for both backends.

use ladder_cache::{Cache, CacheError, CacheResult, PoolSettings, PostgresStore, SqliteStore};
use sqlx::{Pool, Postgres as SqlxPostgres, Sqlite};
use std::sync::Arc;
use tempfile::TempDir;
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

/// Stable prefix for Docker/container startup failures in Postgres test setup.
/// Tests use this marker to decide whether to skip due to unavailable Docker.
pub const POSTGRES_CONTAINER_START_ERR_PREFIX: &str = "postgres-container-start:";

/// Table prefix used by the networked test cache.
pub const POSTGRES_TABLE_PREFIX: &str = "ladder_";

/// A SQLite-backed test cache that cleans up on drop.
#[allow(dead_code)]
pub struct TestCache {
    pub cache: Cache,
    pub(crate) sqlite_store: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

impl TestCache {
    /// Create a new test cache backed by a temporary database file.
    pub async fn new() -> CacheResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let store = Arc::new(SqliteStore::new(&db_path, None).await?);
        let cache = Cache::new(store.clone(), "", "---")?;

        Ok(Self {
            cache,
            sqlite_store: store,
            _temp_dir: temp_dir,
        })
    }

    pub fn cache(&self) -> Cache {
        self.cache.clone()
    }

    /// Get a reference to the SQLite connection pool for raw queries.
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        self.sqlite_store.pool()
    }
}

/// PostgreSQL test cache that manages a testcontainer.
#[allow(dead_code)]
pub struct PostgresTestCache {
    pub cache: Cache,
    pub(crate) postgres_store: Arc<PostgresStore>,
    _container: ContainerAsync<Postgres>,
}

impl PostgresTestCache {
    /// Create a new PostgreSQL test cache with a testcontainer.
    pub async fn new() -> CacheResult<Self> {
        let container = Postgres::default()
            .with_tag("15-alpine")
            .start()
            .await
            .map_err(|e| {
                CacheError::Io(std::io::Error::other(format!(
                    "{} Failed to start PostgreSQL container: {e}",
                    POSTGRES_CONTAINER_START_ERR_PREFIX
                )))
            })?;

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        // Default credentials from testcontainers-modules postgres
        let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

        let settings = PoolSettings {
            max_connections: 5,
            ..PoolSettings::default()
        };
        let store = Arc::new(PostgresStore::from_url(&url, settings).await?);
        let cache = Cache::new(store.clone(), POSTGRES_TABLE_PREFIX, "---")?;

        Ok(Self {
            cache,
            postgres_store: store,
            _container: container,
        })
    }

    pub fn cache(&self) -> Cache {
        self.cache.clone()
    }

    /// Get a reference to the PostgreSQL connection pool for raw queries.
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<SqlxPostgres> {
        self.postgres_store.pool()
    }
}

/// Try to create a PostgreSQL test cache, skipping if Docker is unavailable
/// or SKIP_POSTGRES_TESTS is set.
///
/// Only container-start failures cause a skip. Connection errors against a
/// running container still panic.
#[allow(dead_code)]
pub async fn postgres_or_skip() -> Option<PostgresTestCache> {
    if std::env::var("SKIP_POSTGRES_TESTS").is_ok() {
        return None;
    }
    match PostgresTestCache::new().await {
        Ok(cache) => Some(cache),
        Err(err) => {
            let msg = err.to_string();
            if msg.contains(POSTGRES_CONTAINER_START_ERR_PREFIX) {
                eprintln!("Skipping PostgreSQL test (Docker unavailable): {msg}");
                None
            } else {
                panic!("PostgreSQL test setup failed: {msg}");
            }
        }
    }
}

/// Run a test against both SQLite and PostgreSQL backends.
#[allow(dead_code)]
pub async fn run_cache_test_both<F, Fut>(test_fn: F)
where
    F: Fn(Cache) -> Fut + Clone,
    Fut: std::future::Future<Output = ()>,
{
    let sqlite = TestCache::new()
        .await
        .expect("Failed to create SQLite test cache");
    test_fn.clone()(sqlite.cache()).await;

    // Requires Docker
    if let Some(postgres) = postgres_or_skip().await {
        test_fn(postgres.cache()).await;
    }
}
