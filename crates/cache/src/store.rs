//! Store trait and the embedded SQLite implementation.

use crate::dialect::Dialect;
use crate::error::CacheResult;
use crate::repos::{BoardRepo, StatRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined store trait: the backend adapter contract.
///
/// Exactly one implementation backs a [`Cache`](crate::Cache); call sites
/// only ever see this trait.
#[async_trait]
pub trait LeaderboardStore: BoardRepo + StatRepo + Send + Sync {
    /// SQL dialect of the backend.
    fn dialect(&self) -> Dialect;

    /// Check database connectivity.
    async fn health_check(&self) -> CacheResult<()>;
}

/// Embedded SQLite store.
///
/// Holds a single long-lived connection: the pool is capped at one and never
/// retires it, so an in-memory database lives as long as the store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn new(path: impl AsRef<Path>, busy_timeout_secs: Option<u64>) -> CacheResult<Self> {
        let path = path.as_ref();
        let busy_timeout = Duration::from_secs(busy_timeout_secs.unwrap_or(5));

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors when another process holds the file.
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        tracing::info!(path = %path.display(), "Opened embedded leaderboard cache");
        tracing::warn!(
            busy_timeout_secs = busy_timeout.as_secs(),
            "SQLite busy timeout is advisory only: it bounds lock waits, not statement run time. \
             Use the networked backend when several processes share one leaderboard cache."
        );

        Ok(Self { pool })
    }

    /// A private in-memory database (tests and throwaway caches).
    pub async fn in_memory() -> CacheResult<Self> {
        Self::new(":memory:", None).await
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl LeaderboardStore for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn health_check(&self) -> CacheResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::{
        EntityValue, InsertOutcome, NewStat, RankedRow, StatRecord, StatUpdate,
    };
    use futures::TryStreamExt;
    use ladder_core::{TableName, TimeWindow};
    use sqlx::Row;
    use std::collections::BTreeMap;

    const DIALECT: Dialect = Dialect::Sqlite;

    #[async_trait]
    impl BoardRepo for SqliteStore {
        async fn create_board_table(&self, table: &TableName) -> CacheResult<()> {
            sqlx::query(&DIALECT.create_board_sql(table))
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn table_columns(&self, table: &TableName) -> CacheResult<Vec<String>> {
            let columns = sqlx::query_scalar::<_, String>(DIALECT.list_columns_sql())
                .bind(table.as_str())
                .fetch_all(&self.pool)
                .await?;
            Ok(columns)
        }

        async fn add_column(
            &self,
            table: &TableName,
            column: &str,
            sql_type: &str,
        ) -> CacheResult<()> {
            sqlx::query(&DIALECT.add_column_sql(table, column, sql_type))
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn list_tables(&self) -> CacheResult<Vec<String>> {
            let tables = sqlx::query_scalar::<_, String>(DIALECT.list_tables_sql())
                .fetch_all(&self.pool)
                .await?;
            Ok(tables)
        }

        async fn drop_board_table(&self, table: &TableName) -> CacheResult<()> {
            sqlx::query(&DIALECT.drop_board_sql(table))
                .execute(&self.pool)
                .await?;
            Ok(())
        }
    }

    #[async_trait]
    impl StatRepo for SqliteStore {
        async fn get_record(&self, table: &TableName, id: &str) -> CacheResult<Option<StatRecord>> {
            let sql = DIALECT.select_record_sql(table);
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row.as_ref().map(StatRecord::from_row).transpose()?)
        }

        async fn window_anchors(
            &self,
            table: &TableName,
        ) -> CacheResult<BTreeMap<TimeWindow, i64>> {
            let sql = DIALECT.select_anchors_sql(table);
            let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
            let mut anchors = BTreeMap::new();
            for w in TimeWindow::ROLLING {
                anchors.insert(w, row.try_get::<i64, _>(w.timestamp_column().as_str())?);
            }
            Ok(anchors)
        }

        async fn insert_stat(
            &self,
            table: &TableName,
            stat: &NewStat,
        ) -> CacheResult<InsertOutcome> {
            let sql = DIALECT.insert_stat_sql(table);
            let mut query = sqlx::query(&sql)
                .bind(stat.id.as_str())
                .bind(stat.value)
                .bind(stat.meta.name.as_str())
                .bind(stat.meta.prefix.as_str())
                .bind(stat.meta.suffix.as_str());
            for (delta, last_total, timestamp) in stat.window_values() {
                query = query.bind(delta).bind(last_total).bind(timestamp);
            }
            let result = query.execute(&self.pool).await?;
            if result.rows_affected() == 0 {
                Ok(InsertOutcome::Conflict)
            } else {
                Ok(InsertOutcome::Inserted)
            }
        }

        async fn update_stat(&self, table: &TableName, update: &StatUpdate) -> CacheResult<u64> {
            let sql = DIALECT.update_stat_sql(table);
            let mut query = sqlx::query(&sql)
                .bind(update.value)
                .bind(update.meta.name.as_str())
                .bind(update.meta.prefix.as_str())
                .bind(update.meta.suffix.as_str());
            for delta in update.delta_values() {
                query = query.bind(delta);
            }
            let result = query
                .bind(update.id.as_str())
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }

        async fn stat_at_rank(
            &self,
            table: &TableName,
            window: TimeWindow,
            rank: i64,
        ) -> CacheResult<Option<RankedRow>> {
            if rank < 1 {
                return Ok(None);
            }
            let sql = DIALECT.select_ranked_sql(table, window, true);
            let row = sqlx::query_as::<_, RankedRow>(&sql)
                .bind(rank - 1)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn find_rank(
            &self,
            table: &TableName,
            window: TimeWindow,
            id: &str,
        ) -> CacheResult<Option<(i64, RankedRow)>> {
            let sql = DIALECT.select_ranked_sql(table, window, false);
            let mut rows = sqlx::query_as::<_, RankedRow>(&sql).fetch(&self.pool);
            let mut rank = 0;
            while let Some(row) = rows.try_next().await? {
                rank += 1;
                if row.id == id {
                    return Ok(Some((rank, row)));
                }
            }
            Ok(None)
        }

        async fn entity_values(&self, table: &TableName) -> CacheResult<Vec<EntityValue>> {
            let sql = DIALECT.select_values_sql(table);
            let rows = sqlx::query_as::<_, EntityValue>(&sql)
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }

        async fn reset_entity(
            &self,
            table: &TableName,
            window: TimeWindow,
            id: &str,
            value: f64,
            anchor: i64,
        ) -> CacheResult<()> {
            sqlx::query(&DIALECT.reset_row_sql(table, window))
                .bind(value)
                .bind(anchor)
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn delete_by_name(&self, table: &TableName, name: &str) -> CacheResult<u64> {
            let result = sqlx::query(&DIALECT.delete_by_name_sql(table))
                .bind(name)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }

        async fn count_rows(&self, table: &TableName) -> CacheResult<u64> {
            let count: i64 = sqlx::query_scalar(&DIALECT.count_rows_sql(table))
                .fetch_one(&self.pool)
                .await?;
            Ok(u64::try_from(count).unwrap_or(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_health_check() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.health_check().await.unwrap();
        assert_eq!(store.dialect(), Dialect::Sqlite);
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("cache.db");
        let store = SqliteStore::new(&db_path, None).await.unwrap();
        store.health_check().await.unwrap();
        assert!(db_path.exists());
    }
}
