//! PostgreSQL-based leaderboard store implementation.

use crate::dialect::Dialect;
use crate::error::CacheResult;
use crate::models::{EntityValue, InsertOutcome, NewStat, RankedRow, StatRecord, StatUpdate};
use crate::repos::{BoardRepo, StatRepo};
use crate::store::LeaderboardStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use ladder_core::config::PgSslMode;
use ladder_core::{TableName, TimeWindow};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{ConnectOptions, Connection, Pool, Postgres, Row};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

const DIALECT: Dialect = Dialect::Postgres;

/// Pool sizing shared by both constructors.
#[derive(Clone, Copy, Debug)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub statement_timeout_ms: Option<u64>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 30,
            statement_timeout_ms: Some(30_000),
        }
    }
}

/// PostgreSQL-based leaderboard store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(url: &str, settings: PoolSettings) -> CacheResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, settings).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, enabling better
    /// secret management (e.g., passwords via environment variables).
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        settings: PoolSettings,
    ) -> CacheResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, settings).await
    }

    async fn connect(mut opts: PgConnectOptions, settings: PoolSettings) -> CacheResult<Self> {
        if let Some(timeout_ms) = settings.statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .connect_with(opts)
            .await?;

        tracing::info!(
            max_connections = settings.max_connections,
            "Opened networked leaderboard cache"
        );

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl LeaderboardStore for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn health_check(&self) -> CacheResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BoardRepo for PostgresStore {
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

    async fn add_column(&self, table: &TableName, column: &str, sql_type: &str) -> CacheResult<()> {
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
        // Dedicated connection, closed right after: pooled sessions may hold
        // locks on the table from earlier statements.
        let mut conn = self.pool.connect_options().connect().await?;
        sqlx::query(&DIALECT.drop_board_sql(table))
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(())
    }
}

#[async_trait]
impl StatRepo for PostgresStore {
    async fn get_record(&self, table: &TableName, id: &str) -> CacheResult<Option<StatRecord>> {
        let sql = DIALECT.select_record_sql(table);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(StatRecord::from_row).transpose()?)
    }

    async fn window_anchors(&self, table: &TableName) -> CacheResult<BTreeMap<TimeWindow, i64>> {
        let sql = DIALECT.select_anchors_sql(table);
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        let mut anchors = BTreeMap::new();
        for w in TimeWindow::ROLLING {
            anchors.insert(w, row.try_get::<i64, _>(w.timestamp_column().as_str())?);
        }
        Ok(anchors)
    }

    async fn insert_stat(&self, table: &TableName, stat: &NewStat) -> CacheResult<InsertOutcome> {
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
