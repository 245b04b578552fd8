//! Board table repository.

use crate::error::CacheResult;
use async_trait::async_trait;
use ladder_core::TableName;

/// Repository for per-board tables.
#[async_trait]
pub trait BoardRepo: Send + Sync {
    /// Create the board table if it does not exist, in a single DDL statement.
    async fn create_board_table(&self, table: &TableName) -> CacheResult<()>;

    /// Column names of an existing board table.
    async fn table_columns(&self, table: &TableName) -> CacheResult<Vec<String>>;

    /// Add one column to an existing board table.
    async fn add_column(&self, table: &TableName, column: &str, sql_type: &str)
    -> CacheResult<()>;

    /// Names of every user table in the backend, sorted.
    async fn list_tables(&self) -> CacheResult<Vec<String>>;

    /// Drop a board table. Dropping a missing table is not an error.
    async fn drop_board_table(&self, table: &TableName) -> CacheResult<()>;
}
