//! Board row repository.

use crate::error::CacheResult;
use crate::models::{EntityValue, InsertOutcome, NewStat, RankedRow, StatRecord, StatUpdate};
use async_trait::async_trait;
use ladder_core::{TableName, TimeWindow};
use std::collections::BTreeMap;

/// Repository for rows of a board table.
#[async_trait]
pub trait StatRepo: Send + Sync {
    /// Point lookup of a full row by entity id.
    async fn get_record(&self, table: &TableName, id: &str) -> CacheResult<Option<StatRecord>>;

    /// Latest reset anchor of every rolling window; 0 for windows never reset.
    async fn window_anchors(&self, table: &TableName) -> CacheResult<BTreeMap<TimeWindow, i64>>;

    /// Insert a new row unless one with the same id exists.
    async fn insert_stat(&self, table: &TableName, stat: &NewStat) -> CacheResult<InsertOutcome>;

    /// Update value, caches and deltas of an existing row.
    /// Returns the number of rows touched (0 if the row vanished).
    async fn update_stat(&self, table: &TableName, update: &StatUpdate) -> CacheResult<u64>;

    /// The row at 1-based `rank` under the window's ordering.
    async fn stat_at_rank(
        &self,
        table: &TableName,
        window: TimeWindow,
        rank: i64,
    ) -> CacheResult<Option<RankedRow>>;

    /// Scan the window's ordering for `id`, returning its 1-based rank and row.
    async fn find_rank(
        &self,
        table: &TableName,
        window: TimeWindow,
        id: &str,
    ) -> CacheResult<Option<(i64, RankedRow)>>;

    /// Every (id, value) pair of the board.
    async fn entity_values(&self, table: &TableName) -> CacheResult<Vec<EntityValue>>;

    /// Set one row's window to last total = `value`, delta = 0, timestamp = `anchor`.
    async fn reset_entity(
        &self,
        table: &TableName,
        window: TimeWindow,
        id: &str,
        value: f64,
        anchor: i64,
    ) -> CacheResult<()>;

    /// Delete rows by cached display name. Returns rows deleted.
    async fn delete_by_name(&self, table: &TableName, name: &str) -> CacheResult<u64>;

    /// Number of rows in the board.
    async fn count_rows(&self, table: &TableName) -> CacheResult<u64>;
}
