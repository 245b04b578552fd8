//! Ranked and identity queries.

use crate::cache::Cache;
use crate::error::CacheResult;
use crate::models::RankedRow;
use ladder_core::entry::UNKNOWN_NAME;
use ladder_core::{Entry, TimeWindow};
use uuid::Uuid;

/// Rank reported by identity lookups that found nothing.
pub const UNRANKED: i64 = -1;

impl Cache {
    /// The entry at 1-based `rank` of `board` under `window`'s ordering.
    ///
    /// Never fails: a missing board, an empty position and a backend error
    /// each come back as a distinct sentinel entry.
    pub async fn get_by_rank(&self, board: &str, rank: i64, window: TimeWindow) -> Entry {
        if !self.board_exists(board).await {
            return Entry::no_board(rank, board, window);
        }
        let result = async {
            let table = self.table(board)?;
            self.store.stat_at_rank(&table, window, rank).await
        }
        .await;
        match result {
            Ok(Some(row)) => self.row_entry(rank, board, row, window),
            Ok(None) => Entry::no_data(rank, board, self.no_data_name.as_str(), window),
            Err(e) => {
                tracing::error!(
                    board = board,
                    rank,
                    window = %window,
                    error = %e,
                    "Failed to read rank"
                );
                Entry::error(rank, board, window)
            }
        }
    }

    /// The entry of `entity` on `board` under `window`'s ordering.
    ///
    /// Walks the ordering from the top, so the cost grows with the
    /// entity's rank. Sentinels carry rank -1.
    pub async fn get_by_entity(&self, board: &str, entity: Uuid, window: TimeWindow) -> Entry {
        if !self.board_exists(board).await {
            return Entry::no_board(UNRANKED, board, window);
        }
        let result = async {
            let table = self.table(board)?;
            self.store
                .find_rank(&table, window, &entity.to_string())
                .await
        }
        .await;
        match result {
            Ok(Some((rank, row))) => self.row_entry(rank, board, row, window),
            Ok(None) => Entry::no_data(UNRANKED, board, self.no_data_name.as_str(), window),
            Err(e) => {
                tracing::error!(
                    board = board,
                    entity = %entity,
                    window = %window,
                    error = %e,
                    "Failed to find entity rank"
                );
                Entry::error(UNRANKED, board, window)
            }
        }
    }

    /// Delete every row of `board` whose cached display name is `name`.
    ///
    /// Returns false if the deletion failed. A missing board has nothing
    /// to remove.
    pub async fn remove_player(&self, board: &str, name: &str) -> bool {
        if !self.board_exists(board).await {
            tracing::debug!(board = board, name = name, "No such board, nothing to remove");
            return true;
        }
        let result: CacheResult<u64> = async {
            let table = self.table(board)?;
            self.store.delete_by_name(&table, name).await
        }
        .await;
        match result {
            Ok(deleted) => {
                tracing::info!(board = board, name = name, deleted, "Removed player");
                true
            }
            Err(e) => {
                tracing::error!(board = board, name = name, error = %e, "Failed to remove player");
                false
            }
        }
    }

    fn row_entry(&self, rank: i64, board: &str, row: RankedRow, window: TimeWindow) -> Entry {
        let Ok(entity) = Uuid::parse_str(&row.id) else {
            tracing::error!(board = board, id = %row.id, "Stored id is not a UUID");
            return Entry::error(rank, board, window);
        };
        Entry::found(
            rank,
            board,
            row.prefixcache.unwrap_or_default(),
            row.namecache.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            row.suffixcache.unwrap_or_default(),
            entity,
            row.score,
            window,
        )
    }
}
