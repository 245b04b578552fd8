//! The cache facade and board schema management.

use crate::error::CacheResult;
use crate::models::StatRecord;
use crate::store::LeaderboardStore;
use ladder_core::board::validate_table_prefix;
use ladder_core::config::CacheConfig;
use ladder_core::{BoardName, TableName};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Leaderboard cache over one backend.
///
/// Cheap to clone; clones share the backend. Every operation is a complete
/// unit of work and catches its own failures: they are logged and the
/// operation returns a safe default.
#[derive(Clone)]
pub struct Cache {
    pub(crate) store: Arc<dyn LeaderboardStore>,
    pub(crate) table_prefix: String,
    pub(crate) no_data_name: String,
}

impl Cache {
    pub fn new(
        store: Arc<dyn LeaderboardStore>,
        table_prefix: impl Into<String>,
        no_data_name: impl Into<String>,
    ) -> CacheResult<Self> {
        let table_prefix = table_prefix.into();
        validate_table_prefix(&table_prefix)?;
        Ok(Self {
            store,
            table_prefix,
            no_data_name: no_data_name.into(),
        })
    }

    /// Open the configured backend and wrap it.
    pub async fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        let store = crate::from_config(&config.storage).await?;
        tracing::info!(
            method = config.storage.method(),
            dialect = store.dialect().name(),
            table_prefix = config.storage.table_prefix(),
            "Leaderboard cache ready"
        );
        Self::new(store, config.storage.table_prefix(), config.no_data_name.as_str())
    }

    /// The underlying backend.
    pub fn store(&self) -> &Arc<dyn LeaderboardStore> {
        &self.store
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Display name used by no-data entries.
    pub fn no_data_name(&self) -> &str {
        &self.no_data_name
    }

    /// Storage table for `board`, validating the name.
    pub(crate) fn table(&self, board: &str) -> CacheResult<TableName> {
        let name = BoardName::new(board)?;
        Ok(TableName::new(&self.table_prefix, &name)?)
    }

    /// Create a board, or bring an existing one up to the current columns.
    ///
    /// Idempotent. Returns false (and logs) on any failure, or if the board
    /// is not listed afterwards.
    pub async fn create_board(&self, board: &str) -> bool {
        match self.try_create_board(board).await {
            Ok(_) if !self.board_exists(board).await => {
                tracing::error!(board = board, "Board not visible after create");
                false
            }
            Ok(added_columns) => {
                tracing::info!(board = board, added_columns, "Board ready");
                true
            }
            Err(e) => {
                tracing::error!(board = board, error = %e, "Failed to create board");
                false
            }
        }
    }

    async fn try_create_board(&self, board: &str) -> CacheResult<usize> {
        let table = self.table(board)?;
        self.store.create_board_table(&table).await?;

        // Tables from before a window existed lack its columns
        let existing: HashSet<String> = self
            .store
            .table_columns(&table)
            .await?
            .into_iter()
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let mut added = 0;
        for (column, sql_type) in self.store.dialect().window_columns() {
            if existing.contains(&column) {
                continue;
            }
            self.store.add_column(&table, &column, sql_type).await?;
            tracing::info!(board = board, column = %column, "Added missing window column");
            added += 1;
        }
        Ok(added)
    }

    /// Names of every board, without the table prefix, sorted.
    ///
    /// Read fresh from the backend on every call. Empty on failure.
    pub async fn list_boards(&self) -> Vec<String> {
        match self.store.list_tables().await {
            Ok(tables) => {
                let mut boards: Vec<String> = tables
                    .iter()
                    .filter_map(|t| t.strip_prefix(self.table_prefix.as_str()))
                    .filter(|b| !b.is_empty())
                    .map(str::to_string)
                    .collect();
                boards.sort();
                boards
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to list boards");
                Vec::new()
            }
        }
    }

    /// Whether `board` is listed. Names compare case-insensitively.
    pub async fn board_exists(&self, board: &str) -> bool {
        let Ok(name) = BoardName::new(board) else {
            return false;
        };
        self.list_boards()
            .await
            .iter()
            .any(|b| b.eq_ignore_ascii_case(name.as_str()))
    }

    /// Raw names of the tables carrying this cache's prefix.
    pub async fn list_tables(&self) -> Vec<String> {
        match self.store.list_tables().await {
            Ok(tables) => tables
                .into_iter()
                .filter(|t| t.starts_with(self.table_prefix.as_str()))
                .collect(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to list tables");
                Vec::new()
            }
        }
    }

    /// Drop a board and all its rows.
    ///
    /// Returns true if the board is gone afterwards, including when it never
    /// existed.
    pub async fn remove_board(&self, board: &str) -> bool {
        if !self.board_exists(board).await {
            return true;
        }
        let result = async {
            let table = self.table(board)?;
            self.store.drop_board_table(&table).await
        }
        .await;
        match result {
            Ok(()) => {
                tracing::info!(board = board, "Board removed");
                true
            }
            Err(e) => {
                tracing::error!(board = board, error = %e, "Failed to remove board");
                false
            }
        }
    }

    /// Number of entities on a board; 0 for a missing board or on failure.
    pub async fn board_size(&self, board: &str) -> u64 {
        if !self.board_exists(board).await {
            return 0;
        }
        let result = async {
            let table = self.table(board)?;
            self.store.count_rows(&table).await
        }
        .await;
        result.unwrap_or_else(|e| {
            tracing::error!(board = board, error = %e, "Failed to count board rows");
            0
        })
    }

    /// The full persisted row of an entity, window state included.
    pub async fn get_record(&self, board: &str, entity: Uuid) -> Option<StatRecord> {
        if !self.board_exists(board).await {
            return None;
        }
        let result = async {
            let table = self.table(board)?;
            self.store.get_record(&table, &entity.to_string()).await
        }
        .await;
        result.unwrap_or_else(|e| {
            tracing::error!(board = board, entity = %entity, error = %e, "Failed to read record");
            None
        })
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("dialect", &self.store.dialect())
            .field("table_prefix", &self.table_prefix)
            .field("no_data_name", &self.no_data_name)
            .finish()
    }
}
