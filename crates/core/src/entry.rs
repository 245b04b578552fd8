//! Query results.

use crate::window::TimeWindow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name shown for a board that does not exist.
pub const NO_BOARD_NAME: &str = "Board does not exist";

/// Display name shown when a query failed in the backend.
pub const ERROR_NAME: &str = "An error occurred";

/// Display name shown for a stored row without a cached name.
pub const UNKNOWN_NAME: &str = "-Unknown-";

/// What an [`Entry`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A stored row.
    Found,
    /// The board does not exist.
    NoBoard,
    /// The board exists but has no row at the requested rank/entity.
    NoData,
    /// The backend failed while answering the query.
    Error,
}

/// A ranked position on a board, or a placeholder standing in for one.
///
/// Placeholders (sentinels) are well-formed entries with no entity and a
/// distinct display name, so presentation layers can render them directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// 1-based rank; -1 when an entity lookup found nothing.
    pub rank: i64,
    pub board: String,
    pub prefix: String,
    pub name: String,
    pub suffix: String,
    /// `None` for sentinels.
    pub entity: Option<Uuid>,
    pub value: f64,
    pub window: TimeWindow,
    pub kind: EntryKind,
}

impl Entry {
    /// A stored row at `rank`.
    #[allow(clippy::too_many_arguments)]
    pub fn found(
        rank: i64,
        board: impl Into<String>,
        prefix: impl Into<String>,
        name: impl Into<String>,
        suffix: impl Into<String>,
        entity: Uuid,
        value: f64,
        window: TimeWindow,
    ) -> Self {
        Self {
            rank,
            board: board.into(),
            prefix: prefix.into(),
            name: name.into(),
            suffix: suffix.into(),
            entity: Some(entity),
            value,
            window,
            kind: EntryKind::Found,
        }
    }

    /// Placeholder for a board that does not exist.
    pub fn no_board(rank: i64, board: impl Into<String>, window: TimeWindow) -> Self {
        Self::sentinel(rank, board, NO_BOARD_NAME, window, EntryKind::NoBoard)
    }

    /// Placeholder for a position or entity with no data.
    pub fn no_data(
        rank: i64,
        board: impl Into<String>,
        no_data_name: impl Into<String>,
        window: TimeWindow,
    ) -> Self {
        Self::sentinel(rank, board, no_data_name, window, EntryKind::NoData)
    }

    /// Placeholder for a query the backend failed to answer.
    pub fn error(rank: i64, board: impl Into<String>, window: TimeWindow) -> Self {
        Self::sentinel(rank, board, ERROR_NAME, window, EntryKind::Error)
    }

    fn sentinel(
        rank: i64,
        board: impl Into<String>,
        name: impl Into<String>,
        window: TimeWindow,
        kind: EntryKind,
    ) -> Self {
        Self {
            rank,
            board: board.into(),
            prefix: String::new(),
            name: name.into(),
            suffix: String::new(),
            entity: None,
            value: 0.0,
            window,
            kind,
        }
    }

    /// Whether this entry is a placeholder rather than a stored row.
    pub fn is_sentinel(&self) -> bool {
        self.kind != EntryKind::Found
    }

    /// Prefix, name and suffix joined for display.
    pub fn display_name(&self) -> String {
        format!("{}{}{}", self.prefix, self.name, self.suffix)
    }
}
