//! Rows and write requests for board tables.

use ladder_core::{DisplayMeta, TimeWindow};
use sqlx::{ColumnIndex, Decode, FromRow, Row, Type};
use std::collections::BTreeMap;

/// One row of a ranked query.
#[derive(Debug, Clone, FromRow)]
pub struct RankedRow {
    pub id: String,
    /// The window's ranking key: `value` for all-time, the delta otherwise.
    pub score: f64,
    pub namecache: Option<String>,
    pub prefixcache: Option<String>,
    pub suffixcache: Option<String>,
}

/// An entity's raw value, as read by the reset procedure.
#[derive(Debug, Clone, FromRow)]
pub struct EntityValue {
    pub id: String,
    pub value: f64,
}

/// Delta/reset state of one rolling window on one row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowState {
    /// Value accumulated since the last reset.
    pub delta: f64,
    /// Raw value snapshotted at the last reset (or first ingestion).
    pub last_total: f64,
    /// Anchor of the last reset in epoch milliseconds; 0 if never reset.
    pub timestamp: i64,
}

/// A full board row.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub id: String,
    pub value: f64,
    pub windows: BTreeMap<TimeWindow, WindowState>,
    pub namecache: Option<String>,
    pub prefixcache: Option<String>,
    pub suffixcache: Option<String>,
}

impl StatRecord {
    /// State of a rolling window; all-time has none.
    pub fn window(&self, window: TimeWindow) -> Option<&WindowState> {
        self.windows.get(&window)
    }

    /// Last total of a window, 0 when absent.
    pub fn last_total(&self, window: TimeWindow) -> f64 {
        self.window(window).map(|s| s.last_total).unwrap_or(0.0)
    }

    /// The window's ranking key.
    pub fn score(&self, window: TimeWindow) -> f64 {
        match window {
            TimeWindow::AllTime => self.value,
            w => self.window(w).map(|s| s.delta).unwrap_or(0.0),
        }
    }

    /// Decode a row produced by [`Dialect::select_record_sql`](crate::dialect::Dialect::select_record_sql).
    pub(crate) fn from_row<'r, R>(row: &'r R) -> Result<Self, sqlx::Error>
    where
        R: Row,
        for<'c> &'c str: ColumnIndex<R>,
        String: Decode<'r, R::Database> + Type<R::Database>,
        Option<String>: Decode<'r, R::Database> + Type<R::Database>,
        f64: Decode<'r, R::Database> + Type<R::Database>,
        i64: Decode<'r, R::Database> + Type<R::Database>,
    {
        let mut windows = BTreeMap::new();
        for w in TimeWindow::ROLLING {
            let state = WindowState {
                delta: row.try_get(w.delta_column().as_str())?,
                last_total: row.try_get(w.last_total_column().as_str())?,
                timestamp: row.try_get(w.timestamp_column().as_str())?,
            };
            windows.insert(w, state);
        }
        Ok(Self {
            id: row.try_get("id")?,
            value: row.try_get("value")?,
            windows,
            namecache: row.try_get("namecache")?,
            prefixcache: row.try_get("prefixcache")?,
            suffixcache: row.try_get("suffixcache")?,
        })
    }
}

/// A brand-new row for the insert path.
///
/// Every window starts with delta 0, last total = value, and the board's
/// current anchor.
#[derive(Debug, Clone)]
pub struct NewStat {
    pub id: String,
    pub value: f64,
    pub meta: DisplayMeta,
    pub anchors: BTreeMap<TimeWindow, i64>,
}

impl NewStat {
    /// (delta, last total, timestamp) per rolling window, in column order.
    pub fn window_values(&self) -> impl Iterator<Item = (f64, f64, i64)> + '_ {
        TimeWindow::ROLLING.into_iter().map(|w| {
            let anchor = self.anchors.get(&w).copied().unwrap_or(0);
            (0.0, self.value, anchor)
        })
    }
}

/// An update of an existing row.
///
/// Last totals and timestamps are deliberately absent: only inserts and
/// resets write them.
#[derive(Debug, Clone)]
pub struct StatUpdate {
    pub id: String,
    pub value: f64,
    pub meta: DisplayMeta,
    pub deltas: BTreeMap<TimeWindow, f64>,
}

impl StatUpdate {
    /// Update `record` to `value`, recomputing each delta against the
    /// record's last totals.
    pub fn against(record: &StatRecord, value: f64, meta: DisplayMeta) -> Self {
        let deltas = TimeWindow::ROLLING
            .into_iter()
            .map(|w| (w, value - record.last_total(w)))
            .collect();
        Self {
            id: record.id.clone(),
            value,
            meta,
            deltas,
        }
    }

    /// Deltas in column order.
    pub fn delta_values(&self) -> impl Iterator<Item = f64> + '_ {
        TimeWindow::ROLLING
            .into_iter()
            .map(|w| self.deltas.get(&w).copied().unwrap_or(0.0))
    }
}

/// Result of the insert path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same id already exists; nothing was written.
    Conflict,
}

/// What an ingestion call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted,
    Updated,
    /// Nothing was written (non-finite value, missing board, vanished row).
    Skipped,
}

/// Summary of one window reset.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetReport {
    pub board: String,
    pub window: TimeWindow,
    /// The epoch-aligned anchor written to every row.
    pub anchor_ms: i64,
    /// Rows re-anchored.
    pub reset: usize,
    /// Rows whose update failed and were skipped.
    pub failed: usize,
}
