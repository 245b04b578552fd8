//! Window resets on the epoch grid.

use crate::cache::Cache;
use crate::models::ResetReport;
use ladder_core::{TimeWindow, now_millis};
use std::time::Instant;

impl Cache {
    /// Re-anchor `window` on `board` at the current grid point.
    ///
    /// # Panics
    ///
    /// Panics if `window` is [`TimeWindow::AllTime`], which has nothing to reset.
    pub async fn reset_window(&self, board: &str, window: TimeWindow) -> ResetReport {
        self.reset_window_at(board, window, now_millis()).await
    }

    /// Re-anchor `window` on `board` at the grid point containing `now_ms`.
    ///
    /// Every row gets last total = value, delta = 0 and the anchor
    /// `floor(now_ms / period) * period`. A row that fails to update is
    /// logged and skipped; the rest still reset. A missing board gives an
    /// empty report.
    ///
    /// # Panics
    ///
    /// Panics if `window` is [`TimeWindow::AllTime`], which has nothing to reset.
    pub async fn reset_window_at(&self, board: &str, window: TimeWindow, now_ms: i64) -> ResetReport {
        let Some(anchor_ms) = window.anchor_for(now_ms) else {
            panic!("the all-time window cannot be reset");
        };
        let started = Instant::now();
        let mut report = ResetReport {
            board: board.to_string(),
            window,
            anchor_ms,
            reset: 0,
            failed: 0,
        };

        if !self.board_exists(board).await {
            tracing::debug!(board = board, window = %window, "No such board, nothing to reset");
            return report;
        }
        let table = match self.table(board) {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(board = board, window = %window, error = %e, "Cannot reset window");
                return report;
            }
        };
        let rows = match self.store.entity_values(&table).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(
                    board = board,
                    window = %window,
                    error = %e,
                    "Failed to read board values for reset"
                );
                return report;
            }
        };

        for row in rows {
            match self
                .store
                .reset_entity(&table, window, &row.id, row.value, anchor_ms)
                .await
            {
                Ok(()) => report.reset += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        board = board,
                        window = %window,
                        entity = %row.id,
                        error = %e,
                        "Failed to reset row"
                    );
                }
            }
        }

        tracing::info!(
            board = board,
            window = %window,
            anchor_ms,
            reset = report.reset,
            failed = report.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Window reset finished"
        );
        report
    }

    /// Anchor of the last reset of `window` on `board`, in epoch milliseconds.
    ///
    /// 0 when the window was never reset, for the all-time window, for a
    /// missing board and on failure.
    pub async fn last_reset(&self, board: &str, window: TimeWindow) -> i64 {
        if !window.is_rolling() || !self.board_exists(board).await {
            return 0;
        }
        let result = async {
            let table = self.table(board)?;
            self.store.window_anchors(&table).await
        }
        .await;
        match result {
            Ok(anchors) => anchors.get(&window).copied().unwrap_or(0),
            Err(e) => {
                tracing::error!(board = board, window = %window, error = %e, "Failed to read last reset");
                0
            }
        }
    }

    /// When `window` on `board` is next due, one period after the last reset.
    ///
    /// `None` for the all-time window.
    pub async fn next_reset(&self, board: &str, window: TimeWindow) -> Option<i64> {
        let period = window.reset_period_ms()?;
        Some(self.last_reset(board, window).await.saturating_add(period))
    }
}
