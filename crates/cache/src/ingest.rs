//! Stat ingestion: turning an observed metric into a persisted row.

use crate::cache::Cache;
use crate::error::CacheResult;
use crate::models::{IngestOutcome, InsertOutcome, NewStat, StatUpdate};
use ladder_core::{DisplayMeta, EntityRef, IdentityProvider, MetricResolver, metric_key};
use uuid::Uuid;

/// Parse a resolved metric, tolerating thousands separators.
///
/// Returns `None` for anything that is not a finite number.
pub fn parse_metric(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl Cache {
    /// Record `value` as the entity's current raw metric on `board`.
    ///
    /// Creates the row on first sight, otherwise recomputes every window
    /// delta against the stored last totals. Non-finite values and missing
    /// boards are ignored; backend failures are logged.
    pub async fn ingest(
        &self,
        board: &str,
        entity: Uuid,
        value: f64,
        meta: &DisplayMeta,
    ) -> IngestOutcome {
        if !value.is_finite() {
            tracing::debug!(board = board, entity = %entity, value, "Ignoring non-finite value");
            return IngestOutcome::Skipped;
        }
        if !self.board_exists(board).await {
            tracing::debug!(board = board, "Ignoring value for missing board");
            return IngestOutcome::Skipped;
        }
        match self.try_ingest(board, entity, value, meta).await {
            Ok(outcome) => {
                tracing::debug!(
                    board = board,
                    entity = %entity,
                    value,
                    outcome = ?outcome,
                    "Ingested value"
                );
                outcome
            }
            Err(e) => {
                tracing::error!(
                    board = board,
                    entity = %entity,
                    error = %e,
                    "Failed to ingest value"
                );
                IngestOutcome::Skipped
            }
        }
    }

    async fn try_ingest(
        &self,
        board: &str,
        entity: Uuid,
        value: f64,
        meta: &DisplayMeta,
    ) -> CacheResult<IngestOutcome> {
        let table = self.table(board)?;
        let id = entity.to_string();

        let record = match self.store.get_record(&table, &id).await? {
            Some(record) => record,
            None => {
                let stat = NewStat {
                    id: id.clone(),
                    value,
                    meta: meta.clone(),
                    anchors: self.store.window_anchors(&table).await?,
                };
                match self.store.insert_stat(&table, &stat).await? {
                    InsertOutcome::Inserted => return Ok(IngestOutcome::Inserted),
                    InsertOutcome::Conflict => {
                        // A concurrent writer created the row; update it instead
                        tracing::debug!(board = board, entity = %entity, "Insert lost race");
                        match self.store.get_record(&table, &id).await? {
                            Some(record) => record,
                            None => return Ok(IngestOutcome::Skipped),
                        }
                    }
                }
            }
        };

        let update = StatUpdate::against(&record, value, meta.clone());
        let touched = self.store.update_stat(&table, &update).await?;
        if touched == 0 {
            // Deleted between lookup and update
            return Ok(IngestOutcome::Skipped);
        }
        Ok(IngestOutcome::Updated)
    }

    /// Resolve the entity's metric for `board` and ingest it.
    ///
    /// Values that do not parse as numbers are silently ignored.
    pub async fn update_stat(
        &self,
        board: &str,
        entity: &EntityRef,
        resolver: &dyn MetricResolver,
        identity: &dyn IdentityProvider,
    ) -> IngestOutcome {
        let key = metric_key(board);
        let raw = match resolver.resolve(entity, key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    board = board,
                    entity = %entity.id,
                    error = %e,
                    "Metric resolver failed"
                );
                return IngestOutcome::Skipped;
            }
        };
        let Some(value) = parse_metric(&raw) else {
            return IngestOutcome::Skipped;
        };
        let meta = DisplayMeta::for_entity(entity, identity);
        self.ingest(board, entity.id, value, &meta).await
    }

    /// Run [`update_stat`](Self::update_stat) for the entity on every board.
    ///
    /// Returns the outcome per board, in board order.
    pub async fn update_entity(
        &self,
        entity: &EntityRef,
        resolver: &dyn MetricResolver,
        identity: &dyn IdentityProvider,
    ) -> Vec<(String, IngestOutcome)> {
        let mut outcomes = Vec::new();
        for board in self.list_boards().await {
            let outcome = self.update_stat(&board, entity, resolver, identity).await;
            outcomes.push((board, outcome));
        }
        outcomes
    }
}
