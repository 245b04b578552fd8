//! PostgreSQL-specific integration tests using testcontainers.
//!
//! These tests require Docker to be running. Set SKIP_POSTGRES_TESTS=1 to skip.

mod common;

use common::{POSTGRES_TABLE_PREFIX, postgres_or_skip};
use ladder_cache::{Dialect, IngestOutcome};
use ladder_core::{DisplayMeta, TimeWindow};
use uuid::Uuid;

#[tokio::test]
async fn test_postgres_health_and_dialect() {
    let Some(pg) = postgres_or_skip().await else {
        return;
    };
    let cache = pg.cache();
    cache.store().health_check().await.expect("health check");
    assert_eq!(cache.store().dialect(), Dialect::Postgres);
}

#[tokio::test]
async fn test_postgres_prefix_isolates_boards() {
    let Some(pg) = postgres_or_skip().await else {
        return;
    };
    let cache = pg.cache();
    assert!(cache.create_board("kills").await);
    sqlx::query("CREATE TABLE unrelated (x INTEGER)")
        .execute(pg.pool())
        .await
        .expect("Failed to create unrelated table");

    assert_eq!(cache.list_boards().await, vec!["kills"]);
    assert_eq!(
        cache.list_tables().await,
        vec![format!("{POSTGRES_TABLE_PREFIX}kills")]
    );
}

#[tokio::test]
async fn test_postgres_remove_board_with_open_pool() {
    let Some(pg) = postgres_or_skip().await else {
        return;
    };
    let cache = pg.cache();
    assert!(cache.create_board("kills").await);
    for value in [1.0, 2.0, 3.0] {
        cache
            .ingest("kills", Uuid::new_v4(), value, &DisplayMeta::default())
            .await;
    }
    // Keep pooled connections warm with reads against the table
    let top = cache.get_by_rank("kills", 1, TimeWindow::AllTime).await;
    assert_eq!(top.value, 3.0);

    assert!(cache.remove_board("kills").await);
    assert!(cache.list_boards().await.is_empty());
}

#[tokio::test]
async fn test_postgres_upgrades_old_table() {
    let Some(pg) = postgres_or_skip().await else {
        return;
    };
    let cache = pg.cache();
    let table = format!("{POSTGRES_TABLE_PREFIX}kills");
    sqlx::query(&format!(
        "CREATE TABLE \"{table}\" (id VARCHAR(36) PRIMARY KEY, value DOUBLE PRECISION, \
         daily_delta DOUBLE PRECISION, daily_lasttotal DOUBLE PRECISION, daily_timestamp BIGINT, \
         namecache TEXT, prefixcache TEXT, suffixcache TEXT)"
    ))
    .execute(pg.pool())
    .await
    .expect("Failed to create old table");

    assert!(cache.create_board("kills").await);
    let columns: Vec<String> = sqlx::query_scalar(
        "SELECT column_name::text FROM information_schema.columns WHERE table_name::text = $1",
    )
    .bind(&table)
    .fetch_all(pg.pool())
    .await
    .expect("Failed to list columns");
    for w in TimeWindow::ROLLING {
        assert!(columns.contains(&w.delta_column()), "missing {w} delta");
        assert!(columns.contains(&w.timestamp_column()), "missing {w} timestamp");
    }

    let id = Uuid::new_v4();
    let outcome = cache.ingest("kills", id, 4.0, &DisplayMeta::named("Steve")).await;
    assert_eq!(outcome, IngestOutcome::Inserted);
}

#[tokio::test]
async fn test_postgres_concurrent_first_ingestion() {
    let Some(pg) = postgres_or_skip().await else {
        return;
    };
    let cache = pg.cache();
    assert!(cache.create_board("kills").await);
    let id = Uuid::new_v4();

    let mut handles = Vec::new();
    for value in [5.0, 6.0, 7.0, 8.0] {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache
                .ingest("kills", id, value, &DisplayMeta::named("Steve"))
                .await
        }));
    }
    for handle in handles {
        let outcome = handle.await.expect("task panicked");
        assert_ne!(outcome, IngestOutcome::Skipped);
    }

    // Exactly one row per entity whatever the interleaving
    assert_eq!(cache.board_size("kills").await, 1);
}
