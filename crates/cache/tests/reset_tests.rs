//! Window reset tests against both backends.

mod common;

use common::{TestCache, run_cache_test_both};
use ladder_cache::Cache;
use ladder_core::{DisplayMeta, TimeWindow};
use uuid::Uuid;

const DAY_MS: i64 = 86_400_000;

#[tokio::test]
async fn test_daily_reset_scenario() {
    run_cache_test_both(|cache: Cache| async move {
        assert!(cache.create_board("kills").await);
        let id = Uuid::new_v4();
        let meta = DisplayMeta::named("Steve");
        cache.ingest("kills", id, 42.0, &meta).await;

        let report = cache
            .reset_window_at("kills", TimeWindow::Daily, 20_000 * DAY_MS + 1234)
            .await;
        assert_eq!(report.anchor_ms, 20_000 * DAY_MS);
        assert_eq!(report.reset, 1);
        assert_eq!(report.failed, 0);

        cache.ingest("kills", id, 50.0, &meta).await;
        let entry = cache.get_by_entity("kills", id, TimeWindow::Daily).await;
        assert_eq!(entry.value, 8.0);
        let entry = cache.get_by_entity("kills", id, TimeWindow::AllTime).await;
        assert_eq!(entry.value, 50.0);
    })
    .await;
}

#[tokio::test]
async fn test_reset_rebaselines_only_its_window() {
    run_cache_test_both(|cache: Cache| async move {
        assert!(cache.create_board("kills").await);
        let id = Uuid::new_v4();
        let meta = DisplayMeta::default();
        cache.ingest("kills", id, 10.0, &meta).await;
        cache.ingest("kills", id, 25.0, &meta).await;

        cache
            .reset_window_at("kills", TimeWindow::Weekly, 3 * 7 * DAY_MS)
            .await;
        let record = cache.get_record("kills", id).await.expect("record");
        let weekly = record.window(TimeWindow::Weekly).expect("weekly");
        assert_eq!(weekly.delta, 0.0);
        assert_eq!(weekly.last_total, 25.0);
        assert_eq!(weekly.timestamp, 3 * 7 * DAY_MS);

        let daily = record.window(TimeWindow::Daily).expect("daily");
        assert_eq!(daily.delta, 15.0);
        assert_eq!(daily.last_total, 10.0);
        assert_eq!(daily.timestamp, 0);
    })
    .await;
}

#[tokio::test]
async fn test_reset_alignment() {
    run_cache_test_both(|cache: Cache| async move {
        assert!(cache.create_board("kills").await);
        cache
            .ingest("kills", Uuid::new_v4(), 1.0, &DisplayMeta::default())
            .await;

        let hour = 3_600_000;
        let first = cache
            .reset_window_at("kills", TimeWindow::Hourly, 500 * hour + 10)
            .await;
        let second = cache
            .reset_window_at("kills", TimeWindow::Hourly, 500 * hour + hour - 1)
            .await;
        assert_eq!(first.anchor_ms, second.anchor_ms);
        assert_eq!(first.anchor_ms % hour, 0);

        assert_eq!(cache.last_reset("kills", TimeWindow::Hourly).await, 500 * hour);
        assert_eq!(
            cache.next_reset("kills", TimeWindow::Hourly).await,
            Some(501 * hour)
        );
    })
    .await;
}

#[tokio::test]
async fn test_new_entities_inherit_board_anchor() {
    run_cache_test_both(|cache: Cache| async move {
        assert!(cache.create_board("kills").await);
        cache
            .ingest("kills", Uuid::new_v4(), 1.0, &DisplayMeta::default())
            .await;
        cache
            .reset_window_at("kills", TimeWindow::Daily, 19_000 * DAY_MS + 5)
            .await;

        let late = Uuid::new_v4();
        cache.ingest("kills", late, 7.0, &DisplayMeta::default()).await;
        let record = cache.get_record("kills", late).await.expect("record");
        let daily = record.window(TimeWindow::Daily).expect("daily");
        assert_eq!(daily.timestamp, 19_000 * DAY_MS);
        assert_eq!(daily.last_total, 7.0);
        assert_eq!(record.window(TimeWindow::Monthly).expect("monthly").timestamp, 0);
    })
    .await;
}

#[tokio::test]
async fn test_schedule_of_fresh_board() {
    run_cache_test_both(|cache: Cache| async move {
        assert!(cache.create_board("kills").await);
        assert_eq!(cache.last_reset("kills", TimeWindow::Daily).await, 0);
        assert_eq!(cache.next_reset("kills", TimeWindow::Daily).await, Some(DAY_MS));
        assert_eq!(cache.next_reset("kills", TimeWindow::AllTime).await, None);
        assert_eq!(cache.last_reset("missing", TimeWindow::Daily).await, 0);
    })
    .await;
}

#[tokio::test]
async fn test_reset_of_empty_and_missing_boards() {
    run_cache_test_both(|cache: Cache| async move {
        assert!(cache.create_board("kills").await);
        let report = cache.reset_window("kills", TimeWindow::Monthly).await;
        assert_eq!(report.reset, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.anchor_ms % 2_592_000_000, 0);

        let report = cache.reset_window("missing", TimeWindow::Daily).await;
        assert_eq!(report.reset, 0);
        assert_eq!(report.failed, 0);
        assert!(cache.list_boards().await.iter().all(|b| b != "missing"));
    })
    .await;
}

#[tokio::test]
async fn test_reset_skips_failing_rows() {
    let test = TestCache::new().await.expect("Failed to create test cache");
    let cache = test.cache();
    assert!(cache.create_board("kills").await);

    let stuck = Uuid::new_v4();
    let others = [(Uuid::new_v4(), 9.0), (Uuid::new_v4(), 4.0)];
    cache.ingest("kills", stuck, 6.0, &DisplayMeta::named("Steve")).await;
    for (id, value) in others {
        cache.ingest("kills", id, value, &DisplayMeta::default()).await;
    }

    // Any update of one row now aborts
    sqlx::query(&format!(
        "CREATE TRIGGER block_stuck BEFORE UPDATE ON \"kills\" \
         WHEN OLD.id = '{stuck}' BEGIN SELECT RAISE(ABORT, 'row is locked'); END"
    ))
    .execute(test.pool())
    .await
    .expect("Failed to create trigger");

    let report = cache
        .reset_window_at("kills", TimeWindow::Daily, 3 * DAY_MS + 42)
        .await;
    assert_eq!(report.anchor_ms, 3 * DAY_MS);
    assert_eq!(report.reset, 2);
    assert_eq!(report.failed, 1);

    for (id, value) in others {
        let record = cache.get_record("kills", id).await.expect("record");
        let daily = record.window(TimeWindow::Daily).expect("daily");
        assert_eq!(daily.delta, 0.0);
        assert_eq!(daily.last_total, value);
        assert_eq!(daily.timestamp, 3 * DAY_MS);
    }
    let record = cache.get_record("kills", stuck).await.expect("record");
    let daily = record.window(TimeWindow::Daily).expect("daily");
    assert_eq!(daily.timestamp, 0);
    assert_eq!(daily.last_total, 6.0);
}

#[tokio::test]
#[should_panic(expected = "all-time")]
async fn test_reset_all_time_panics() {
    let test = common::TestCache::new().await.expect("Failed to create test cache");
    let cache = test.cache();
    assert!(cache.create_board("kills").await);
    cache.reset_window("kills", TimeWindow::AllTime).await;
}
