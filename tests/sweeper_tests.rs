mod common;

use std::time::Duration;

use friendmap::db::{now_millis, MessageRepository, NewMessage};
use friendmap::sweeper::RetentionSweeper;
use tokio::sync::watch;

const HOUR: i64 = 60 * 60 * 1000;
const DAY: i64 = 24 * HOUR;

fn note(content: &str) -> NewMessage {
    NewMessage {
        receiver_id: "bob".into(),
        content: Some(content.into()),
        sticker: None,
    }
}

#[tokio::test]
async fn sweep_removes_messages_at_or_past_horizon() {
    let pool = common::test_pool().await;
    let now = now_millis();
    let fresh = MessageRepository::create_at(&pool, "alice", &note("6d"), now - 6 * DAY)
        .await
        .unwrap();
    MessageRepository::create_at(&pool, "alice", &note("7d1h"), now - 7 * DAY - HOUR)
        .await
        .unwrap();
    MessageRepository::create_at(&pool, "alice", &note("30d"), now - 30 * DAY)
        .await
        .unwrap();

    let sweeper = RetentionSweeper::new(pool.clone(), chrono::Duration::days(7), Duration::from_secs(3600));
    let deleted = sweeper.run_once().await.unwrap();

    assert_eq!(deleted, 2);
    assert!(MessageRepository::get_by_id(&pool, fresh.id).await.unwrap().is_some());
    let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining.0, 1);
}

#[tokio::test]
async fn failed_sweep_is_reported_not_panicked() {
    let pool = common::test_pool().await;
    let sweeper = RetentionSweeper::new(pool.clone(), chrono::Duration::days(7), Duration::from_secs(3600));
    pool.close().await;

    assert!(sweeper.run_once().await.is_err());
}

#[tokio::test]
async fn scheduled_sweeper_runs_on_interval_and_stops_on_shutdown() {
    let pool = common::test_pool().await;
    let sweeper = RetentionSweeper::new(pool.clone(), chrono::Duration::days(7), Duration::from_millis(50));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = sweeper.spawn(shutdown_rx);

    MessageRepository::create_at(&pool, "alice", &note("old"), now_millis() - 8 * DAY)
        .await
        .unwrap();

    let db = &pool;
    let swept = common::eventually(|| async move {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(db)
            .await
            .unwrap();
        count.0 == 0
    })
    .await;
    assert!(swept);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}
