#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use tokio::sync::mpsc::UnboundedReceiver;

use friendmap::api::AppState;
use friendmap::config::Config;
use friendmap::db;
use friendmap::identity::GoogleIdentityVerifier;
use friendmap::realtime::{Hub, ServerEvent};

/// Fresh, migrated in-memory database. One connection, so every query sees
/// the same memory store.
pub async fn test_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    db::migrate(&pool).await.expect("run migrations");
    pool
}

pub async fn test_hub() -> Hub {
    Hub::new(test_pool().await, &Config::default())
}

pub async fn test_state() -> AppState {
    AppState::new(
        test_pool().await,
        Arc::new(Config::default()),
        Arc::new(GoogleIdentityVerifier::new(None)),
    )
}

/// Collects whatever is already queued on a registry channel.
pub fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Polls `check` until it returns true or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
