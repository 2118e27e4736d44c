use std::time::Duration;

use sqlx::{Pool, Sqlite};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::{now_millis, MessageRepository};
use crate::error::AppError;

/// Periodic purge of chat history older than the retention horizon.
#[derive(Clone)]
pub struct RetentionSweeper {
    db: Pool<Sqlite>,
    retention: chrono::Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(db: Pool<Sqlite>, retention: chrono::Duration, interval: Duration) -> Self {
        Self {
            db,
            retention,
            interval,
        }
    }

    /// Deletes every message created at or before `now - retention`.
    pub async fn run_once(&self) -> Result<u64, AppError> {
        let cutoff = now_millis() - self.retention.num_milliseconds();
        let deleted = MessageRepository::delete_older_than(&self.db, cutoff).await?;

        if deleted > 0 {
            tracing::info!("🧹 Deleted {} old messages", deleted);
        } else {
            tracing::debug!("🧹 No messages past retention");
        }

        Ok(deleted)
    }

    /// Runs `run_once` every interval until `shutdown` turns true. The first
    /// sweep happens one interval after start; failures are logged and the
    /// schedule continues.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut interval = tokio::time::interval_at(start, self.interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.run_once().await {
                            tracing::error!("❌ Message cleanup failed: {}", e);
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            tracing::info!("Retention sweeper stopped");
                            break;
                        }
                    }
                }
            }
        })
    }
}
