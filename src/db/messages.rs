use sqlx::{Pool, Sqlite};

use crate::db::models::{Message, MessageStatus, NewMessage};
use crate::db::now_millis;
use crate::error::AppError;

pub struct MessageRepository;

impl MessageRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        sender_id: &str,
        message: &NewMessage,
    ) -> Result<Message, AppError> {
        Self::create_at(pool, sender_id, message, now_millis()).await
    }

    pub async fn create_at(
        pool: &Pool<Sqlite>,
        sender_id: &str,
        message: &NewMessage,
        created_at: i64,
    ) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
INSERT INTO messages (sender_id, receiver_id, content, sticker, status, created_at)
VALUES (?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(sender_id)
        .bind(&message.receiver_id)
        .bind(&message.content)
        .bind(&message.sticker)
        .bind(MessageStatus::Sent)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(message)
    }

    /// sent → delivered. Only the receiver may advance it, and only once.
    ///
    /// Returns the updated message, or `None` when the transition did not apply
    /// (unknown id, wrong receiver, already delivered or read).
    pub async fn mark_delivered(
        pool: &Pool<Sqlite>,
        id: i64,
        receiver_id: &str,
        at: i64,
    ) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
UPDATE messages
SET status = ?, delivered_at = ?
WHERE id = ? AND receiver_id = ? AND status = ? AND delivered_at IS NULL
RETURNING *
            "#,
        )
        .bind(MessageStatus::Delivered)
        .bind(at)
        .bind(id)
        .bind(receiver_id)
        .bind(MessageStatus::Sent)
        .fetch_optional(pool)
        .await?;

        Ok(message)
    }

    /// (sent | delivered) → read, at most once.
    pub async fn mark_read(
        pool: &Pool<Sqlite>,
        id: i64,
        receiver_id: &str,
        at: i64,
    ) -> Result<Option<Message>, AppError> {
        // MAX keeps read_at >= delivered_at even if clocks disagree.
        let message = sqlx::query_as::<_, Message>(
            r#"
UPDATE messages
SET status = ?, read_at = MAX(?, COALESCE(delivered_at, ?))
WHERE id = ? AND receiver_id = ? AND read_at IS NULL
RETURNING *
            "#,
        )
        .bind(MessageStatus::Read)
        .bind(at)
        .bind(at)
        .bind(id)
        .bind(receiver_id)
        .fetch_optional(pool)
        .await?;

        Ok(message)
    }

    /// Messages exchanged by the pair since `since`, oldest first.
    pub async fn between(
        pool: &Pool<Sqlite>,
        a: &str,
        b: &str,
        since: i64,
    ) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
SELECT * FROM messages
WHERE ((sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1))
  AND created_at > ?3
ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(since)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    /// Bulk purge of everything created at or before `cutoff`.
    pub async fn delete_older_than(pool: &Pool<Sqlite>, cutoff: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE created_at <= ?")
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
