use std::collections::HashSet;

use sqlx::{Pool, Sqlite};

use crate::db::now_millis;
use crate::error::AppError;

/// Relationship index over the `friends` table.
///
/// A friendship is stored as two directed rows (A→B and B→A). Both rows are
/// written and removed inside one transaction, so any single-sided lookup is
/// authoritative for the pair.
pub struct FriendRepository;

impl FriendRepository {
    pub async fn are_friends(pool: &Pool<Sqlite>, a: &str, b: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM friends WHERE user_id = ? AND friend_id = ?")
                .bind(a)
                .bind(b)
                .fetch_optional(pool)
                .await?;

        Ok(row.is_some())
    }

    pub async fn friends_of(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<HashSet<String>, AppError> {
        Ok(Self::list(pool, user_id).await?.into_iter().collect())
    }

    /// Friend ids in the order the friendships were created.
    pub async fn list(pool: &Pool<Sqlite>, user_id: &str) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT friend_id FROM friends WHERE user_id = ? ORDER BY id ASC")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn add_friendship(pool: &Pool<Sqlite>, a: &str, b: &str) -> Result<(), AppError> {
        if a == b {
            return Err(AppError::SelfFriendship);
        }
        if a.trim().is_empty() || b.trim().is_empty() {
            return Err(AppError::Validation("user ids must not be empty".to_string()));
        }

        let mut tx = pool.begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as(
            r#"
SELECT id FROM friends
WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)
LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Err(AppError::AlreadyFriends);
        }

        let now = now_millis();
        for (user_id, friend_id) in [(a, b), (b, a)] {
            sqlx::query("INSERT INTO friends (user_id, friend_id, created_at) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(friend_id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(map_unique_violation)?;
        }

        tx.commit().await?;

        tracing::debug!("Friendship created between {} and {}", a, b);
        Ok(())
    }

    /// Removes both directed rows; absent friendships are not an error.
    pub async fn remove_friendship(pool: &Pool<Sqlite>, a: &str, b: &str) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            r#"
DELETE FROM friends
WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if result.rows_affected() > 0 {
            tracing::debug!("Friendship removed between {} and {}", a, b);
        }
        Ok(())
    }
}

// A concurrent add of the same pair loses the race at the UNIQUE index.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::AlreadyFriends,
        _ => AppError::Database(err),
    }
}
