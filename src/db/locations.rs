use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::db::models::{Location, UserProfile};
use crate::db::now_millis;
use crate::error::AppError;

/// A stored location joined with the owner's display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationView {
    pub user_id: String,
    pub username: String,
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
    pub timestamp: i64,
}

pub struct LocationRepository;

impl LocationRepository {
    /// Latest-wins write; the previous row is overwritten in place.
    pub async fn upsert(
        pool: &Pool<Sqlite>,
        user_id: &str,
        lat: f64,
        lng: f64,
        accuracy: Option<f64>,
    ) -> Result<Location, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
INSERT INTO user_locations (user_id, lat, lng, accuracy, timestamp)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT(user_id) DO UPDATE SET
    lat = excluded.lat,
    lng = excluded.lng,
    accuracy = excluded.accuracy,
    timestamp = excluded.timestamp
RETURNING lat, lng, accuracy, timestamp
            "#,
        )
        .bind(user_id)
        .bind(lat)
        .bind(lng)
        .bind(accuracy)
        .bind(now_millis())
        .fetch_one(pool)
        .await?;

        Ok(location)
    }

    pub async fn get(pool: &Pool<Sqlite>, user_id: &str) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT lat, lng, accuracy, timestamp FROM user_locations WHERE user_id = ?"
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(location)
    }

    /// Locations of `user_ids` that have one, with display names joined in.
    pub async fn views_for(
        pool: &Pool<Sqlite>,
        user_ids: &[String],
    ) -> Result<Vec<LocationView>, AppError> {
        let mut views = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if let Some(view) = Self::view(pool, user_id).await? {
                views.push(view);
            }
        }
        Ok(views)
    }

    pub async fn view(pool: &Pool<Sqlite>, user_id: &str) -> Result<Option<LocationView>, AppError> {
        let row = sqlx::query_as::<_, (Option<String>, f64, f64, Option<f64>, i64)>(
            r#"
SELECT p.username, l.lat, l.lng, l.accuracy, l.timestamp
FROM user_locations l
LEFT JOIN user_profiles p ON p.user_id = l.user_id
WHERE l.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(username, lat, lng, accuracy, timestamp)| LocationView {
            user_id: user_id.to_string(),
            username: username.unwrap_or_else(|| UserProfile::default_username(user_id)),
            lat,
            lng,
            accuracy,
            timestamp,
        }))
    }
}
