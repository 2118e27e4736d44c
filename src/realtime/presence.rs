//! Friend-scoped location fan-out.

use sqlx::{Pool, Sqlite};

use crate::db::locations::LocationView;
use crate::db::{FriendRepository, LocationRepository};
use crate::error::AppError;
use crate::realtime::events::ServerEvent;
use crate::realtime::registry::ConnectionRegistry;

/// Validated WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64, accuracy: Option<f64>) -> Result<Self, AppError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::Validation(
                "Invalid latitude: must be between -90 and 90".to_string(),
            ));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::Validation(
                "Invalid longitude: must be between -180 and 180".to_string(),
            ));
        }
        if let Some(accuracy) = accuracy {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(AppError::Validation(
                    "Invalid accuracy: must be a non-negative number of meters".to_string(),
                ));
            }
        }

        Ok(Self { lat, lng, accuracy })
    }
}

/// The user plus everyone they are friends with: the audience for their location.
async fn audience(pool: &Pool<Sqlite>, user_id: &str) -> Result<Vec<String>, AppError> {
    let mut audience = FriendRepository::list(pool, user_id).await?;
    audience.push(user_id.to_string());
    Ok(audience)
}

/// Persists `coords` for `user_id` and pushes the update to the user and their
/// online friends. Nothing is pushed if the write fails.
///
/// Returns the broadcast location and the number of connections it reached.
pub async fn broadcast_location(
    pool: &Pool<Sqlite>,
    registry: &ConnectionRegistry,
    user_id: &str,
    coords: Coordinates,
) -> Result<(LocationView, usize), AppError> {
    LocationRepository::upsert(pool, user_id, coords.lat, coords.lng, coords.accuracy).await?;

    let view = LocationRepository::view(pool, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Location missing after write".to_string()))?;

    let recipients = audience(pool, user_id).await?;
    let event = ServerEvent::LocationUpdate {
        user_id: user_id.to_string(),
        location: view.clone(),
    };
    let reached = registry.send_many(&recipients, &event).await;

    tracing::debug!(
        "Location update from {} reached {} of {} candidates",
        user_id,
        reached,
        recipients.len()
    );

    Ok((view, reached))
}

/// Last-known locations of the user and their friends, for the connect handshake.
pub async fn snapshot(pool: &Pool<Sqlite>, user_id: &str) -> Result<Vec<LocationView>, AppError> {
    let audience = audience(pool, user_id).await?;
    LocationRepository::views_for(pool, &audience).await
}
