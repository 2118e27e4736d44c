use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::db::locations::LocationView;
use crate::db::{FriendRepository, Location, LocationRepository, ProfileRepository, UserProfile};
use crate::error::AppError;
use crate::realtime::presence;

#[derive(Debug, Deserialize)]
pub struct AddFriendRequest {
    pub friend_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct AddFriendResponse {
    pub message: String,
    pub friends: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FriendEntry {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<FriendEntry>,
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<LocationView>,
}

/// GET /api/users/:user_id/friends
pub async fn list_friends(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FriendsResponse>, AppError> {
    let friend_ids = FriendRepository::list(&state.db, &user_id).await?;

    let mut friends = Vec::with_capacity(friend_ids.len());
    for friend_id in friend_ids {
        friends.push(FriendEntry {
            profile: ProfileRepository::get_or_placeholder(&state.db, &friend_id).await?,
            location: LocationRepository::get(&state.db, &friend_id).await?,
        });
    }

    Ok(Json(FriendsResponse { friends }))
}

/// POST /api/users/:user_id/friends
pub async fn add_friend(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<AddFriendRequest>,
) -> Result<Json<AddFriendResponse>, AppError> {
    FriendRepository::add_friendship(&state.db, &user_id, &req.friend_user_id).await?;
    let friends = FriendRepository::list(&state.db, &user_id).await?;

    Ok(Json(AddFriendResponse {
        message: "Friend added successfully".to_string(),
        friends,
    }))
}

/// DELETE /api/users/:user_id/friends/:friend_id
pub async fn remove_friend(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    FriendRepository::remove_friendship(&state.db, &user_id, &friend_id).await?;
    Ok(Json(serde_json::json!({"message": "Friend removed successfully"})))
}

/// GET /api/users/:user_id/locations
pub async fn friend_locations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<LocationsResponse>, AppError> {
    let locations = presence::snapshot(&state.db, &user_id).await?;
    Ok(Json(LocationsResponse { locations }))
}
