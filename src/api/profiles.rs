use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::db::profiles::{ProfileUpdate, SearchResult};
use crate::db::{ProfileRepository, UserProfile};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub current_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub users: Vec<SearchResult>,
}

/// GET /api/users/:user_id/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = ProfileRepository::get_or_placeholder(&state.db, &user_id).await?;
    Ok(Json(profile))
}

/// POST /api/users/:user_id/profile
pub async fn upsert_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = ProfileRepository::upsert(&state.db, &user_id, update).await?;
    Ok(Json(profile))
}

/// GET /api/users/search?query=..&current_user_id=..
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let users = ProfileRepository::search(&state.db, &query.query, &query.current_user_id).await?;
    Ok(Json(SearchResponse { users }))
}
