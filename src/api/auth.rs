use axum::{extract::State, Json};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::db::{ProfileRepository, UserProfile};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ExternalLoginRequest {
    pub token: String,
}

/// POST /api/auth/google
///
/// Exchanges a provider token for the linked profile, creating it on first use.
pub async fn google_login(
    State(state): State<AppState>,
    Json(req): Json<ExternalLoginRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let identity = state.verifier.verify(&req.token).await?;
    let profile = ProfileRepository::link_external(&state.db, &identity).await?;

    Ok(Json(profile))
}
