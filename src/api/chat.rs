use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::db::Message;
use crate::error::AppError;
use crate::realtime::delivery::{self, AckKind};

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub message_ids: Vec<i64>,
    pub status: AckKind,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub updated: Vec<i64>,
}

/// GET /api/users/:user_id/messages/:friend_id
pub async fn get_messages(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> Result<Json<MessagesResponse>, AppError> {
    let since = state.retention_cutoff();
    let messages = delivery::history(&state.db, &user_id, &friend_id, since).await?;

    Ok(Json(MessagesResponse { messages }))
}

/// POST /api/users/:user_id/messages/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let updated = delivery::acknowledge(
        &state.db,
        &state.hub.registry,
        &user_id,
        &req.message_ids,
        req.status,
    )
    .await?;

    Ok(Json(StatusUpdateResponse {
        message: "Status updated successfully".to_string(),
        updated,
    }))
}
