//! WebSocket upgrade and per-connection event loop.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;

use crate::api::state::AppState;
use crate::error::AppError;
use crate::realtime::{ClientEvent, ServerEvent};

/// GET /ws/:user_id
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| ws_connection(socket, user_id, state))
}

async fn ws_connection(mut socket: WebSocket, user_id: String, state: AppState) {
    let hub = &state.hub;
    let mut session = hub.connect(&user_id).await;
    tracing::info!("🔌 {} connected ({} online)", user_id, hub.registry.online_count().await);

    loop {
        tokio::select! {
            // Forward pushes from the registry to the client
            event = session.next_event() => {
                let Some(event) = event else { break };
                let text = match event.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to encode event for {}: {}", user_id, e);
                        continue;
                    }
                };
                if socket.send(WsMessage::Text(text)).await.is_err() {
                    break; // client disconnected
                }
            }
            // Inbound events are handled one at a time, in arrival order
            msg = socket.recv() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Err(e) = dispatch(&state, &user_id, &text).await {
                            report(&state, &user_id, e).await;
                        }
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        if socket.send(WsMessage::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    // Stop the registry from targeting this channel before anything else.
    session.outbound.close();
    hub.disconnect(&session).await;
    tracing::info!("🔌 {} disconnected", user_id);
}

async fn dispatch(state: &AppState, user_id: &str, text: &str) -> Result<(), AppError> {
    let event = ClientEvent::parse(text)
        .map_err(|e| AppError::Validation(format!("Malformed event: {}", e)))?;
    state.hub.handle(user_id, event).await
}

/// Validation problems go back to the sender; everything else stays in the log.
async fn report(state: &AppState, user_id: &str, err: AppError) {
    match err {
        AppError::Validation(message) => {
            tracing::debug!("Rejected event from {}: {}", user_id, message);
            state
                .hub
                .registry
                .send(user_id, ServerEvent::Error { message })
                .await;
        }
        other => {
            tracing::error!("Error handling event from {}: {}", user_id, other);
        }
    }
}
