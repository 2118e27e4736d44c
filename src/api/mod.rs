pub mod auth;
pub mod chat;
pub mod friends;
pub mod profiles;
pub mod state;
pub mod ws;

pub use state::AppState;

use axum::{
    extract::State,
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
    timeout::TimeoutLayer,
};
use std::time::Duration;
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    database: String,
}

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(state.config.allowed_origins.as_deref());

    let api = Router::new()
        // Health check
        .route("/api/health", get(health))

        // External identity exchange
        .route("/api/auth/google", post(auth::google_login))

        // Profiles
        .route("/api/users/search", get(profiles::search_users))
        .route(
            "/api/users/:user_id/profile",
            get(profiles::get_profile).post(profiles::upsert_profile),
        )

        // Friends and their presence
        .route(
            "/api/users/:user_id/friends",
            get(friends::list_friends).post(friends::add_friend),
        )
        .route("/api/users/:user_id/friends/:friend_id", delete(friends::remove_friend))
        .route("/api/users/:user_id/locations", get(friends::friend_locations))

        // Chat history and delivery acks
        .route("/api/users/:user_id/messages/status", post(chat::update_status))
        .route("/api/users/:user_id/messages/:friend_id", get(chat::get_messages))

        // Add request timeout
        .layer(TimeoutLayer::new(timeout));

    // The socket route stays outside the timeout, it lives as long as the client.
    Router::new()
        .route("/ws/:user_id", get(ws::ws_handler))
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}

async fn health(State(state): State<AppState>) -> axum::Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "disconnected"
        }
    };

    axum::Json(HealthResponse {
        status: if database == "connected" { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}
