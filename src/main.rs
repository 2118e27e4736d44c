use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use friendmap::{
    api::{create_router, AppState},
    config::Config,
    db,
    error::AppError,
    identity::GoogleIdentityVerifier,
    sweeper::RetentionSweeper,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,friendmap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting friendmap relay v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded");

    let pool = db::connect(&config).await?;
    tracing::info!("✅ Database connected: {}", config.database_url);

    db::migrate(&pool).await?;
    tracing::info!("✅ Database migrations completed");

    if config.google_client_id.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set, /api/auth/google will reject all tokens");
    }
    let verifier = Arc::new(GoogleIdentityVerifier::new(config.google_client_id.clone()));

    let state = AppState::new(pool.clone(), config.clone(), verifier);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = RetentionSweeper::new(pool.clone(), config.retention(), config.sweep_interval())
        .spawn(shutdown_rx);
    tracing::info!(
        "✅ Message retention task started (every {}s, keeps {} days)",
        config.sweep_interval_secs,
        config.message_retention_days
    );

    let app = create_router(state);

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("🏥 Health check: http://{}/api/health", addr);
    tracing::info!("🔌 Realtime socket: ws://{}/ws/{{user_id}}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown requested");
        })
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::error!("Retention task ended abnormally: {}", e);
    }
    pool.close().await;

    Ok(())
}
