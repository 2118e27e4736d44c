use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot add yourself as a friend")]
    SelfFriendship,

    #[error("Friendship already exists")]
    AlreadyFriends,

    #[error("Users are not friends")]
    NotFriends,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration failed: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Internal(format!("Identity provider unreachable: {}", err))
    }
}

// Axum IntoResponse implementation for HTTP errors
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::Validation(_) | AppError::SelfFriendship | AppError::AlreadyFriends => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFriends => StatusCode::FORBIDDEN,
            AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            AppError::Validation(msg)
            | AppError::InvalidToken(msg)
            | AppError::Config(msg)
            | AppError::Internal(msg) => msg,
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
