use std::time::Duration;

use crate::error::AppError;

/// Upper bound on the retention horizon, far inside what `chrono::Duration` can hold.
pub const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
    pub message_retention_days: i64,
    pub sweep_interval_secs: u64,
    pub typing_timeout_secs: u64,
    /// Whether WebRTC signalling is restricted to friends, like chat messages are.
    pub signaling_requires_friendship: bool,
    /// `None` means permissive CORS.
    pub allowed_origins: Option<Vec<String>>,
    pub google_client_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            database_url: "sqlite://friendmap.db".to_string(),
            db_max_connections: 20,
            db_min_connections: 1,
            request_timeout_secs: 30,
            message_retention_days: 7,
            sweep_interval_secs: 3600,
            typing_timeout_secs: 3,
            signaling_requires_friendship: true,
            allowed_origins: None,
            google_client_id: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Config::default();

        // PORT is what most hosting platforms inject; it wins over SERVER_PORT.
        let server_port = match std::env::var("PORT") {
            Ok(port) => parse_value("PORT", &port)?,
            Err(_) => parse_var("SERVER_PORT", defaults.server_port)?,
        };

        let config = Config {
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.db_min_connections)?,
            request_timeout_secs: parse_var(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            message_retention_days: parse_var(
                "MESSAGE_RETENTION_DAYS",
                defaults.message_retention_days,
            )?,
            sweep_interval_secs: parse_var("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs)?,
            typing_timeout_secs: parse_var("TYPING_TIMEOUT_SECS", defaults.typing_timeout_secs)?,
            signaling_requires_friendship: parse_var(
                "SIGNALING_REQUIRES_FRIENDSHIP",
                defaults.signaling_requires_friendship,
            )?,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|raw| split_origins(&raw))
                .filter(|origins| !origins.is_empty()),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID")
                .ok()
                .filter(|id| !id.trim().is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that parse but would break the background tasks.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_RETENTION_DAYS).contains(&self.message_retention_days) {
            return Err(AppError::Config(format!(
                "MESSAGE_RETENTION_DAYS must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS, self.message_retention_days
            )));
        }
        if self.sweep_interval_secs == 0 {
            return Err(AppError::Config(
                "SWEEP_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if self.typing_timeout_secs == 0 {
            return Err(AppError::Config(
                "TYPING_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        if self.db_max_connections == 0 || self.db_min_connections > self.db_max_connections {
            return Err(AppError::Config(format!(
                "DB_MIN_CONNECTIONS ({}) must not exceed DB_MAX_CONNECTIONS ({}), which must be positive",
                self.db_min_connections, self.db_max_connections
            )));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.message_retention_days)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn typing_timeout(&self) -> Duration {
        Duration::from_secs(self.typing_timeout_secs)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
