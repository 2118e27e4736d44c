pub mod models;
pub mod profiles;
pub mod friends;
pub mod locations;
pub mod messages;

pub use models::{Location, Message, MessageStatus, NewMessage, UserProfile};
pub use profiles::ProfileRepository;
pub use friends::FriendRepository;
pub use locations::LocationRepository;
pub use messages::MessageRepository;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::error::AppError;

/// Current time as Unix epoch milliseconds, the unit every table stores.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub async fn connect(config: &Config) -> Result<Pool<Sqlite>, AppError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
