use std::sync::Arc;
use sqlx::{Pool, Sqlite};
use crate::config::Config;
use crate::identity::IdentityVerifier;
use crate::realtime::Hub;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub hub: Hub,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: Arc<Config>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            hub: Hub::new(db.clone(), &config),
            db,
            verifier,
            config,
        }
    }

    /// Start of the window visible to history queries.
    pub fn retention_cutoff(&self) -> i64 {
        crate::db::now_millis() - self.config.retention().num_milliseconds()
    }
}
