//! Shared application state handed to every handler.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::activity::ActivityLog;
use crate::auth::{JwtSessions, SessionResolver};
use crate::config::AppConfig;
use crate::db::Store;
use crate::storage::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub uploads: UploadStore,
    pub activity: ActivityLog,
    pub tokens: JwtSessions,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: SqlitePool) -> Self {
        let tokens = JwtSessions::new(config.jwt_secret.clone(), config.session_ttl_hours);
        Self {
            store: Store::new(pool.clone(), config.io_timeout),
            uploads: UploadStore::new(
                config.upload_dir.clone(),
                config.max_upload_bytes,
                config.io_timeout,
            ),
            activity: ActivityLog::new(pool, config.io_timeout),
            sessions: Arc::new(tokens.clone()),
            tokens,
            config: Arc::new(config),
        }
    }

    /// Swap the session resolver, e.g. for a stub in tests.
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionResolver>) -> Self {
        self.sessions = sessions;
        self
    }
}
