use std::sync::Arc;

use spill_db::Database;
use tracing::error;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
        })
    }
}

/// Runs a core operation on the blocking pool; rusqlite calls must stay off
/// the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> spill_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
