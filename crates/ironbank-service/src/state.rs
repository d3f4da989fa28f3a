//! Application state.

use std::sync::Arc;

use ironbank_store::RocksStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        if config.auth_jwt_secret.is_none() {
            tracing::warn!("AUTH_JWT_SECRET not configured - authenticated routes will reject");
        }

        Self { store, config }
    }
}
