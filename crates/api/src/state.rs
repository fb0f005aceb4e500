use std::sync::Arc;

use civic_db::{AuthStore, PermissionResolver};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (PostgreSQL or in-memory).
    pub store: Arc<dyn AuthStore>,
    /// Policy evaluation over `store`.
    pub resolver: PermissionResolver,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn AuthStore>, config: ServerConfig) -> Self {
        Self {
            resolver: PermissionResolver::new(Arc::clone(&store)),
            store,
            config: Arc::new(config),
        }
    }
}
