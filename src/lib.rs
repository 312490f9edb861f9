pub mod config;
pub mod rest;
pub mod store;

use std::sync::Arc;

use config::ServerConfig;
use store::TaskStore;

/// Shared application state passed to every route handler.
///
/// The store is constructed once at startup and injected here — handlers
/// never reach for process-global connection state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub store: Arc<TaskStore>,
    pub started_at: std::time::Instant,
}
