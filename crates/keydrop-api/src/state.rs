//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use keydrop_core::config::AppConfig;
use keydrop_database::DatabasePool;
use keydrop_service::dispatch::CommandDispatcher;
use keydrop_service::view::ViewStore;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL pool, absent when running on in-memory stores
    pub database: Option<DatabasePool>,
    /// Command dispatcher
    pub dispatcher: Arc<CommandDispatcher>,
    /// View store, also the source of snapshots
    pub views: Arc<ViewStore>,
}

impl AppState {
    /// Bundle the shared dependencies.
    pub fn new(
        config: Arc<AppConfig>,
        database: Option<DatabasePool>,
        dispatcher: Arc<CommandDispatcher>,
        views: Arc<ViewStore>,
    ) -> Self {
        Self {
            config,
            database,
            dispatcher,
            views,
        }
    }
}
