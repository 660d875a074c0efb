//! Shared services handed to every command handler.

use std::sync::Arc;

use crate::allocation::AllocationEngine;
use crate::settings::SettingsService;
use crate::view::ViewStore;

/// What a handler can reach.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// The allocation engine.
    pub engine: Arc<AllocationEngine>,
    /// The persistent view store.
    pub views: Arc<ViewStore>,
    /// Community settings.
    pub settings: Arc<SettingsService>,
}

impl HandlerContext {
    /// Bundle the services.
    pub fn new(
        engine: Arc<AllocationEngine>,
        views: Arc<ViewStore>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            engine,
            views,
            settings,
        }
    }
}
