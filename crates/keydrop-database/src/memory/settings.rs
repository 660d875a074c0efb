//! In-memory community settings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use keydrop_core::result::AppResult;
use keydrop_core::types::id::{ChannelId, CommunityId};
use keydrop_entity::community::CommunitySettings;

use super::guard;
use crate::store::SettingsStore;

/// In-memory [`SettingsStore`].
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    settings: Arc<Mutex<HashMap<CommunityId, CommunitySettings>>>,
}

impl MemorySettingsStore {
    /// Create an empty settings table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn find(&self, community: CommunityId) -> AppResult<Option<CommunitySettings>> {
        Ok(guard(&self.settings).get(&community).cloned())
    }

    async fn set_claim_log_channel(
        &self,
        community: CommunityId,
        channel: Option<ChannelId>,
    ) -> AppResult<CommunitySettings> {
        let updated = CommunitySettings {
            community_id: community,
            claim_log_channel_id: channel,
            updated_at: Utc::now(),
        };
        guard(&self.settings).insert(community, updated.clone());
        Ok(updated)
    }
}
