//! Community settings service.

use std::sync::Arc;

use tracing::info;

use keydrop_core::result::AppResult;
use keydrop_core::types::id::{ChannelId, CommunityId};
use keydrop_database::store::SettingsStore;
use keydrop_entity::community::CommunitySettings;

/// Loads and updates community settings. The only writer of the settings
/// table.
#[derive(Debug, Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
}

impl SettingsService {
    /// Creates a new settings service.
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Settings for `community`, or an unconfigured default.
    pub async fn load(&self, community: CommunityId) -> AppResult<CommunitySettings> {
        Ok(self
            .store
            .find(community)
            .await?
            .unwrap_or_else(|| CommunitySettings::unconfigured(community)))
    }

    /// Route claim audit notifications to `channel`, or stop them with `None`.
    pub async fn set_claim_log_channel(
        &self,
        community: CommunityId,
        channel: Option<ChannelId>,
    ) -> AppResult<CommunitySettings> {
        let settings = self.store.set_claim_log_channel(community, channel).await?;
        info!(community = %community, channel = ?channel.map(|c| c.get()), "Claim log channel updated");
        Ok(settings)
    }
}
