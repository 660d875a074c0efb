//! Community settings entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keydrop_core::types::id::{ChannelId, CommunityId};

/// Durable configuration scoped to one community.
///
/// Loaded for every command and passed by reference into the components
/// that need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CommunitySettings {
    /// Owning community.
    pub community_id: CommunityId,
    /// Channel receiving claim audit notifications.
    pub claim_log_channel_id: Option<ChannelId>,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl CommunitySettings {
    /// Settings for a community that has configured nothing yet.
    pub fn unconfigured(community_id: CommunityId) -> Self {
        Self {
            community_id,
            claim_log_channel_id: None,
            updated_at: Utc::now(),
        }
    }
}
