//! Community settings repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use keydrop_core::error::{AppError, ErrorKind};
use keydrop_core::result::AppResult;
use keydrop_core::types::id::{ChannelId, CommunityId};
use keydrop_entity::community::CommunitySettings;

use crate::store::SettingsStore;

/// Repository for per-community settings.
#[derive(Debug, Clone)]
pub struct CommunitySettingsRepository {
    pool: PgPool,
}

impl CommunitySettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for CommunitySettingsRepository {
    async fn find(&self, community: CommunityId) -> AppResult<Option<CommunitySettings>> {
        sqlx::query_as::<_, CommunitySettings>(
            "SELECT * FROM community_settings WHERE community_id = $1",
        )
        .bind(community)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find community settings", e)
        })
    }

    async fn set_claim_log_channel(
        &self,
        community: CommunityId,
        channel: Option<ChannelId>,
    ) -> AppResult<CommunitySettings> {
        sqlx::query_as::<_, CommunitySettings>(
            "INSERT INTO community_settings (community_id, claim_log_channel_id, updated_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT (community_id) DO UPDATE SET \
             claim_log_channel_id = EXCLUDED.claim_log_channel_id, \
             updated_at = NOW() \
             RETURNING *",
        )
        .bind(community)
        .bind(channel)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to save community settings", e)
        })
    }
}
