//! View pointer repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use keydrop_core::error::{AppError, ErrorKind};
use keydrop_core::result::AppResult;
use keydrop_core::types::id::{ChannelId, CommunityId, MessageId};
use keydrop_entity::view::{ViewKind, ViewPointer};

use crate::store::ViewPointerStore;

/// Repository for published board pointers.
#[derive(Debug, Clone)]
pub struct ViewPointerRepository {
    pool: PgPool,
}

impl ViewPointerRepository {
    /// Create a new view pointer repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ViewPointerStore for ViewPointerRepository {
    async fn find(
        &self,
        community: CommunityId,
        kind: ViewKind,
    ) -> AppResult<Option<ViewPointer>> {
        sqlx::query_as::<_, ViewPointer>(
            "SELECT * FROM view_pointers WHERE community_id = $1 AND view_kind = $2",
        )
        .bind(community)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find view pointer", e))
    }

    async fn upsert(
        &self,
        community: CommunityId,
        kind: ViewKind,
        channel: ChannelId,
        message: MessageId,
    ) -> AppResult<ViewPointer> {
        sqlx::query_as::<_, ViewPointer>(
            "INSERT INTO view_pointers (community_id, view_kind, channel_id, message_id, updated_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (community_id, view_kind) DO UPDATE SET \
             channel_id = EXCLUDED.channel_id, \
             message_id = EXCLUDED.message_id, \
             updated_at = NOW() \
             RETURNING *",
        )
        .bind(community)
        .bind(kind)
        .bind(channel)
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert view pointer", e))
    }

    async fn communities(&self) -> AppResult<Vec<CommunityId>> {
        sqlx::query_scalar::<_, CommunityId>(
            "SELECT DISTINCT community_id FROM view_pointers ORDER BY community_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list view communities", e)
        })
    }
}
