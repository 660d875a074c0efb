//! View pointer entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keydrop_core::types::id::{ChannelId, CommunityId, MessageId};

use super::kind::ViewKind;

/// The single message currently rendering a community's board.
///
/// At most one pointer exists per `(community_id, view_kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ViewPointer {
    /// Owning community.
    pub community_id: CommunityId,
    /// Which board.
    pub view_kind: ViewKind,
    /// Channel holding the message.
    pub channel_id: ChannelId,
    /// The tracked message.
    pub message_id: MessageId,
    /// Last publish or self-heal.
    pub updated_at: DateTime<Utc>,
}
