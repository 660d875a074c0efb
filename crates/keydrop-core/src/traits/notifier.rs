//! Best-effort channel notifications.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::ChannelId;
use crate::types::message::OutboundMessage;

/// Posts advisory messages (claim audit entries) to a channel.
///
/// Callers treat every error as advisory: it is logged and dropped, never
/// surfaced to whoever triggered the notification.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    /// Post `message` to `channel`.
    async fn notify(&self, channel: ChannelId, message: &OutboundMessage) -> AppResult<()>;
}
