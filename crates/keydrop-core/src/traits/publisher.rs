//! Channel message publishing used by the persistent view store.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::{ChannelId, MessageId};
use crate::types::message::OutboundMessage;

/// Sends, looks up, and edits messages in a channel.
#[async_trait]
pub trait ChannelPublisher: Send + Sync + std::fmt::Debug {
    /// Post a new message and return its identifier.
    async fn send(&self, channel: ChannelId, message: &OutboundMessage) -> AppResult<MessageId>;

    /// Check whether a previously posted message still exists.
    ///
    /// `Ok(false)` means the platform reports it gone; `Err` means the
    /// lookup itself failed.
    async fn exists(&self, channel: ChannelId, message: MessageId) -> AppResult<bool>;

    /// Replace the content of an existing message.
    ///
    /// A message that no longer exists is reported as `ErrorKind::NotFound`.
    async fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &OutboundMessage,
    ) -> AppResult<()>;
}
