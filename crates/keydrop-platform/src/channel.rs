//! Channel publishing and best-effort notifications.

use async_trait::async_trait;

use keydrop_core::result::AppResult;
use keydrop_core::traits::{ChannelPublisher, NotificationSink};
use keydrop_core::types::id::{ChannelId, MessageId};
use keydrop_core::types::message::OutboundMessage;

use crate::client::PlatformClient;

#[async_trait]
impl ChannelPublisher for PlatformClient {
    async fn send(&self, channel: ChannelId, message: &OutboundMessage) -> AppResult<MessageId> {
        self.create_message(channel, message).await
    }

    async fn exists(&self, channel: ChannelId, message: MessageId) -> AppResult<bool> {
        self.message_exists(channel, message).await
    }

    async fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &OutboundMessage,
    ) -> AppResult<()> {
        self.edit_message(channel, message, content).await
    }
}

#[async_trait]
impl NotificationSink for PlatformClient {
    async fn notify(&self, channel: ChannelId, message: &OutboundMessage) -> AppResult<()> {
        self.create_message(channel, message).await.map(|_| ())
    }
}
