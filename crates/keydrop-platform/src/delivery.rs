//! Private delivery over a direct-message channel.

use async_trait::async_trait;
use tracing::{debug, warn};

use keydrop_core::traits::delivery::{DeliveryChannel, DeliveryError};
use keydrop_core::types::id::UserId;
use keydrop_core::types::message::OutboundMessage;

use crate::client::PlatformClient;

#[async_trait]
impl DeliveryChannel for PlatformClient {
    async fn deliver(
        &self,
        requester: UserId,
        messages: &[OutboundMessage],
    ) -> Result<(), DeliveryError> {
        let unreachable = |reason: String| DeliveryError::Unreachable { requester, reason };

        let channel = self
            .open_dm(requester)
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        for (index, message) in messages.iter().enumerate() {
            if let Err(e) = self.create_message(channel, message).await {
                warn!(
                    requester = %requester,
                    sent = index,
                    total = messages.len(),
                    error = %e,
                    "Private delivery interrupted"
                );
                return Err(unreachable(e.to_string()));
            }
        }

        debug!(requester = %requester, messages = messages.len(), "Private delivery complete");
        Ok(())
    }
}
