//! Private, ordered delivery to a single requester.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::id::UserId;
use crate::types::message::OutboundMessage;

/// Why a private delivery did not complete.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// The requester cannot be reached (closed DMs, unknown user, network).
    #[error("requester {requester} is unreachable: {reason}")]
    Unreachable {
        /// The intended recipient.
        requester: UserId,
        /// Platform-provided reason.
        reason: String,
    },
    /// The platform refused the payload.
    #[error("delivery payload rejected: {0}")]
    Rejected(String),
}

/// Delivers an ordered sequence of messages to one requester.
///
/// Implementations send the messages strictly in order and stop at the
/// first failure. A partial delivery is still a failure.
#[async_trait]
pub trait DeliveryChannel: Send + Sync + std::fmt::Debug {
    /// Send `messages` to `requester`, in order.
    async fn deliver(
        &self,
        requester: UserId,
        messages: &[OutboundMessage],
    ) -> Result<(), DeliveryError>;
}
