//! Shared value types used across Keydrop crates.

pub mod id;
pub mod message;

pub use id::{ChannelId, CommunityId, MessageId, UserId};
pub use message::{Embed, EmbedField, OutboundMessage};
