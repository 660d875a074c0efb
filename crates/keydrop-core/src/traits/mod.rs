//! Outbound collaborator traits defined in `keydrop-core` and implemented
//! by the platform adapter (and by in-memory fakes in tests).

pub mod delivery;
pub mod directory;
pub mod notifier;
pub mod publisher;

pub use delivery::{DeliveryChannel, DeliveryError};
pub use directory::Directory;
pub use notifier::NotificationSink;
pub use publisher::ChannelPublisher;
