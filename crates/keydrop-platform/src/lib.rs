//! # keydrop-platform
//!
//! REST adapter for the chat platform. [`PlatformClient`] implements the
//! delivery, publishing and notification traits from `keydrop-core`;
//! [`CachedDirectory`] resolves display names through the same client
//! behind a `moka` cache.

pub mod channel;
pub mod client;
pub mod delivery;
pub mod directory;
pub mod payload;

pub use client::PlatformClient;
pub use directory::CachedDirectory;
