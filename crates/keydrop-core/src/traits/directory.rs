//! Claimant display-name lookup.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::UserId;

/// Resolves user identifiers to human-readable display names.
#[async_trait]
pub trait Directory: Send + Sync + std::fmt::Debug {
    /// Return the display name, or `None` when the user is unknown.
    async fn resolve(&self, user: UserId) -> AppResult<Option<String>>;
}
