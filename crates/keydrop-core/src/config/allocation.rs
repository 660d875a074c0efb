//! Allocation engine limits.

use serde::{Deserialize, Serialize};

/// Hard upper bound on records handed out by a single claim.
pub const MAX_CLAIM_QUANTITY: u32 = 50;

/// Allocation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Seconds to wait for the whole private delivery before rolling back.
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_seconds: u64,
    /// Maximum characters per delivered chunk, code fences included.
    #[serde(default = "default_chunk_limit")]
    pub chunk_char_limit: usize,
    /// Number of usernames previewed in the claim audit notification.
    #[serde(default = "default_audit_preview")]
    pub audit_preview_count: usize,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_seconds: default_delivery_timeout(),
            chunk_char_limit: default_chunk_limit(),
            audit_preview_count: default_audit_preview(),
        }
    }
}

fn default_delivery_timeout() -> u64 {
    30
}

fn default_chunk_limit() -> usize {
    1900
}

fn default_audit_preview() -> usize {
    3
}
