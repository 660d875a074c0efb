//! Chat platform REST client configuration.

use serde::{Deserialize, Serialize};

/// Chat platform HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform REST API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bot token sent in the `Authorization` header.
    #[serde(default)]
    pub bot_token: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// How long resolved display names stay cached, in seconds.
    #[serde(default = "default_directory_ttl")]
    pub directory_cache_ttl_seconds: u64,
    /// Maximum number of cached display names.
    #[serde(default = "default_directory_capacity")]
    pub directory_cache_capacity: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            bot_token: String::new(),
            request_timeout_seconds: default_request_timeout(),
            directory_cache_ttl_seconds: default_directory_ttl(),
            directory_cache_capacity: default_directory_capacity(),
        }
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_directory_ttl() -> u64 {
    900
}

fn default_directory_capacity() -> u64 {
    10_000
}
