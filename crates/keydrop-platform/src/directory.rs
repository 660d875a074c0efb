//! Cached display-name directory.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use keydrop_core::config::PlatformConfig;
use keydrop_core::result::AppResult;
use keydrop_core::traits::Directory;
use keydrop_core::types::id::UserId;

use crate::client::PlatformClient;

/// [`Directory`] backed by the platform user endpoint.
///
/// Only successful lookups are cached; misses and failures go back to the
/// platform next time.
#[derive(Debug, Clone)]
pub struct CachedDirectory {
    client: PlatformClient,
    cache: Cache<UserId, String>,
}

impl CachedDirectory {
    /// Create a directory using `client` and the cache limits in `config`.
    pub fn new(client: PlatformClient, config: &PlatformConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.directory_cache_capacity)
            .time_to_live(Duration::from_secs(config.directory_cache_ttl_seconds))
            .build();
        Self { client, cache }
    }
}

#[async_trait]
impl Directory for CachedDirectory {
    async fn resolve(&self, user: UserId) -> AppResult<Option<String>> {
        if let Some(name) = self.cache.get(&user).await {
            return Ok(Some(name));
        }

        let Some(found) = self.client.fetch_user(user).await? else {
            debug!(user = %user, "User not found in directory");
            return Ok(None);
        };

        let name = found.display_name();
        self.cache.insert(user, name.clone()).await;
        Ok(Some(name))
    }
}
