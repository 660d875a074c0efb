//! Periodic refresh of every published board.

use std::sync::Arc;
use std::time::Instant;

use tracing;

use keydrop_core::result::AppResult;
use keydrop_service::view::{RefreshSummary, ViewStore};

/// Sweeps every community with a published board.
#[derive(Debug, Clone)]
pub struct ViewRefreshJob {
    views: Arc<ViewStore>,
}

impl ViewRefreshJob {
    /// Create a new view refresh job
    pub fn new(views: Arc<ViewStore>) -> Self {
        Self { views }
    }

    /// Run one sweep.
    pub async fn run(&self) -> AppResult<RefreshSummary> {
        let started = Instant::now();
        let summary = self.views.refresh_all().await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if summary.failed > 0 {
            tracing::warn!(
                communities = summary.communities,
                edited = summary.edited,
                healed = summary.healed,
                failed = summary.failed,
                elapsed_ms,
                "View refresh finished with failures"
            );
        } else {
            tracing::info!(
                communities = summary.communities,
                edited = summary.edited,
                healed = summary.healed,
                elapsed_ms,
                "View refresh finished"
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keydrop_core::types::id::{ChannelId, CommunityId};
    use keydrop_entity::view::ViewKind;
    use keydrop_service::testing::TestServices;

    #[tokio::test]
    async fn test_sweep_heals_deleted_boards() {
        let services = TestServices::new();
        let views = services.context.views.clone();

        let pointer = views
            .publish(CommunityId::new(1), ViewKind::Inventory, ChannelId::new(10), None)
            .await
            .unwrap();
        views
            .publish(CommunityId::new(2), ViewKind::Leaderboard, ChannelId::new(20), None)
            .await
            .unwrap();
        services.publisher.delete(pointer.message_id);

        let summary = ViewRefreshJob::new(views).run().await.unwrap();

        assert_eq!(summary.communities, 2);
        assert_eq!(summary.healed, 1);
        assert_eq!(summary.edited, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_sweep_without_boards_does_nothing() {
        let services = TestServices::new();
        let summary = ViewRefreshJob::new(services.context.views.clone())
            .run()
            .await
            .unwrap();
        assert_eq!(summary, RefreshSummary::default());
        assert!(services.publisher.sent().is_empty());
    }
}
