//! The persistent view store.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use keydrop_core::config::ViewsConfig;
use keydrop_core::error::{AppError, ErrorKind};
use keydrop_core::result::AppResult;
use keydrop_core::traits::ChannelPublisher;
use keydrop_core::types::id::{ChannelId, CommunityId};
use keydrop_core::types::message::OutboundMessage;
use keydrop_database::store::ViewPointerStore;
use keydrop_entity::view::{ViewKind, ViewPointer};

use super::render::{self, Broadcast};
use crate::inventory::InventoryAggregator;
use crate::leaderboard::LeaderboardAggregator;

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// No board has been published for this community and kind.
    NotConfigured,
    /// The tracked message was edited in place.
    Edited,
    /// The tracked message was gone or uneditable; a new one was posted
    /// and the pointer moved to it.
    Healed,
}

/// Tally of a multi-board refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Communities visited.
    pub communities: usize,
    pub edited: usize,
    pub healed: usize,
    pub not_configured: usize,
    /// Boards whose refresh failed and was skipped.
    pub failed: usize,
}

impl RefreshSummary {
    fn record(&mut self, result: &AppResult<RefreshOutcome>) {
        match result {
            Ok(RefreshOutcome::Edited) => self.edited += 1,
            Ok(RefreshOutcome::Healed) => self.healed += 1,
            Ok(RefreshOutcome::NotConfigured) => self.not_configured += 1,
            Err(_) => self.failed += 1,
        }
    }

    fn merge(&mut self, other: RefreshSummary) {
        self.communities += other.communities;
        self.edited += other.edited;
        self.healed += other.healed;
        self.not_configured += other.not_configured;
        self.failed += other.failed;
    }
}

/// Keeps at most one live message per (community, board).
///
/// Every refresh re-reads the pointer table; nothing is cached in process.
#[derive(Debug)]
pub struct ViewStore {
    pointers: Arc<dyn ViewPointerStore>,
    publisher: Arc<dyn ChannelPublisher>,
    inventory: InventoryAggregator,
    leaderboard: LeaderboardAggregator,
    config: ViewsConfig,
}

impl ViewStore {
    /// Creates a new view store.
    pub fn new(
        pointers: Arc<dyn ViewPointerStore>,
        publisher: Arc<dyn ChannelPublisher>,
        inventory: InventoryAggregator,
        leaderboard: LeaderboardAggregator,
        config: ViewsConfig,
    ) -> Self {
        Self {
            pointers,
            publisher,
            inventory,
            leaderboard,
            config,
        }
    }

    /// The inventory aggregator backing the inventory board.
    pub fn inventory(&self) -> &InventoryAggregator {
        &self.inventory
    }

    /// The leaderboard aggregator backing the leaderboard board.
    pub fn leaderboard(&self) -> &LeaderboardAggregator {
        &self.leaderboard
    }

    /// Default restock announcement text.
    pub fn restock_text(&self) -> &str {
        &self.config.restock_text
    }

    /// Render the current content of a board.
    pub async fn render(&self, kind: ViewKind) -> AppResult<OutboundMessage> {
        let color = self.config.board_color;
        match kind {
            ViewKind::Inventory => Ok(render::inventory_board(
                &self.inventory.snapshot().await?,
                color,
            )),
            ViewKind::Leaderboard => Ok(render::leaderboard_board(
                &self.leaderboard.snapshot().await?,
                color,
            )),
        }
    }

    /// Post a fresh board in `channel` and point the community at it.
    ///
    /// Any previously tracked message is left in place but no longer
    /// updated.
    pub async fn publish(
        &self,
        community: CommunityId,
        kind: ViewKind,
        channel: ChannelId,
        broadcast: Option<&Broadcast>,
    ) -> AppResult<ViewPointer> {
        let message = self.render(kind).await?;
        let message_id = self.publisher.send(channel, &message).await?;
        let pointer = self
            .pointers
            .upsert(community, kind, channel, message_id)
            .await?;

        info!(
            community = %community,
            view = %kind,
            channel = %channel,
            message = %message_id,
            "Board published"
        );

        self.broadcast(channel, broadcast).await;
        Ok(pointer)
    }

    /// Bring a published board up to date.
    ///
    /// Edits the tracked message in place. If the message is gone, a new one
    /// is posted to the same channel and the pointer is moved to it. Any
    /// other failure is returned and the pointer is left alone, so a
    /// transient platform error never leaves a second board behind.
    pub async fn refresh(
        &self,
        community: CommunityId,
        kind: ViewKind,
        broadcast: Option<&Broadcast>,
    ) -> AppResult<RefreshOutcome> {
        let Some(pointer) = self.pointers.find(community, kind).await? else {
            debug!(community = %community, view = %kind, "Board not configured");
            return Ok(RefreshOutcome::NotConfigured);
        };

        let message = self.render(kind).await?;

        let outcome = match self.edit_in_place(&pointer, &message).await {
            Ok(()) => RefreshOutcome::Edited,
            Err(e) if e.kind != ErrorKind::NotFound => return Err(e),
            Err(e) => {
                info!(
                    community = %community,
                    view = %kind,
                    message = %pointer.message_id,
                    reason = %e,
                    "Board message gone, republishing"
                );
                let message_id = self.publisher.send(pointer.channel_id, &message).await?;
                self.pointers
                    .upsert(community, kind, pointer.channel_id, message_id)
                    .await?;
                RefreshOutcome::Healed
            }
        };

        self.broadcast(pointer.channel_id, broadcast).await;
        Ok(outcome)
    }

    async fn edit_in_place(&self, pointer: &ViewPointer, message: &OutboundMessage) -> AppResult<()> {
        if !self
            .publisher
            .exists(pointer.channel_id, pointer.message_id)
            .await?
        {
            return Err(AppError::not_found("Tracked board message no longer exists"));
        }
        self.publisher
            .edit(pointer.channel_id, pointer.message_id, message)
            .await
    }

    async fn broadcast(&self, channel: ChannelId, broadcast: Option<&Broadcast>) {
        let Some(broadcast) = broadcast else {
            return;
        };
        if let Err(e) = self.publisher.send(channel, &broadcast.message()).await {
            warn!(channel = %channel, error = %e, "Broadcast dropped");
        }
    }

    /// Refresh both boards of a community. A failing board is logged and
    /// does not stop the other.
    pub async fn refresh_community(&self, community: CommunityId) -> RefreshSummary {
        let mut summary = RefreshSummary {
            communities: 1,
            ..RefreshSummary::default()
        };
        for kind in ViewKind::ALL {
            let result = self.refresh(community, kind, None).await;
            if let Err(e) = &result {
                warn!(community = %community, view = %kind, error = %e, "Board refresh failed");
            }
            summary.record(&result);
        }
        summary
    }

    /// Refresh every community that has published a board.
    ///
    /// Fails only if the community list itself cannot be read.
    pub async fn refresh_all(&self) -> AppResult<RefreshSummary> {
        let communities = self.pointers.communities().await?;
        let mut summary = RefreshSummary::default();
        for community in communities {
            summary.merge(self.refresh_community(community).await);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use keydrop_core::types::id::{MessageId, UserId};
    use keydrop_database::memory::{MemoryRecordStore, MemoryViewPointerStore};
    use keydrop_database::store::{ClaimTransaction, RecordStore};
    use keydrop_entity::record::RecordKind;
    use keydrop_entity::record::model::NewRecord;

    use crate::testing::{RecordingPublisher, StaticDirectory};

    const COMMUNITY: CommunityId = CommunityId::new(7);
    const CHANNEL: ChannelId = ChannelId::new(70);

    struct Harness {
        records: MemoryRecordStore,
        pointers: MemoryViewPointerStore,
        publisher: Arc<RecordingPublisher>,
        views: ViewStore,
    }

    async fn harness() -> Harness {
        let records = MemoryRecordStore::new();
        records
            .seed(&[
                NewRecord::login(RecordKind::Steam, "s1", "p"),
                NewRecord::login(RecordKind::Steam, "s2", "p"),
            ])
            .await
            .unwrap();
        let pointers = MemoryViewPointerStore::new();
        let publisher = Arc::new(RecordingPublisher::new());
        let store: Arc<dyn RecordStore> = Arc::new(records.clone());
        let views = ViewStore::new(
            Arc::new(pointers.clone()),
            publisher.clone(),
            InventoryAggregator::new(store.clone()),
            LeaderboardAggregator::new(store, Arc::new(StaticDirectory::new()), 10),
            ViewsConfig::default(),
        );
        Harness {
            records,
            pointers,
            publisher,
            views,
        }
    }

    async fn claim_one(records: &MemoryRecordStore) {
        let mut tx = records.begin_claim().await.unwrap();
        let rows = tx.lock_unused(RecordKind::Steam, 1).await.unwrap();
        tx.mark_claimed(&[rows[0].id], UserId::new(1), Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_without_pointer_is_noop() {
        let h = harness().await;
        let outcome = h.views.refresh(COMMUNITY, ViewKind::Inventory, None).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::NotConfigured);
        assert!(h.publisher.sent().is_empty());
        assert!(h.pointers.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let h = harness().await;
        let pointer = h
            .views
            .publish(COMMUNITY, ViewKind::Inventory, CHANNEL, None)
            .await
            .unwrap();
        let published = h.publisher.content(pointer.message_id).unwrap();

        for _ in 0..2 {
            let outcome = h.views.refresh(COMMUNITY, ViewKind::Inventory, None).await.unwrap();
            assert_eq!(outcome, RefreshOutcome::Edited);
        }

        assert_eq!(h.publisher.sent().len(), 1);
        assert_eq!(h.publisher.content(pointer.message_id).unwrap(), published);
        let current = h.pointers.find(COMMUNITY, ViewKind::Inventory).await.unwrap().unwrap();
        assert_eq!(current.message_id, pointer.message_id);
    }

    #[tokio::test]
    async fn test_refresh_reflects_claims() {
        let h = harness().await;
        let pointer = h
            .views
            .publish(COMMUNITY, ViewKind::Inventory, CHANNEL, None)
            .await
            .unwrap();

        claim_one(&h.records).await;
        h.views.refresh(COMMUNITY, ViewKind::Inventory, None).await.unwrap();

        let board = h.publisher.content(pointer.message_id).unwrap();
        assert_eq!(board.embeds[0].fields[0].value, "1");
    }

    #[tokio::test]
    async fn test_deleted_message_self_heals() {
        let h = harness().await;
        let original = h
            .views
            .publish(COMMUNITY, ViewKind::Inventory, CHANNEL, None)
            .await
            .unwrap();
        h.publisher.delete(original.message_id);

        let outcome = h.views.refresh(COMMUNITY, ViewKind::Inventory, None).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Healed);

        let healed = h.pointers.find(COMMUNITY, ViewKind::Inventory).await.unwrap().unwrap();
        assert_ne!(healed.message_id, original.message_id);
        assert_eq!(healed.channel_id, CHANNEL);
        assert!(h.publisher.content(healed.message_id).is_some());
        assert_eq!(h.pointers.len(), 1);

        let sent = h.publisher.sent().len();
        let outcome = h.views.refresh(COMMUNITY, ViewKind::Inventory, None).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Edited);
        assert_eq!(h.publisher.sent().len(), sent);
        let current = h.pointers.find(COMMUNITY, ViewKind::Inventory).await.unwrap().unwrap();
        assert_eq!(current.message_id, healed.message_id);
    }

    #[tokio::test]
    async fn test_transient_edit_failure_keeps_the_board() {
        let h = harness().await;
        let pointer = h
            .views
            .publish(COMMUNITY, ViewKind::Leaderboard, CHANNEL, None)
            .await
            .unwrap();
        h.publisher.set_failing_edits(true);

        let err = h
            .views
            .refresh(COMMUNITY, ViewKind::Leaderboard, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert_eq!(h.publisher.sent().len(), 1);
        let current = h.pointers.find(COMMUNITY, ViewKind::Leaderboard).await.unwrap().unwrap();
        assert_eq!(current.message_id, pointer.message_id);

        h.publisher.set_failing_edits(false);
        let outcome = h.views.refresh(COMMUNITY, ViewKind::Leaderboard, None).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Edited);
    }

    #[tokio::test]
    async fn test_broadcast_follows_refresh_and_failure_is_swallowed() {
        let h = harness().await;
        h.views
            .publish(COMMUNITY, ViewKind::Inventory, CHANNEL, None)
            .await
            .unwrap();

        let broadcast = Broadcast::restock("Restock is live!", Some("steam"), None);
        h.views
            .refresh(COMMUNITY, ViewKind::Inventory, Some(&broadcast))
            .await
            .unwrap();

        let sent = h.publisher.sent();
        let last = &sent.last().unwrap().2;
        assert_eq!(last.content.as_deref(), Some("@everyone Restock is live! **Steam**"));
        assert!(last.mention_everyone);

        // The broadcast is never tracked.
        let pointer = h.pointers.find(COMMUNITY, ViewKind::Inventory).await.unwrap().unwrap();
        assert_ne!(pointer.message_id, sent.last().unwrap().1);

        h.publisher.set_failing_sends(true);
        let outcome = h
            .views
            .refresh(COMMUNITY, ViewKind::Inventory, Some(&broadcast))
            .await
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Edited);
    }

    #[tokio::test]
    async fn test_refresh_all_isolates_failures() {
        let h = harness().await;
        h.views
            .publish(COMMUNITY, ViewKind::Inventory, CHANNEL, None)
            .await
            .unwrap();
        h.pointers
            .upsert(
                CommunityId::new(8),
                ViewKind::Inventory,
                ChannelId::new(80),
                MessageId::new(1),
            )
            .await
            .unwrap();

        // Community 8's message does not exist and cannot be recreated.
        h.publisher.set_failing_sends(true);
        let summary = h.views.refresh_all().await.unwrap();

        assert_eq!(summary.communities, 2);
        assert_eq!(summary.edited, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.not_configured, 2);
    }

    #[tokio::test]
    async fn test_refresh_all_fails_when_pointers_unreadable() {
        let h = harness().await;
        h.pointers.set_unavailable(true);
        assert!(h.views.refresh_all().await.is_err());
    }
}
