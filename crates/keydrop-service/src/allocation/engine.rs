//! The allocation engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use keydrop_core::config::AllocationConfig;
use keydrop_core::error::AppError;
use keydrop_core::traits::{DeliveryChannel, NotificationSink};
use keydrop_core::types::id::UserId;
use keydrop_database::store::{ClaimTransaction, RecordStore};
use keydrop_entity::community::CommunitySettings;
use keydrop_entity::record::{Record, RecordKind};

use super::error::AllocationError;
use super::render;
use super::request::ClaimRequest;
use crate::view::ViewStore;

/// Records handed out by one successful claim.
#[derive(Debug, Clone, Serialize)]
pub struct Allocation {
    /// Claimed kind.
    pub kind: RecordKind,
    /// Who received the records.
    pub requester: UserId,
    /// Requester tag, when the boundary supplied one.
    pub requester_tag: Option<String>,
    /// The claimed records, oldest first, with claim fields set.
    pub records: Vec<Record>,
    /// Commit timestamp written to every record.
    pub claimed_at: DateTime<Utc>,
}

impl Allocation {
    /// Number of records claimed.
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// Hands out unused records exactly once.
///
/// A claim locks up to `quantity` free rows with a skip-locked read, marks
/// them claimed, and delivers them privately while the transaction is still
/// open. The transaction commits only after delivery succeeded; every
/// failure path rolls back and the records stay free.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    records: Arc<dyn RecordStore>,
    delivery: Arc<dyn DeliveryChannel>,
    notifier: Arc<dyn NotificationSink>,
    views: Arc<ViewStore>,
    config: AllocationConfig,
}

impl AllocationEngine {
    /// Creates a new allocation engine.
    pub fn new(
        records: Arc<dyn RecordStore>,
        delivery: Arc<dyn DeliveryChannel>,
        notifier: Arc<dyn NotificationSink>,
        views: Arc<ViewStore>,
        config: AllocationConfig,
    ) -> Self {
        Self {
            records,
            delivery,
            notifier,
            views,
            config,
        }
    }

    /// Claim records for `request` within `settings`' community.
    ///
    /// The claim runs on its own task. Dropping the returned future does not
    /// stop a claim that is already delivering: it still commits or rolls
    /// back, so records a requester has seen are never released to another.
    pub async fn allocate(
        &self,
        settings: &CommunitySettings,
        request: &ClaimRequest,
    ) -> Result<Allocation, AllocationError> {
        let engine = self.clone();
        let settings = settings.clone();
        let request = request.clone();
        let claim = tokio::spawn(async move { engine.run_claim(&settings, &request).await });

        claim.await.map_err(|e| {
            AllocationError::Storage(AppError::internal(format!("Claim task failed: {e}")))
        })?
    }

    async fn run_claim(
        &self,
        settings: &CommunitySettings,
        request: &ClaimRequest,
    ) -> Result<Allocation, AllocationError> {
        let kind = request.kind();
        let requester = request.requester();

        let mut tx = self.records.begin_claim().await?;

        let mut locked = tx.lock_unused(kind, request.quantity()).await?;
        if locked.is_empty() {
            rollback(tx, "empty inventory").await;
            debug!(kind = %kind, requester = %requester, "No free records to claim");
            return Err(AllocationError::EmptyInventory { kind });
        }

        let ids: Vec<i64> = locked.iter().map(|r| r.id).collect();
        let claimed_at = Utc::now();
        let updated = tx.mark_claimed(&ids, requester, claimed_at).await?;
        if updated != ids.len() as u64 {
            rollback(tx, "partial update").await;
            return Err(AllocationError::Storage(AppError::conflict(format!(
                "Marked {updated} of {} locked records",
                ids.len()
            ))));
        }

        let messages =
            render::delivery_messages(kind, &locked, claimed_at, self.config.chunk_char_limit);
        let timeout = Duration::from_secs(self.config.delivery_timeout_seconds);

        let reason = match tokio::time::timeout(timeout, self.delivery.deliver(requester, &messages))
            .await
        {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!(
                "delivery timed out after {}s",
                self.config.delivery_timeout_seconds
            )),
        };
        if let Some(reason) = reason {
            rollback(tx, "delivery failure").await;
            warn!(
                kind = %kind,
                requester = %requester,
                count = ids.len(),
                reason = %reason,
                "Claim rolled back after failed delivery"
            );
            return Err(AllocationError::DeliveryFailure { requester, reason });
        }

        tx.commit().await?;

        for record in &mut locked {
            record.is_used = true;
            record.claimed_by = Some(requester);
            record.claimed_at = Some(claimed_at);
        }
        let allocation = Allocation {
            kind,
            requester,
            requester_tag: request.requester_tag().map(String::from),
            records: locked,
            claimed_at,
        };

        info!(
            community = %settings.community_id,
            kind = %kind,
            requester = %requester,
            count = allocation.count(),
            "Records claimed"
        );

        self.after_commit(settings, &allocation).await;
        Ok(allocation)
    }

    /// Audit notification and board refresh. Neither can fail the claim.
    async fn after_commit(&self, settings: &CommunitySettings, allocation: &Allocation) {
        if let Some(channel) = settings.claim_log_channel_id {
            let message = render::audit_message(allocation, self.config.audit_preview_count);
            if let Err(e) = self.notifier.notify(channel, &message).await {
                warn!(
                    community = %settings.community_id,
                    channel = %channel,
                    error = %e,
                    "Claim audit notification dropped"
                );
            }
        }

        let summary = self.views.refresh_community(settings.community_id).await;
        debug!(community = %settings.community_id, ?summary, "Views refreshed after claim");
    }
}

async fn rollback(tx: Box<dyn ClaimTransaction>, cause: &str) {
    if let Err(e) = tx.rollback().await {
        warn!(cause, error = %e, "Explicit rollback failed; connection drop will discard the claim");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keydrop_core::config::ViewsConfig;
    use keydrop_core::types::id::{ChannelId, CommunityId};
    use keydrop_database::memory::{MemoryRecordStore, MemoryViewPointerStore};
    use keydrop_database::store::ViewPointerStore;
    use keydrop_entity::record::model::NewRecord;
    use keydrop_entity::view::ViewKind;

    use crate::inventory::InventoryAggregator;
    use crate::leaderboard::LeaderboardAggregator;
    use crate::testing::{RecordingDelivery, RecordingNotifier, RecordingPublisher, StaticDirectory};

    const COMMUNITY: CommunityId = CommunityId::new(1);

    struct Harness {
        records: MemoryRecordStore,
        delivery: Arc<RecordingDelivery>,
        notifier: Arc<RecordingNotifier>,
        publisher: Arc<RecordingPublisher>,
        pointers: MemoryViewPointerStore,
        views: Arc<ViewStore>,
        engine: AllocationEngine,
    }

    fn harness(config: AllocationConfig) -> Harness {
        let records = MemoryRecordStore::new();
        let delivery = Arc::new(RecordingDelivery::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let pointers = MemoryViewPointerStore::new();

        let store: Arc<dyn RecordStore> = Arc::new(records.clone());
        let views = Arc::new(ViewStore::new(
            Arc::new(pointers.clone()),
            publisher.clone(),
            InventoryAggregator::new(store.clone()),
            LeaderboardAggregator::new(store.clone(), Arc::new(StaticDirectory::new()), 10),
            ViewsConfig::default(),
        ));
        let engine = AllocationEngine::new(
            store,
            delivery.clone(),
            notifier.clone(),
            views.clone(),
            config,
        );

        Harness {
            records,
            delivery,
            notifier,
            publisher,
            pointers,
            views,
            engine,
        }
    }

    async fn seed(records: &MemoryRecordStore, kind: RecordKind, n: usize) {
        let batch: Vec<NewRecord> = (1..=n)
            .map(|i| NewRecord::login(kind, format!("{kind}{i}"), format!("pw{i}")))
            .collect();
        records.seed(&batch).await.unwrap();
    }

    fn request(service: &str, count: i64, requester: u64) -> ClaimRequest {
        ClaimRequest::new(service, Some(count), UserId::new(requester)).unwrap()
    }

    #[tokio::test]
    async fn test_claims_oldest_first_and_marks_records() {
        let h = harness(AllocationConfig::default());
        seed(&h.records, RecordKind::Steam, 3).await;
        let settings = CommunitySettings::unconfigured(COMMUNITY);

        let allocation = h
            .engine
            .allocate(&settings, &request("steam", 2, 42))
            .await
            .unwrap();

        let ids: Vec<i64> = allocation.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(allocation.records.iter().all(|r| r.is_used && r.is_consistent()));

        let delivered = h.delivery.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, UserId::new(42));
        assert_eq!(delivered[0].1.len(), 2);

        let claimed = h
            .records
            .records()
            .into_iter()
            .filter(|r| r.claimed_by == Some(UserId::new(42)))
            .count();
        assert_eq!(claimed, 2);
    }

    #[tokio::test]
    async fn test_concurrent_claims_are_disjoint_then_inventory_runs_dry() {
        let h = harness(AllocationConfig::default());
        seed(&h.records, RecordKind::Steam, 3).await;
        h.delivery.set_delay(Some(Duration::from_millis(20)));
        let settings = CommunitySettings::unconfigured(COMMUNITY);

        let first = request("steam", 2, 1);
        let second = request("steam", 2, 2);
        let (a, b) = tokio::join!(
            h.engine.allocate(&settings, &first),
            h.engine.allocate(&settings, &second),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        let mut counts = vec![a.count(), b.count()];
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2]);

        let mut all: Vec<i64> = a.records.iter().chain(&b.records).map(|r| r.id).collect();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3]);

        let third = h
            .engine
            .allocate(&settings, &request("steam", 1, 3))
            .await
            .unwrap_err();
        assert!(matches!(third, AllocationError::EmptyInventory { kind: RecordKind::Steam }));

        let free = h.records.count_unused_by_kind().await.unwrap();
        assert!(free.iter().all(|c| c.kind != RecordKind::Steam || c.count == 0));
    }

    #[tokio::test]
    async fn test_delivery_failure_rolls_back() {
        let h = harness(AllocationConfig::default());
        seed(&h.records, RecordKind::Fivem, 2).await;
        h.delivery.set_failing(true);
        let settings = CommunitySettings::unconfigured(COMMUNITY);

        let err = h
            .engine
            .allocate(&settings, &request("fivem", 2, 9))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::DeliveryFailure { .. }));
        assert!(h.records.records().iter().all(|r| !r.is_used && r.is_consistent()));
        assert_eq!(h.records.locked_count(), 0);
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_timeout_rolls_back() {
        let config = AllocationConfig {
            delivery_timeout_seconds: 1,
            ..AllocationConfig::default()
        };
        let h = harness(config);
        seed(&h.records, RecordKind::Discord, 1).await;
        h.delivery.set_delay(Some(Duration::from_secs(5)));
        let settings = CommunitySettings::unconfigured(COMMUNITY);

        let err = h
            .engine
            .allocate(&settings, &request("discord", 1, 9))
            .await
            .unwrap_err();

        match err {
            AllocationError::DeliveryFailure { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(h.records.records().iter().all(|r| !r.is_used));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_storage() {
        let h = harness(AllocationConfig::default());
        h.records.set_unavailable(true);
        let settings = CommunitySettings::unconfigured(COMMUNITY);

        let err = h
            .engine
            .allocate(&settings, &request("steam", 1, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::Storage(_)));
    }

    #[tokio::test]
    async fn test_audit_goes_to_claim_log_and_failure_is_swallowed() {
        let h = harness(AllocationConfig::default());
        seed(&h.records, RecordKind::Steam, 4).await;
        let settings = CommunitySettings {
            claim_log_channel_id: Some(ChannelId::new(500)),
            ..CommunitySettings::unconfigured(COMMUNITY)
        };

        h.engine
            .allocate(&settings, &request("steam", 1, 9))
            .await
            .unwrap();
        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelId::new(500));

        h.notifier.set_failing(true);
        let allocation = h
            .engine
            .allocate(&settings, &request("steam", 1, 9))
            .await
            .unwrap();
        assert_eq!(allocation.count(), 1);
    }

    #[tokio::test]
    async fn test_claim_refreshes_published_boards() {
        let h = harness(AllocationConfig::default());
        seed(&h.records, RecordKind::Steam, 2).await;
        let settings = CommunitySettings::unconfigured(COMMUNITY);

        let pointer = h
            .views
            .publish(COMMUNITY, ViewKind::Inventory, ChannelId::new(10), None)
            .await
            .unwrap();

        h.engine
            .allocate(&settings, &request("steam", 1, 9))
            .await
            .unwrap();

        assert_eq!(h.publisher.edit_count(), 1);
        let board = h.publisher.content(pointer.message_id).unwrap();
        assert_eq!(board.embeds[0].fields[0].value, "1");
        assert!(h.pointers.find(COMMUNITY, ViewKind::Leaderboard).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_caller_still_finishes_the_claim() {
        let h = harness(AllocationConfig::default());
        seed(&h.records, RecordKind::Steam, 1).await;
        h.delivery.set_delay(Some(Duration::from_millis(50)));
        let settings = CommunitySettings::unconfigured(COMMUNITY);

        let first = request("steam", 1, 1);
        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            h.engine.allocate(&settings, &first),
        )
        .await;
        assert!(abandoned.is_err(), "caller should give up before delivery ends");

        tokio::time::sleep(Duration::from_millis(150)).await;
        h.delivery.set_delay(None);

        let second = h
            .engine
            .allocate(&settings, &request("steam", 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(second, AllocationError::EmptyInventory { .. }));

        let delivered = h.delivery.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, UserId::new(1));

        let records = h.records.records();
        assert_eq!(records[0].claimed_by, Some(UserId::new(1)));
        assert_eq!(h.records.locked_count(), 0);
    }
}
