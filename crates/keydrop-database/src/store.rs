//! Store traits the service layer is written against.
//!
//! Two implementations exist for each: the PostgreSQL repositories in
//! [`crate::repositories`] and the in-memory stores in [`crate::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keydrop_core::result::AppResult;
use keydrop_core::types::id::{ChannelId, CommunityId, MessageId, UserId};
use keydrop_entity::community::CommunitySettings;
use keydrop_entity::record::model::NewRecord;
use keydrop_entity::record::{Record, RecordKind};
use keydrop_entity::view::{ViewKind, ViewPointer};

/// Count of records grouped by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct KindCount {
    /// Record kind.
    pub kind: RecordKind,
    /// Number of records.
    pub count: i64,
}

/// Count of claimed records grouped by claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClaimantCount {
    /// The claimant.
    pub claimant: UserId,
    /// Number of records claimed.
    pub count: i64,
}

/// The credential pool.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Open a claim transaction.
    async fn begin_claim(&self) -> AppResult<Box<dyn ClaimTransaction>>;

    /// Committed unused records per kind. Kinds with none may be absent.
    async fn count_unused_by_kind(&self) -> AppResult<Vec<KindCount>>;

    /// Committed claimed records per kind. Kinds with none may be absent.
    async fn count_claimed_by_kind(&self) -> AppResult<Vec<KindCount>>;

    /// Claimants ordered by claim count descending, then claimant id
    /// ascending, truncated to `limit`.
    async fn top_claimants(&self, limit: usize) -> AppResult<Vec<ClaimantCount>>;

    /// Insert unclaimed records and return their ids.
    async fn seed(&self, records: &[NewRecord]) -> AppResult<Vec<i64>>;
}

/// A claim in progress.
///
/// Dropping the transaction without calling [`ClaimTransaction::commit`]
/// rolls back every change made through it and releases its row locks.
#[async_trait]
pub trait ClaimTransaction: Send {
    /// Lock up to `limit` unused records of `kind`, oldest first, skipping
    /// rows another transaction already holds.
    async fn lock_unused(&mut self, kind: RecordKind, limit: u32) -> AppResult<Vec<Record>>;

    /// Mark the locked records as claimed by `claimant` at `at`. Returns
    /// the number of rows updated.
    async fn mark_claimed(
        &mut self,
        ids: &[i64],
        claimant: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Make the claim durable.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard the claim explicitly.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Durable pointers to published board messages.
#[async_trait]
pub trait ViewPointerStore: Send + Sync + std::fmt::Debug {
    /// Look up the pointer for a community's board.
    async fn find(&self, community: CommunityId, kind: ViewKind)
    -> AppResult<Option<ViewPointer>>;

    /// Insert the pointer, or overwrite channel and message if one exists.
    async fn upsert(
        &self,
        community: CommunityId,
        kind: ViewKind,
        channel: ChannelId,
        message: MessageId,
    ) -> AppResult<ViewPointer>;

    /// Every community with at least one pointer, ascending.
    async fn communities(&self) -> AppResult<Vec<CommunityId>>;
}

/// Per-community settings persistence.
#[async_trait]
pub trait SettingsStore: Send + Sync + std::fmt::Debug {
    /// Load a community's settings, if any were saved.
    async fn find(&self, community: CommunityId) -> AppResult<Option<CommunitySettings>>;

    /// Set (or clear) the claim audit channel.
    async fn set_claim_log_channel(
        &self,
        community: CommunityId,
        channel: Option<ChannelId>,
    ) -> AppResult<CommunitySettings>;
}
