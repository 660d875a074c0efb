//! In-memory credential pool with skip-locked claim semantics.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use keydrop_core::error::AppError;
use keydrop_core::result::AppResult;
use keydrop_core::types::id::UserId;
use keydrop_entity::record::model::NewRecord;
use keydrop_entity::record::{Record, RecordKind};

use super::guard;
use crate::store::{ClaimTransaction, ClaimantCount, KindCount, RecordStore};

/// Shared pool state.
#[derive(Debug, Default)]
struct PoolState {
    /// Committed records keyed by id.
    records: BTreeMap<i64, Record>,
    /// Ids currently held by an open claim transaction.
    locked: HashSet<i64>,
    /// Last id handed out.
    last_id: i64,
}

/// A staged claim waiting for commit.
#[derive(Debug, Clone, Copy)]
struct StagedClaim {
    id: i64,
    claimant: UserId,
    at: DateTime<Utc>,
}

/// In-memory [`RecordStore`].
///
/// Open transactions hold row ids in a shared lock set; other transactions
/// skip those ids exactly as `FOR UPDATE SKIP LOCKED` would. Staged updates
/// become visible only on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<Mutex<PoolState>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryRecordStore {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of every committed record, ordered by id.
    pub fn records(&self) -> Vec<Record> {
        guard(&self.state).records.values().cloned().collect()
    }

    /// Number of ids currently held by open transactions.
    pub fn locked_count(&self) -> usize {
        guard(&self.state).locked.len()
    }

    fn check_available(&self) -> AppResult<()> {
        check_available(&self.unavailable)
    }
}

fn check_available(flag: &AtomicBool) -> AppResult<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(AppError::database("Record store is unavailable"));
    }
    Ok(())
}

fn count_by_kind(state: &PoolState, used: bool) -> Vec<KindCount> {
    let mut counts: BTreeMap<RecordKind, i64> = BTreeMap::new();
    for record in state.records.values().filter(|r| r.is_used == used) {
        *counts.entry(record.kind).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(kind, count)| KindCount { kind, count })
        .collect()
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn begin_claim(&self) -> AppResult<Box<dyn ClaimTransaction>> {
        self.check_available()?;
        Ok(Box::new(MemoryClaimTransaction {
            state: Arc::clone(&self.state),
            unavailable: Arc::clone(&self.unavailable),
            held: Vec::new(),
            staged: Vec::new(),
        }))
    }

    async fn count_unused_by_kind(&self) -> AppResult<Vec<KindCount>> {
        self.check_available()?;
        Ok(count_by_kind(&guard(&self.state), false))
    }

    async fn count_claimed_by_kind(&self) -> AppResult<Vec<KindCount>> {
        self.check_available()?;
        Ok(count_by_kind(&guard(&self.state), true))
    }

    async fn top_claimants(&self, limit: usize) -> AppResult<Vec<ClaimantCount>> {
        self.check_available()?;
        let mut totals: HashMap<UserId, i64> = HashMap::new();
        {
            let state = guard(&self.state);
            for claimant in state.records.values().filter_map(|r| r.claimed_by) {
                *totals.entry(claimant).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<ClaimantCount> = totals
            .into_iter()
            .map(|(claimant, count)| ClaimantCount { claimant, count })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.claimant.cmp(&b.claimant)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn seed(&self, records: &[NewRecord]) -> AppResult<Vec<i64>> {
        self.check_available()?;
        let mut state = guard(&self.state);
        let mut ids = Vec::with_capacity(records.len());
        for new in records {
            state.last_id += 1;
            let id = state.last_id;
            state.records.insert(
                id,
                Record {
                    id,
                    kind: new.kind,
                    username: new.username.clone(),
                    password: new.password.clone(),
                    email: new.email.clone(),
                    email_password: new.email_password.clone(),
                    is_used: false,
                    claimed_by: None,
                    claimed_at: None,
                },
            );
            ids.push(id);
        }
        Ok(ids)
    }
}

/// Claim transaction over a [`MemoryRecordStore`].
#[derive(Debug)]
pub struct MemoryClaimTransaction {
    state: Arc<Mutex<PoolState>>,
    unavailable: Arc<AtomicBool>,
    held: Vec<i64>,
    staged: Vec<StagedClaim>,
}

impl MemoryClaimTransaction {
    fn release(&mut self) {
        if self.held.is_empty() {
            return;
        }
        let mut state = guard(&self.state);
        for id in self.held.drain(..) {
            state.locked.remove(&id);
        }
        self.staged.clear();
    }
}

#[async_trait]
impl ClaimTransaction for MemoryClaimTransaction {
    async fn lock_unused(&mut self, kind: RecordKind, limit: u32) -> AppResult<Vec<Record>> {
        check_available(&self.unavailable)?;
        let mut state = guard(&self.state);
        let picked: Vec<Record> = state
            .records
            .values()
            .filter(|r| !r.is_used && r.kind == kind && !state.locked.contains(&r.id))
            .take(limit as usize)
            .cloned()
            .collect();
        for record in &picked {
            state.locked.insert(record.id);
            self.held.push(record.id);
        }
        Ok(picked)
    }

    async fn mark_claimed(
        &mut self,
        ids: &[i64],
        claimant: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        check_available(&self.unavailable)?;
        let mut updated = 0;
        for &id in ids {
            if self.held.contains(&id) && !self.staged.iter().any(|s| s.id == id) {
                self.staged.push(StagedClaim { id, claimant, at });
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn commit(mut self: Box<Self>) -> AppResult<()> {
        check_available(&self.unavailable)?;
        {
            let mut state = guard(&self.state);
            for claim in &self.staged {
                if let Some(record) = state.records.get_mut(&claim.id) {
                    record.is_used = true;
                    record.claimed_by = Some(claim.claimant);
                    record.claimed_at = Some(claim.at);
                }
            }
        }
        self.release();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> AppResult<()> {
        self.release();
        Ok(())
    }
}

impl Drop for MemoryClaimTransaction {
    fn drop(&mut self) {
        self.release();
    }
}
