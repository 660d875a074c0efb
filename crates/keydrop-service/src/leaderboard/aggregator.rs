//! Leaderboard aggregation.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

use keydrop_core::result::AppResult;
use keydrop_core::traits::Directory;
use keydrop_core::types::id::UserId;
use keydrop_database::store::{KindCount, RecordStore};
use keydrop_entity::record::RecordKind;

/// One ranked claimant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based rank.
    pub rank: usize,
    /// The claimant.
    pub claimant: UserId,
    /// Resolved display name, or the raw id when unresolved.
    pub display: String,
    /// Records claimed.
    pub count: i64,
}

/// Top claimants and consumption per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardSnapshot {
    /// Claimants by count descending, then id ascending.
    pub top_claimants: Vec<LeaderboardEntry>,
    /// Claimed records per kind; every kind present, count descending then
    /// kind name ascending.
    pub per_kind: Vec<KindCount>,
}

/// Builds the leaderboard from committed claims.
#[derive(Debug, Clone)]
pub struct LeaderboardAggregator {
    records: Arc<dyn RecordStore>,
    directory: Arc<dyn Directory>,
    size: usize,
}

impl LeaderboardAggregator {
    /// Creates a new leaderboard aggregator showing `size` claimants.
    pub fn new(records: Arc<dyn RecordStore>, directory: Arc<dyn Directory>, size: usize) -> Self {
        Self {
            records,
            directory,
            size,
        }
    }

    /// Current leaderboard.
    ///
    /// Name resolution never fails the snapshot: an unknown user or a
    /// directory error falls back to the raw identifier.
    pub async fn snapshot(&self) -> AppResult<LeaderboardSnapshot> {
        let ranked = self.records.top_claimants(self.size).await?;
        let claimed = self.records.count_claimed_by_kind().await?;

        let names = join_all(ranked.iter().map(|row| self.display_name(row.claimant))).await;
        let top_claimants = ranked
            .iter()
            .zip(names)
            .enumerate()
            .map(|(i, (row, display))| LeaderboardEntry {
                rank: i + 1,
                claimant: row.claimant,
                display,
                count: row.count,
            })
            .collect();

        let mut per_kind: Vec<KindCount> = RecordKind::ALL
            .iter()
            .map(|&kind| KindCount {
                kind,
                count: claimed
                    .iter()
                    .filter(|r| r.kind == kind)
                    .map(|r| r.count)
                    .sum(),
            })
            .collect();
        per_kind.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
        });

        Ok(LeaderboardSnapshot {
            top_claimants,
            per_kind,
        })
    }

    async fn display_name(&self, user: UserId) -> String {
        match self.directory.resolve(user).await {
            Ok(Some(name)) => name,
            Ok(None) => user.to_string(),
            Err(e) => {
                debug!(user = %user, error = %e, "Display name lookup failed");
                user.to_string()
            }
        }
    }
}
