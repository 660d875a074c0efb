//! Inventory aggregation.

use std::sync::Arc;

use serde::Serialize;

use keydrop_core::result::AppResult;
use keydrop_database::store::{KindCount, RecordStore};
use keydrop_entity::record::RecordKind;

/// Free records per kind at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySnapshot {
    /// One entry per kind, in declaration order, zero-filled.
    pub counts: Vec<KindCount>,
    /// Sum of `counts`.
    pub total: i64,
}

impl InventorySnapshot {
    /// Free records of `kind`.
    pub fn count(&self, kind: RecordKind) -> i64 {
        self.counts
            .iter()
            .find(|c| c.kind == kind)
            .map_or(0, |c| c.count)
    }
}

/// Reads committed inventory without taking locks.
#[derive(Debug, Clone)]
pub struct InventoryAggregator {
    records: Arc<dyn RecordStore>,
}

impl InventoryAggregator {
    /// Creates a new inventory aggregator.
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Current free counts for every kind.
    pub async fn snapshot(&self) -> AppResult<InventorySnapshot> {
        let rows = self.records.count_unused_by_kind().await?;

        let counts: Vec<KindCount> = RecordKind::ALL
            .iter()
            .map(|&kind| KindCount {
                kind,
                count: rows
                    .iter()
                    .filter(|r| r.kind == kind)
                    .map(|r| r.count)
                    .sum(),
            })
            .collect();
        let total = counts.iter().map(|c| c.count).sum();

        Ok(InventorySnapshot { counts, total })
    }
}
