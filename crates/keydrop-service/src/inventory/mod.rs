//! Live inventory of unclaimed records.

pub mod aggregator;

pub use aggregator::{InventoryAggregator, InventorySnapshot};
