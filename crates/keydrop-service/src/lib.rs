//! # keydrop-service
//!
//! Business logic for Keydrop. The allocation engine hands out records
//! under skip-locked transactions, the aggregators build read models from
//! committed state, the view store keeps one published message per board
//! in sync, and the dispatcher routes inbound commands to handlers.
//!
//! Services follow constructor injection: every collaborator is provided
//! at construction time as an `Arc` trait object.

pub mod allocation;
pub mod dispatch;
pub mod inventory;
pub mod leaderboard;
pub mod settings;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use allocation::{AllocationEngine, AllocationError, ClaimRequest};
pub use dispatch::{CommandDispatcher, CommandHandler, HandlerContext};
pub use inventory::{InventoryAggregator, InventorySnapshot};
pub use leaderboard::{LeaderboardAggregator, LeaderboardSnapshot};
pub use settings::SettingsService;
pub use view::{Broadcast, RefreshOutcome, RefreshSummary, ViewStore};
