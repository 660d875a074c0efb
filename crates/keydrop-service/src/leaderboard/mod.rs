//! Claim leaderboard.

pub mod aggregator;

pub use aggregator::{LeaderboardAggregator, LeaderboardEntry, LeaderboardSnapshot};
