//! Published view configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the persistent inventory and leaderboard boards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Number of claimants shown on the leaderboard.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    /// Text used for restock broadcasts when no note is supplied.
    #[serde(default = "default_restock_text")]
    pub restock_text: String,
    /// Embed accent color for the inventory board.
    #[serde(default = "default_board_color")]
    pub board_color: u32,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
            restock_text: default_restock_text(),
            board_color: default_board_color(),
        }
    }
}

fn default_leaderboard_size() -> usize {
    10
}

fn default_restock_text() -> String {
    "Restock is live!".to_string()
}

fn default_board_color() -> u32 {
    0x5865F2
}
