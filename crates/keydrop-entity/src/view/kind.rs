//! View kind enumeration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The boards a community can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "view_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Live count of unclaimed records.
    Inventory,
    /// Top claimants and per-kind consumption.
    Leaderboard,
}

impl ViewKind {
    /// Every view kind.
    pub const ALL: [ViewKind; 2] = [Self::Inventory, Self::Leaderboard];

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Leaderboard => "leaderboard",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
