//! Record kind enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of record categories a claim can target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "record_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Steam accounts.
    Steam,
    /// FiveM accounts.
    Fivem,
    /// Discord accounts.
    Discord,
}

impl RecordKind {
    /// Every kind, in board display order.
    pub const ALL: [RecordKind; 3] = [Self::Steam, Self::Fivem, Self::Discord];

    /// Return the kind as its lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Steam => "steam",
            Self::Fivem => "fivem",
            Self::Discord => "discord",
        }
    }

    /// Human-facing label used on boards.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Steam => "Steam",
            Self::Fivem => "FiveM",
            Self::Discord => "Discord",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a kind name is not part of the enumerated set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown record kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for RecordKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "steam" => Ok(Self::Steam),
            "fivem" => Ok(Self::Fivem),
            "discord" => Ok(Self::Discord),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}
