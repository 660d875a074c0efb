//! Slash-command invocations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{ChannelId, CommunityId, UserId};

/// The user who invoked a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoker {
    /// Platform user id.
    pub id: UserId,
    /// Display tag, used in audit messages.
    #[serde(default)]
    pub tag: String,
    /// Whether the invoker holds administrator permission in the community.
    #[serde(default)]
    pub is_admin: bool,
}

/// A command invocation in a community.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Community the command was issued in.
    pub community_id: CommunityId,
    /// Channel the command was issued from.
    pub channel_id: ChannelId,
    /// Who issued it.
    pub invoker: Invoker,
    /// The command and its raw options.
    pub command: Command,
    /// When the platform received the invocation.
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

/// Command payloads with their unvalidated options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Command {
    /// Claim one or more records of a kind, delivered privately.
    Claim {
        /// Record kind name.
        service: String,
        /// Requested quantity; clamped, never rejected.
        #[serde(default)]
        count: Option<i64>,
    },
    /// Publish the inventory board to a channel.
    SetStock {
        /// Target channel.
        channel: ChannelId,
    },
    /// Publish the leaderboard to a channel.
    SetLeaderboard {
        /// Target channel.
        channel: ChannelId,
    },
    /// Refresh the inventory board and broadcast a restock announcement.
    Restock {
        /// Kind that was restocked.
        #[serde(default)]
        service: Option<String>,
        /// Free-text note appended to the announcement.
        #[serde(default)]
        note: Option<String>,
    },
    /// Refresh both boards without announcing anything.
    RefreshViews,
    /// Route claim audit notifications to a channel.
    SetClaimLog {
        /// Target channel.
        channel: ChannelId,
    },
}

/// Discriminant used as the dispatcher registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// [`Command::Claim`].
    Claim,
    /// [`Command::SetStock`].
    SetStock,
    /// [`Command::SetLeaderboard`].
    SetLeaderboard,
    /// [`Command::Restock`].
    Restock,
    /// [`Command::RefreshViews`].
    RefreshViews,
    /// [`Command::SetClaimLog`].
    SetClaimLog,
}

impl Command {
    /// The registry key for this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Claim { .. } => CommandKind::Claim,
            Self::SetStock { .. } => CommandKind::SetStock,
            Self::SetLeaderboard { .. } => CommandKind::SetLeaderboard,
            Self::Restock { .. } => CommandKind::Restock,
            Self::RefreshViews => CommandKind::RefreshViews,
            Self::SetClaimLog { .. } => CommandKind::SetClaimLog,
        }
    }
}

impl CommandKind {
    /// Every command kind.
    pub const ALL: [CommandKind; 6] = [
        Self::Claim,
        Self::SetStock,
        Self::SetLeaderboard,
        Self::Restock,
        Self::RefreshViews,
        Self::SetClaimLog,
    ];

    /// The command's registered name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::SetStock => "set_stock",
            Self::SetLeaderboard => "set_leaderboard",
            Self::Restock => "restock",
            Self::RefreshViews => "refresh_views",
            Self::SetClaimLog => "set_claim_log",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the bridge should show the invoker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    /// Reply text.
    pub content: String,
    /// Only visible to the invoker.
    pub ephemeral: bool,
}

impl CommandReply {
    /// An invoker-only reply.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_event_from_bridge_json() {
        let event: CommandEvent = serde_json::from_str(
            r#"{
                "community_id": "1405633884598829227",
                "channel_id": "10",
                "invoker": {"id": "77", "tag": "alice#0001", "is_admin": true},
                "command": {"name": "claim", "service": "steam", "count": 3}
            }"#,
        )
        .expect("event should parse");

        assert_eq!(event.command.kind(), CommandKind::Claim);
        match event.command {
            Command::Claim { service, count } => {
                assert_eq!(service, "steam");
                assert_eq!(count, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(event.invoker.is_admin);
    }

    #[test]
    fn test_unit_command_parses() {
        let command: Command =
            serde_json::from_str(r#"{"name": "refresh_views"}"#).expect("command");
        assert_eq!(command.kind(), CommandKind::RefreshViews);
    }

    #[test]
    fn test_kind_names_match_wire_tags() {
        for kind in CommandKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
