//! Board rendering.
//!
//! Renders carry no wall-clock data, so identical snapshots produce
//! identical messages and repeated refreshes are no-ops on the platform.

use keydrop_core::types::message::{Embed, OutboundMessage};
use keydrop_entity::record::RecordKind;

use crate::inventory::InventorySnapshot;
use crate::leaderboard::LeaderboardSnapshot;

/// Render the inventory board.
pub fn inventory_board(snapshot: &InventorySnapshot, color: u32) -> OutboundMessage {
    let embed = snapshot.counts.iter().fold(
        Embed::new("Inventory (free records)", color).description("Live stock for every kind"),
        |embed, c| embed.field(c.kind.label(), c.count.to_string(), true),
    );
    OutboundMessage::embed(embed.field("Total", snapshot.total.to_string(), true))
}

/// Render the leaderboard board.
pub fn leaderboard_board(snapshot: &LeaderboardSnapshot, color: u32) -> OutboundMessage {
    let ranking = if snapshot.top_claimants.is_empty() {
        "No claims yet.".to_string()
    } else {
        snapshot
            .top_claimants
            .iter()
            .map(|e| format!("**{}.** {}: {}", e.rank, e.display, e.count))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = snapshot.per_kind.iter().fold(
        Embed::new("Claim leaderboard", color).description(ranking),
        |embed, c| embed.field(c.kind.label(), c.count.to_string(), true),
    );
    OutboundMessage::embed(embed)
}

/// An announcement posted after a board refresh, never tracked by a pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    text: String,
}

impl Broadcast {
    /// Free-form announcement text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Restock announcement: the base text, the bold kind, then the note
    /// after a dash. Absent parts are omitted.
    ///
    /// Known kind names are shown with their board label; anything else is
    /// shown as typed.
    pub fn restock(base: &str, service: Option<&str>, note: Option<&str>) -> Self {
        let service = service
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<RecordKind>() {
                Ok(kind) => format!("**{}**", kind.label()),
                Err(_) => format!("**{s}**"),
            });
        let note = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| format!("— {n}"));

        let text = std::iter::once(base.trim().to_string())
            .chain(service)
            .chain(note)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text }
    }

    /// Announcement text without the mention.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The message to post, pinging everyone.
    pub fn message(&self) -> OutboundMessage {
        OutboundMessage::text(format!("@everyone {}", self.text)).with_everyone_mention()
    }
}
