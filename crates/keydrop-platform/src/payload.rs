//! Wire payloads for the platform REST API.

use serde::{Deserialize, Serialize};

use keydrop_core::types::id::{ChannelId, MessageId, UserId};
use keydrop_core::types::message::{Embed, OutboundMessage};

/// Body of a create or edit message request.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload {
    /// Plain content. Sent as an empty string on edits so stale text is cleared.
    pub content: String,
    /// Rich embeds.
    pub embeds: Vec<EmbedPayload>,
    /// Which mentions in `content` may ping.
    pub allowed_mentions: AllowedMentions,
}

impl From<&OutboundMessage> for MessagePayload {
    fn from(message: &OutboundMessage) -> Self {
        let parse = if message.mention_everyone {
            vec!["everyone".to_string()]
        } else {
            Vec::new()
        };
        Self {
            content: message.content.clone().unwrap_or_default(),
            embeds: message.embeds.iter().map(EmbedPayload::from).collect(),
            allowed_mentions: AllowedMentions { parse },
        }
    }
}

/// Mention filter. An empty `parse` list suppresses every ping.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AllowedMentions {
    /// Mention categories that may ping.
    pub parse: Vec<String>,
}

/// A rich embed in platform format.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedFieldPayload>,
    /// ISO-8601 timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl From<&Embed> for EmbedPayload {
    fn from(embed: &Embed) -> Self {
        Self {
            title: embed.title.clone(),
            description: embed.description.clone(),
            color: embed.color,
            fields: embed
                .fields
                .iter()
                .map(|f| EmbedFieldPayload {
                    name: f.name.clone(),
                    value: f.value.clone(),
                    inline: f.inline,
                })
                .collect(),
            timestamp: embed.timestamp.map(|t| t.to_rfc3339()),
        }
    }
}

/// A single embed field.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedFieldPayload {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Body of the open-DM request.
#[derive(Debug, Clone, Serialize)]
pub struct OpenDmPayload {
    /// The user to open a private channel with.
    pub recipient_id: UserId,
}

/// The subset of a channel object we read.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelResponse {
    pub id: ChannelId,
}

/// The subset of a message object we read.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: MessageId,
}

/// The subset of a user object we read.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl UserResponse {
    /// Preferred display name: the global name when set, else the username.
    pub fn display_name(&self) -> String {
        self.global_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_message_suppresses_mentions() {
        let payload = MessagePayload::from(&OutboundMessage::text("hello"));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "content": "hello",
                "embeds": [],
                "allowed_mentions": { "parse": [] }
            })
        );
    }

    #[test]
    fn test_everyone_mention_is_allowed_when_requested() {
        let message = OutboundMessage::text("@everyone Restock is live!").with_everyone_mention();
        let payload = MessagePayload::from(&message);
        assert_eq!(payload.allowed_mentions.parse, vec!["everyone".to_string()]);
    }

    #[test]
    fn test_embed_shape() {
        let embed = Embed::new("Stock", 0x5865F2)
            .description("live")
            .field("Steam", "3", true);
        let payload = MessagePayload::from(&OutboundMessage::embed(embed));
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["content"], "");
        assert_eq!(value["embeds"][0]["title"], "Stock");
        assert_eq!(value["embeds"][0]["color"], 0x5865F2);
        assert_eq!(value["embeds"][0]["fields"][0]["name"], "Steam");
        assert_eq!(value["embeds"][0]["fields"][0]["inline"], true);
        assert!(value["embeds"][0].get("timestamp").is_none());
    }

    #[test]
    fn test_open_dm_serializes_id_as_string() {
        let value = serde_json::to_value(OpenDmPayload {
            recipient_id: UserId::new(42),
        })
        .unwrap();
        assert_eq!(value, json!({ "recipient_id": "42" }));
    }

    #[test]
    fn test_display_name_prefers_global_name() {
        let user: UserResponse =
            serde_json::from_str(r#"{"id":"1","username":"neo","global_name":"Neo"}"#).unwrap();
        assert_eq!(user.display_name(), "Neo");

        let user: UserResponse =
            serde_json::from_str(r#"{"id":"1","username":"neo","global_name":null}"#).unwrap();
        assert_eq!(user.display_name(), "neo");
    }
}
