//! Platform-neutral rendering of an outbound chat message.
//!
//! Renderers in the service layer produce these values; platform adapters
//! translate them into wire payloads. Two renders of the same input are
//! equal, which is what makes board refreshes idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message: optional plain content plus zero or more embeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Plain text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Rich embeds, rendered in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Whether an `@everyone` mention in the content should ping.
    #[serde(default)]
    pub mention_everyone: bool,
}

impl OutboundMessage {
    /// A plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A message carrying a single embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// Allow the `@everyone` mention in this message to ping.
    pub fn with_everyone_mention(mut self) -> Self {
        self.mention_everyone = true;
        self
    }

    /// Total characters of text content (embeds excluded).
    pub fn content_len(&self) -> usize {
        self.content.as_deref().map_or(0, |c| c.chars().count())
    }
}

/// A rich embed block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title.
    pub title: String,
    /// Optional description under the title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name/value fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    /// Accent color as `0xRRGGBB`.
    pub color: u32,
    /// Footer timestamp. Board renders leave this empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    /// Start an embed with a title and color.
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Stamp the embed with a time.
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}

/// A name/value pair inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Render side by side with neighbouring inline fields.
    #[serde(default)]
    pub inline: bool,
}
