//! Rendering of claimed records for private delivery and audit.

use chrono::{DateTime, Utc};

use keydrop_core::types::message::{Embed, OutboundMessage};
use keydrop_entity::record::{Record, RecordKind};

use super::engine::Allocation;

/// Placeholder for a missing credential field.
pub const MISSING: &str = "—";

const FENCE: &str = "```";
const HEADER_COLOR: u32 = 0x57F287;
const AUDIT_COLOR: u32 = 0x2F3136;

/// Format one delivered record.
///
/// `NN. username | password`, followed by ` | email | email_password` when
/// the record has an e-mail. The e-mail password falls back to the account
/// password.
pub fn format_line(position: usize, record: &Record) -> String {
    let username = record.username.as_deref().unwrap_or(MISSING);
    let password = record.password.as_deref().unwrap_or(MISSING);

    let mut line = format!("{position:02}. {username} | {password}");
    if let Some(email) = record.email.as_deref() {
        let email_password = record
            .email_password
            .as_deref()
            .or(record.password.as_deref())
            .unwrap_or(MISSING);
        line.push_str(&format!(" | {email} | {email_password}"));
    }
    line
}

fn fenced(body: &str) -> String {
    format!("{FENCE}\n{body}\n{FENCE}")
}

/// Pack lines into code-fenced chunks of at most `limit` characters.
///
/// Lines are never split. A single line longer than the limit on its own
/// still gets a chunk of its own.
pub fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let overhead = 2 * (FENCE.len() + 1);
    let mut chunks = Vec::new();
    let mut body = String::new();
    let mut body_len = 0;

    for line in lines {
        let line_len = line.chars().count();
        if body.is_empty() {
            body.push_str(line);
            body_len = line_len;
            continue;
        }
        if overhead + body_len + 1 + line_len > limit {
            chunks.push(fenced(&body));
            body.clear();
            body.push_str(line);
            body_len = line_len;
        } else {
            body.push('\n');
            body.push_str(line);
            body_len += 1 + line_len;
        }
    }

    if !body.is_empty() {
        chunks.push(fenced(&body));
    }
    chunks
}

/// The ordered private messages for a claim: a header, then the chunks.
pub fn delivery_messages(
    kind: RecordKind,
    records: &[Record],
    claimed_at: DateTime<Utc>,
    chunk_limit: usize,
) -> Vec<OutboundMessage> {
    let header = Embed::new(format!("Your {} records", kind.label()), HEADER_COLOR)
        .description(format!("Count: **{}**", records.len()))
        .timestamp(claimed_at);

    let lines: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, record)| format_line(i + 1, record))
        .collect();

    std::iter::once(OutboundMessage::embed(header))
        .chain(chunk_lines(&lines, chunk_limit).into_iter().map(OutboundMessage::text))
        .collect()
}

/// The claim audit entry posted to a community's claim-log channel.
pub fn audit_message(allocation: &Allocation, preview_count: usize) -> OutboundMessage {
    let preview = allocation
        .records
        .iter()
        .take(preview_count)
        .filter_map(|r| r.username.as_deref())
        .collect::<Vec<_>>()
        .join(", ");
    let preview = if preview.is_empty() {
        MISSING.to_string()
    } else {
        preview
    };

    let requester = match allocation.requester_tag.as_deref() {
        Some(tag) => format!("{tag} ({})", allocation.requester),
        None => allocation.requester.to_string(),
    };

    let embed = Embed::new("Records claimed", AUDIT_COLOR)
        .field("User", requester, false)
        .field("Kind", allocation.kind.label(), true)
        .field("Count", allocation.records.len().to_string(), true)
        .field("First usernames", preview, false)
        .field(
            "Claimed at",
            format!("<t:{}:f>", allocation.claimed_at.timestamp()),
            true,
        )
        .timestamp(allocation.claimed_at);

    OutboundMessage::embed(embed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keydrop_core::types::id::UserId;

    fn record(username: Option<&str>, password: Option<&str>, email: Option<&str>) -> Record {
        Record {
            id: 1,
            kind: RecordKind::Steam,
            username: username.map(String::from),
            password: password.map(String::from),
            email: email.map(String::from),
            email_password: None,
            is_used: false,
            claimed_by: None,
            claimed_at: None,
        }
    }

    #[test]
    fn test_line_without_email() {
        let line = format_line(1, &record(Some("alice"), Some("pw"), None));
        assert_eq!(line, "01. alice | pw");
    }

    #[test]
    fn test_line_with_email_falls_back_to_password() {
        let line = format_line(12, &record(Some("bob"), Some("pw"), Some("bob@mail.test")));
        assert_eq!(line, "12. bob | pw | bob@mail.test | pw");
    }

    #[test]
    fn test_line_marks_missing_fields() {
        let line = format_line(3, &record(None, None, Some("x@mail.test")));
        assert_eq!(line, "03. — | — | x@mail.test | —");
    }

    #[test]
    fn test_chunks_respect_limit_and_keep_lines_whole() {
        let lines: Vec<String> = (1..=200)
            .map(|i| format!("{i:02}. user{i:04} | password{i:04} | mail{i:04}@mail.test | pw"))
            .collect();
        let chunks = chunk_lines(&lines, 1900);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1900, "chunk too long");
            assert!(chunk.starts_with("```\n") && chunk.ends_with("\n```"));
        }

        let rejoined: Vec<String> = chunks
            .iter()
            .flat_map(|c| {
                c.trim_start_matches("```\n")
                    .trim_end_matches("\n```")
                    .lines()
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(rejoined, lines);
    }

    #[test]
    fn test_chunk_fills_exactly_to_limit() {
        let lines = vec!["a".repeat(10), "b".repeat(10)];
        // 8 fence chars + 10 + 1 + 10 = 29
        assert_eq!(chunk_lines(&lines, 29).len(), 1);
        assert_eq!(chunk_lines(&lines, 28).len(), 2);
    }

    #[test]
    fn test_delivery_starts_with_header() {
        let records = vec![record(Some("alice"), Some("pw"), None)];
        let messages = delivery_messages(RecordKind::Steam, &records, Utc::now(), 1900);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].embeds[0].title, "Your Steam records");
        assert_eq!(messages[0].embeds[0].description.as_deref(), Some("Count: **1**"));
        assert_eq!(messages[1].content.as_deref(), Some("```\n01. alice | pw\n```"));
    }

    #[test]
    fn test_audit_previews_first_usernames() {
        let records: Vec<Record> = ["a", "b", "c", "d"]
            .iter()
            .map(|u| record(Some(u), Some("pw"), None))
            .collect();
        let allocation = Allocation {
            kind: RecordKind::Steam,
            requester: UserId::new(77),
            requester_tag: Some("alice".to_string()),
            records,
            claimed_at: Utc::now(),
        };

        let message = audit_message(&allocation, 3);
        let fields = &message.embeds[0].fields;
        assert_eq!(fields[0].value, "alice (77)");
        assert_eq!(fields[2].value, "4");
        assert_eq!(fields[3].value, "a, b, c");
    }
}
