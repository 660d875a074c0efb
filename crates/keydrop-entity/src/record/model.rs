//! Record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keydrop_core::types::id::UserId;

use super::kind::RecordKind;

/// A single-use credential record.
///
/// Once `is_used` is set, `claimed_by` and `claimed_at` are set too and
/// never change again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Record {
    /// Monotonic identifier; lower ids are handed out first.
    pub id: i64,
    /// Record category.
    pub kind: RecordKind,
    /// Account login name.
    pub username: Option<String>,
    /// Account password.
    pub password: Option<String>,
    /// Recovery e-mail address.
    pub email: Option<String>,
    /// Password for the recovery e-mail.
    pub email_password: Option<String>,
    /// Whether the record has been claimed.
    pub is_used: bool,
    /// The claimant, once claimed.
    pub claimed_by: Option<UserId>,
    /// When the record was claimed.
    pub claimed_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Whether the claim fields agree with the used flag.
    pub fn is_consistent(&self) -> bool {
        if self.is_used {
            self.claimed_by.is_some() && self.claimed_at.is_some()
        } else {
            self.claimed_by.is_none() && self.claimed_at.is_none()
        }
    }
}

/// Payload for seeding a fresh, unclaimed record.
///
/// Seeding happens outside the engine; this type exists for import tooling
/// and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    /// Record category.
    pub kind: RecordKind,
    /// Account login name.
    pub username: Option<String>,
    /// Account password.
    pub password: Option<String>,
    /// Recovery e-mail address.
    #[serde(default)]
    pub email: Option<String>,
    /// Password for the recovery e-mail.
    #[serde(default)]
    pub email_password: Option<String>,
}

impl NewRecord {
    /// A record with login credentials only.
    pub fn login(kind: RecordKind, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            kind,
            username: Some(username.into()),
            password: Some(password.into()),
            email: None,
            email_password: None,
        }
    }
}
