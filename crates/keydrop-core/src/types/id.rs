//! Newtype wrappers around platform snowflake identifiers.
//!
//! Using distinct types prevents accidentally passing a `ChannelId` where a
//! `MessageId` is expected. Identifiers serialize as decimal strings (the
//! platform's JSON convention) and deserialize from either strings or
//! numbers. When the `sqlx` feature is enabled, each ID type also maps to a
//! PostgreSQL `BIGINT`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wire representation accepted when deserializing an identifier.
#[doc(hidden)]
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SnowflakeRepr {
    Text(String),
    Number(u64),
}

impl SnowflakeRepr {
    fn into_u64(self) -> Result<u64, String> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("invalid snowflake '{s}': {e}")),
        }
    }
}

/// Macro to define a newtype ID wrapper around a `u64` snowflake.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "SnowflakeRepr", into = "String")]
        pub struct $name(pub u64);

        impl $name {
            /// Create an identifier from a raw snowflake.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0.to_string()
            }
        }

        impl TryFrom<SnowflakeRepr> for $name {
            type Error = String;

            fn try_from(repr: SnowflakeRepr) -> Result<Self, Self::Error> {
                repr.into_u64().map(Self)
            }
        }

        #[cfg(feature = "sqlx")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <i64 as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&(self.0 as i64), buf)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <i64 as sqlx::Decode<'r, sqlx::Postgres>>::decode(value).map(|v| Self(v as u64))
            }
        }
    };
}

define_id!(
    /// A community (guild) on the chat platform.
    CommunityId
);

define_id!(
    /// A text channel on the chat platform.
    ChannelId
);

define_id!(
    /// A message posted in a channel.
    MessageId
);

define_id!(
    /// A platform user; requesters and claimants are users.
    UserId
);
