//! # keydrop-database
//!
//! The record store. PostgreSQL connection management, the store traits the
//! service layer is written against, their `sqlx` implementations, and
//! in-memory implementations that mimic skip-locked claiming for tests and
//! local runs.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{ClaimTransaction, RecordStore, SettingsStore, ViewPointerStore};
