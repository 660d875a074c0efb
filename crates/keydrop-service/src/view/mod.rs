//! Persistent views: one published message per community board, edited in
//! place and recreated when it disappears.

pub mod render;
pub mod store;

pub use render::Broadcast;
pub use store::{RefreshOutcome, RefreshSummary, ViewStore};
