//! # keydrop-api
//!
//! HTTP API layer for Keydrop built on Axum.
//!
//! The gateway bridge forwards command events to `/api/events`; operators
//! read inventory and leaderboard snapshots; load balancers poll
//! `/api/health`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
