//! # keydrop-core
//!
//! Core crate for Keydrop. Contains the outbound collaborator traits,
//! configuration schemas, platform identifiers, the rendered message model,
//! inbound command events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Keydrop crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
