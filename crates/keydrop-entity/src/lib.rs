//! # keydrop-entity
//!
//! Domain entity models for Keydrop. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities additionally derive `sqlx::FromRow`.

pub mod community;
pub mod record;
pub mod view;
