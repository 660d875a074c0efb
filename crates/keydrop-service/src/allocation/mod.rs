//! Claim allocation: validated requests, the transactional engine, and
//! rendering of delivered records.

pub mod engine;
pub mod error;
pub mod render;
pub mod request;

pub use engine::{Allocation, AllocationEngine};
pub use error::AllocationError;
pub use request::ClaimRequest;
