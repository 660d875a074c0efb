//! Credential record entities.

pub mod kind;
pub mod model;

pub use kind::RecordKind;
pub use model::Record;
