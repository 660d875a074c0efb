//! Persistent view entities.

pub mod kind;
pub mod pointer;

pub use kind::ViewKind;
pub use pointer::ViewPointer;
