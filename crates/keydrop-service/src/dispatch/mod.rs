//! Typed command dispatch.
//!
//! Inbound command events are routed by [`CommandKind`] to a registered
//! [`CommandHandler`]. Community and permission guards run before any
//! handler sees the event.
//!
//! [`CommandKind`]: keydrop_core::events::CommandKind

pub mod context;
pub mod dispatcher;
pub mod handlers;

pub use context::HandlerContext;
pub use dispatcher::{CommandDispatcher, CommandHandler};
