//! Inbound events forwarded by the chat platform gateway bridge.
//!
//! Payloads here are raw: option values are validated and clamped by the
//! service layer before any component sees them.

pub mod command;

pub use command::{Command, CommandEvent, CommandKind, CommandReply, Invoker};
