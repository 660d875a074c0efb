//! Per-community settings.

pub mod service;

pub use service::SettingsService;
