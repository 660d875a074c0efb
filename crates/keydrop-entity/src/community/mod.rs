//! Per-community configuration.

pub mod settings;

pub use settings::CommunitySettings;
