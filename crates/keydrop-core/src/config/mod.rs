//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod allocation;
pub mod app;
pub mod database;
pub mod logging;
pub mod platform;
pub mod views;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::allocation::AllocationConfig;
pub use self::app::{AccessConfig, CorsConfig, ServerConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::platform::PlatformConfig;
pub use self::views::ViewsConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Allocation engine settings.
    #[serde(default)]
    pub allocation: AllocationConfig,
    /// Published board settings.
    #[serde(default)]
    pub views: ViewsConfig,
    /// Periodic refresh settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Chat platform REST settings.
    #[serde(default)]
    pub platform: PlatformConfig,
    /// Ingress access settings.
    #[serde(default)]
    pub access: AccessConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `KEYDROP__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("KEYDROP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("access.allowed_communities"),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::id::CommunityId;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://keydrop@localhost/keydrop"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.allocation.chunk_char_limit, 1900);
        assert_eq!(config.allocation.delivery_timeout_seconds, 30);
        assert_eq!(config.views.leaderboard_size, 10);
        assert_eq!(config.worker.refresh_cron, "0 */10 * * * *");
        assert_eq!(config.logging.format, "json");
        assert!(config.access.allowed_communities.is_empty());
    }

    #[test]
    fn test_allowed_communities_accept_strings_and_numbers() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://localhost/keydrop"

            [access]
            api_token = "secret"
            allowed_communities = ["1405633884598829227", 42]
            "#,
        )
        .expect("config should parse");

        assert!(config.access.allows(CommunityId::new(1405633884598829227)));
        assert!(config.access.allows(CommunityId::new(42)));
        assert!(!config.access.allows(CommunityId::new(7)));
    }

    #[test]
    fn test_missing_database_is_rejected() {
        let err = AppConfig::from_toml("[server]\nport = 9000\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
