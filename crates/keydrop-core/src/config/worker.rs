//! Background view refresh configuration.

use serde::{Deserialize, Serialize};

/// Periodic view refresh configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the periodic refresh is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the view refresh sweep.
    #[serde(default = "default_refresh_cron")]
    pub refresh_cron: String,
    /// Run one sweep immediately after startup.
    #[serde(default = "default_true")]
    pub refresh_on_startup: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_cron: default_refresh_cron(),
            refresh_on_startup: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_refresh_cron() -> String {
    "0 */10 * * * *".to_string()
}
