//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_page;
mod schema_runtime;

pub use schema_page::*;
pub use schema_runtime::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub selectors: SelectorsConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Browser connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Chrome remote debugging endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// The tab to attach to is the first whose URL starts with this.
    #[serde(default = "default_target_url")]
    pub target_url: String,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            target_url: default_target_url(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_target_url() -> String {
    "https://chatgpt.com".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
