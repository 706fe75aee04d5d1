//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use reach_core::EngineConfig;
use serde::{Deserialize, Serialize};

/// One feed location: spreadsheet id plus optional tab id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRef {
    pub sheet: String,
    #[serde(default)]
    pub tab: Option<String>,
}

/// The three feed locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub events: SourceRef,
    pub directory: SourceRef,
    pub campaigns: SourceRef,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub sources: SourcesConfig,

    /// Engine rules: campaign source allow list, excluded specialties and
    /// per-category estimator ratios.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (REACH_*)
        figment = figment.merge(Env::prefixed("REACH_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for reach.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("reach"))
}
