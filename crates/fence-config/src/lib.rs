//! # fence-config
//!
//! Layered configuration loading for Fenceline using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`FENCELINE_*` prefix, `__` as separator)
//! 2. Project-level `.fenceline/config.toml`
//! 3. User-level `~/.config/fenceline/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `FENCELINE_INDEX__GRID_SIZE` -> `index.grid_size`,
//! `FENCELINE_EPOCH__INTERVAL_SECS` -> `epoch.interval_secs`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use fence_config::FenceConfig;
//!
//! let config = FenceConfig::load_with_dotenv().expect("config");
//! println!("grid size: {}", config.index.grid_size);
//! ```

mod epoch;
mod error;
mod index;
mod store;

pub use epoch::EpochConfig;
pub use error::ConfigError;
pub use index::IndexConfig;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-local configuration directory.
pub const PROJECT_DIR: &str = ".fenceline";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FenceConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub epoch: EpochConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl FenceConfig {
    /// Load and validate configuration from all sources (TOML files + environment).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` on malformed sources and
    /// `ConfigError::InvalidValue` when a value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment (tests layer their own providers).
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(PROJECT_DIR).join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("FENCELINE_").split("__"))
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.index.validate()?;
        self.epoch.validate()
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fenceline").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FenceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.path, ".fenceline/fenceline.db");
    }

    #[test]
    fn figment_builds_without_files() {
        let config: FenceConfig = FenceConfig::figment()
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.epoch.interval_secs, 300);
        assert_eq!(config.index.max_cells_per_zone, 4096);
    }
}
