//! # phyto-config
//!
//! Layered configuration loading for Phyto using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`PHYTO_*` prefix, `__` as separator)
//! 2. Project-level `.phyto/config.toml`
//! 3. User-level `~/.config/phyto/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `PHYTO_VISION__API_KEY` -> `vision.api_key`,
//! `PHYTO_DIAGNOSIS__KB_ACCEPTANCE_THRESHOLD` -> `diagnosis.kb_acceptance_threshold`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use phyto_config::PhytoConfig;
//!
//! let config = PhytoConfig::load_with_dotenv().expect("config");
//! if !config.vision.is_configured() {
//!     println!("AI tier disabled; only knowledge base and cache will answer");
//! }
//! ```

mod database;
mod diagnosis;
mod error;
mod sweeper;
mod vision;

pub use database::DatabaseConfig;
pub use diagnosis::{DiagnosisConfig, MAX_CACHE_TTL_HOURS};
pub use error::ConfigError;
pub use sweeper::SweeperConfig;
pub use vision::VisionConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PhytoConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub diagnosis: DiagnosisConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

impl PhytoConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is out of range.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Extract and validate a config from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is out of range.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.diagnosis.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".phyto/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("PHYTO_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("phyto").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if set) looking for `.env`, then
    /// falls back to the current directory. Missing files are ignored.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}
