//! Configuration for the clinic application.
//!
//! Sources, later ones overriding earlier ones:
//! - Default values
//! - `clinic.toml` / `.clinic.toml` in the working directory
//! - `clinic.toml` in the platform config directory
//! - An explicitly given file
//! - Environment variables (`VETCLINIC__STORE__PATH`, ...)
//!
//! ## Example config file (clinic.toml):
//! ```toml
//! [store]
//! path = "data/clinic.json"
//! backup = true
//!
//! [input]
//! max_attempts = 3
//! ```

use std::path::PathBuf;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub input: InputConfig,
}

/// Where the registry is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the JSON store file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Copy the previous file to `<path>.backup` before overwriting it
    #[serde(default = "default_true")]
    pub backup: bool,
}

/// Interactive input settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// How many invalid answers a prompt accepts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("clinic.json")
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            backup: true,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl ClinicConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding `config_path` as a required source
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["clinic.toml", ".clinic.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("org", "vetclinic", "vet-clinic") {
            let xdg_config = dirs.config_dir().join("clinic.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("VETCLINIC")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
