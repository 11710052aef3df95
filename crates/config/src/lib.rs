//! Configuration loading and validation.
//!
//! Configuration is layered, later sources winning:
//!
//! 1. Built-in defaults.
//! 2. A configuration file: the path given explicitly, otherwise
//!    `config.toml` in the platform configuration directory (if it exists).
//!    TOML, YAML and JSON are understood, picked by file extension.
//! 3. Environment variables: `NSRL_DB_*` for the `db` section and
//!    `NSRL_UI_*` for the `ui` section (e.g. `NSRL_DB_FILEPATH`,
//!    `NSRL_UI_MAX_RESULTS`).

pub mod error;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::error::{ErrorKind, Result};

const DEFAULT_DATASET: &str = "./rdsv3_modern_minimal.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db: DbConfig,
    pub ui: UiConfig,
}

/// Where the reference dataset lives, and how many readers may share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub filepath: PathBuf,
    pub max_connections: u32,
}
impl Default for DbConfig {
    fn default() -> Self {
        Self {
            filepath: PathBuf::from(DEFAULT_DATASET),
            max_connections: nsrl_dataset::MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Upper bound on the package detail rows shown in a summary.
    pub max_results: usize,
}
impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_results: nsrl_dataset::DEFAULT_MAX_RESULTS,
        }
    }
}

impl Config {
    /// Load, merge and validate configuration from every source.
    #[instrument(skip_all)]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(file)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// The merged (but not yet extracted) configuration sources.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_file().filter(|path| path.is_file()),
        };
        if let Some(path) = file {
            debug!(path = %path.display(), "merging configuration file");
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                other => exn::bail!(ErrorKind::UnsupportedFormat(other.unwrap_or_default().to_string())),
            };
        }
        Ok(figment
            .merge(Env::prefixed("NSRL_DB_").map(|key| format!("db.{key}").into()))
            .merge(Env::prefixed("NSRL_UI_").map(|key| format!("ui.{key}").into())))
    }

    /// `config.toml` in the platform configuration directory.
    pub fn default_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "nsrl").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.db.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid("db.max_connections must be at least 1"));
        }
        if self.ui.max_results == 0 {
            exn::bail!(ErrorKind::Invalid("ui.max_results must be at least 1"));
        }
        Ok(())
    }
}
