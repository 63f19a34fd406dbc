//! Settings for the `odata` command line tool.
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (optional)
//! 3. `ODATA_*` environment variables, e.g. `ODATA_SERVICE_ROOT`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVICE_ROOT: &str = "http://localhost:8080/odata";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const ENV_PREFIX: &str = "ODATA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL rendered URIs are resolved against
    #[serde(default = "default_service_root")]
    pub service_root: String,

    /// JSON dataset backing the in-memory data services
    #[serde(default)]
    pub dataset: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_service_root() -> String {
    DEFAULT_SERVICE_ROOT.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_root: default_service_root(),
            dataset: None,
            log_level: default_log_level(),
            log_dir: default_log_dir(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Settings>())
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Resolve a relative resource URI against the service root
    pub fn absolute_uri(&self, relative: &str) -> String {
        let root = self.service_root.trim_end_matches('/');
        if relative.is_empty() {
            root.to_string()
        } else if relative.starts_with('?') {
            format!("{}/{}", root, relative)
        } else {
            format!("{}/{}", root, relative.trim_start_matches('/'))
        }
    }

    /// Effective settings as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::SerializationError(e.to_string()))
    }
}
