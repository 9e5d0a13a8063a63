//! Module: config
//! Responsibility: the `sluice.toml` surface shared by build scripts and
//! runtime datasource setup.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// SluiceConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SluiceConfig {
    #[serde(default)]
    pub datasource: Option<DatasourceConfig>,

    #[serde(default)]
    pub build: BuildConfig,
}

impl SluiceConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&source)
    }
}

///
/// DatasourceConfig
///
/// Where a driver connects. `modifier` is an opaque driver-specific
/// suffix (connection flags, pragmas) appended by the driver.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatasourceConfig {
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub modifier: Option<String>,
}

///
/// BuildConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Descriptor document, relative to the crate manifest.
    #[serde(default = "BuildConfig::default_descriptor")]
    pub descriptor: PathBuf,

    /// Generated file name inside `OUT_DIR`.
    #[serde(default = "BuildConfig::default_output")]
    pub output: String,
}

impl BuildConfig {
    fn default_descriptor() -> PathBuf {
        PathBuf::from("sluice.json")
    }

    fn default_output() -> String {
        "sluice.rs".to_string()
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            descriptor: Self::default_descriptor(),
            output: Self::default_output(),
        }
    }
}
