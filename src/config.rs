//! Export Configuration
//!
//! Loaded from a camelCase JSON file. Every field has a default, so a
//! missing file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::DEFAULT_TARGET_PATH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What to do when the host hands over zero tiles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    Block,
    #[default]
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_target_path")]
    pub target_path: PathBuf,
    #[serde(default = "default_true")]
    pub write_manifest: bool,
    #[serde(default)]
    pub empty_policy: EmptyPolicy,
}

fn default_output_root() -> PathBuf { PathBuf::from(".") }
fn default_target_path() -> PathBuf { PathBuf::from(DEFAULT_TARGET_PATH) }
fn default_true() -> bool { true }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            target_path: default_target_path(),
            write_manifest: true,
            empty_policy: EmptyPolicy::default(),
        }
    }
}

impl ExportConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Target under the output root. An absolute `target_path` ignores the root.
    pub fn resolved_target(&self) -> PathBuf {
        self.output_root.join(&self.target_path)
    }
}
