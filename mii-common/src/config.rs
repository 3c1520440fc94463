//! Configuration for loading and exporting (`mii.toml`)
//!
//! Every field has a default, so an empty file or a missing section is valid.
//!
//! ```toml
//! [load]
//! max_file_bytes = 16777216
//!
//! [export]
//! extension = "mii"
//! skip_empty = false
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use mii_shared::fs::MAX_DATABASE_BYTES;
use serde::{Deserialize, Serialize};

/// Toolkit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database loading settings
    #[serde(default)]
    pub load: LoadConfig,
    /// Standalone export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Database loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Refuse database files larger than this (default: 16 MiB)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

/// Batch export configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// File extension without dot (default: "mii")
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Leave empty and malformed slots out of batch exports (default: false)
    #[serde(default)]
    pub skip_empty: bool,
}

fn default_max_file_bytes() -> u64 {
    MAX_DATABASE_BYTES
}
fn default_extension() -> String {
    "mii".to_string()
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            skip_empty: false,
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse Mii config")
    }

    /// Serialize to a TOML document.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize Mii config")
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_toml_string()?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}
