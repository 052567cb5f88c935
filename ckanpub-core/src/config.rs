//! Publisher configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. `--config <FILE>` - explicit file, must exist
//! 2. `~/.config/ckanpub/config.yaml` (platform config dir) - global config
//! 3. Built-in defaults
//!
//! Catalog URL and API key are not part of the file; they come from
//! flags or the `CKANURL` / `CKANAPIKEY` environment variables.
//!
//! ```yaml
//! extras:
//!   delimiter: ";"
//!   include_source: false
//! http:
//!   user_agent: "ckanpub/0.1.0 (+https://github.com/CT-Data-Collaborative)"
//!   timeout_seconds: 60
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::extras::ExtrasFormat;

/// Global config file name inside the platform config directory
pub const CONFIG_FILE: &str = "config.yaml";

/// Top-level publisher configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub extras: ExtrasFormat,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Catalog client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Sent on every catalog request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout; unset leaves the transport default in place
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: None,
        }
    }
}

fn default_user_agent() -> String {
    concat!(
        "ckanpub/",
        env!("CARGO_PKG_VERSION"),
        " (+https://github.com/CT-Data-Collaborative)"
    )
    .to_string()
}

impl PublishConfig {
    /// Load configuration, preferring `explicit` over the global file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::global_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(content).context("Invalid config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extras.delimiter.is_empty() {
            anyhow::bail!("extras.delimiter must not be empty");
        }
        if self.http.user_agent.trim().is_empty() {
            anyhow::bail!("http.user_agent must not be empty");
        }
        if self.http.timeout_seconds == Some(0) {
            anyhow::bail!("http.timeout_seconds must be greater than zero");
        }
        Ok(())
    }

    /// `<platform config dir>/ckanpub/config.yaml`, if a config dir exists
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "ctdata", "ckanpub")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}
