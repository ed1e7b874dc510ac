//! TOML configuration for `twemctl`.
//!
//! With no `--config` flag the default location
//! (`$XDG_CONFIG_HOME/twemctl/twemctl.toml` or the platform equivalent) is
//! tried; a missing file means built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use twem_router::RouterConfig;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Cluster layout, handed to the router as-is.
    pub cluster: RouterConfig,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from `path`, or from the default location if it exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::read(p),
            None => match default_path() {
                Some(p) if p.is_file() => Self::read(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&content)?;
        config.cluster.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Where `twemctl` looks for its config when none is given.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("twemctl").join("twemctl.toml"))
}
