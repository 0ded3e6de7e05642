//! Config file and environment access.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::config::{STAGING_TIMEOUT_ENV, STARTUP_TIMEOUT_ENV};
use crate::domain::{CfConfig, StartTimeouts};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "CF_START_CONFIG";

/// Configuration stored as a YAML file on disk.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    /// Store at `$CF_START_CONFIG`, or `~/.cf-start/config.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        if let Ok(val) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(Self::with_path(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".cf-start").join("config.yaml")))
    }

    /// Store at an explicit path.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<CfConfig> {
        if !self.path.exists() {
            return Ok(CfConfig::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", self.path.display()))
    }
}

/// Timeouts from the config file with the environment overrides applied.
///
/// # Errors
///
/// Returns an error if `CF_STAGING_TIMEOUT` or `CF_STARTUP_TIMEOUT` is set
/// to something other than a whole number of minutes.
pub fn resolve_timeouts(config: &CfConfig) -> Result<StartTimeouts> {
    let staging = std::env::var(STAGING_TIMEOUT_ENV).ok();
    let startup = std::env::var(STARTUP_TIMEOUT_ENV).ok();
    let timeouts = StartTimeouts::from_config(&config.timeouts)
        .with_env_overrides(staging.as_deref(), startup.as_deref())?;
    Ok(timeouts)
}
