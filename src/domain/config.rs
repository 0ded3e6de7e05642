//! Domain types and validators for cf-start configuration.
//!
//! Pure functions only; no I/O.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_STAGING_TIMEOUT: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_LOG_CONNECTION_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Environment variable overriding the staging deadline, in minutes.
pub const STAGING_TIMEOUT_ENV: &str = "CF_STAGING_TIMEOUT";
/// Environment variable overriding the startup deadline, in minutes.
pub const STARTUP_TIMEOUT_ENV: &str = "CF_STARTUP_TIMEOUT";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.cf-start/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CfConfig {
    /// Targeted API, org and space.
    pub target: TargetConfig,
    /// Timeout overrides.
    pub timeouts: TimeoutConfig,
}

/// Targeted platform endpoint and space.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TargetConfig {
    /// Cloud Controller API endpoint, e.g. `https://api.example.com`.
    pub api_endpoint: String,
    /// Log streaming endpoint. Falls back to the API endpoint when empty.
    pub logging_endpoint: String,
    /// OAuth bearer token.
    pub access_token: String,
    pub organization: String,
    pub space: String,
    pub space_guid: String,
    pub username: String,
}

impl TargetConfig {
    /// Check that the fields needed to reach the platform are present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingTarget` naming the first empty field.
    pub fn validate(&self, path: &str) -> Result<(), ConfigError> {
        let required = [
            (&self.api_endpoint, "API endpoint", "CF_API"),
            (&self.access_token, "access token", "CF_TOKEN"),
            (&self.space_guid, "targeted space", "CF_SPACE_GUID"),
        ];
        for (value, field, env) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingTarget {
                    field,
                    env,
                    path: path.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Log endpoint to stream from.
    #[must_use]
    pub fn log_endpoint(&self) -> &str {
        if self.logging_endpoint.is_empty() {
            &self.api_endpoint
        } else {
            &self.logging_endpoint
        }
    }
}

/// Optional timeout overrides from the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    pub staging_minutes: Option<u64>,
    pub startup_minutes: Option<u64>,
    pub log_connection_seconds: Option<u64>,
    pub poll_interval_seconds: Option<u64>,
}

// ── Resolved timeouts ────────────────────────────────────────────────────────

/// Deadlines and poll interval used by one start run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTimeouts {
    /// How long to wait for staging to finish. Zero checks once.
    pub staging: Duration,
    /// How long to wait for the first running instance.
    pub startup: Duration,
    /// How long to wait for the log server before giving up on logs.
    pub log_connection: Duration,
    /// Pause between status polls.
    pub poll_interval: Duration,
}

impl Default for StartTimeouts {
    fn default() -> Self {
        Self {
            staging: DEFAULT_STAGING_TIMEOUT,
            startup: DEFAULT_STARTUP_TIMEOUT,
            log_connection: DEFAULT_LOG_CONNECTION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl StartTimeouts {
    /// Defaults with the config-file overrides applied.
    #[must_use]
    pub fn from_config(cfg: &TimeoutConfig) -> Self {
        let defaults = Self::default();
        Self {
            staging: cfg.staging_minutes.map_or(defaults.staging, minutes),
            startup: cfg.startup_minutes.map_or(defaults.startup, minutes),
            log_connection: cfg
                .log_connection_seconds
                .map_or(defaults.log_connection, Duration::from_secs),
            // Polls are at least one second apart.
            poll_interval: cfg
                .poll_interval_seconds
                .map_or(defaults.poll_interval, |secs| Duration::from_secs(secs.max(1))),
        }
    }

    /// Apply `CF_STAGING_TIMEOUT` / `CF_STARTUP_TIMEOUT` values (minutes).
    ///
    /// Unset or empty values leave the current deadline untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a value is not a whole number.
    pub fn with_env_overrides(
        mut self,
        staging: Option<&str>,
        startup: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(m) = parse_minutes(STAGING_TIMEOUT_ENV, staging)? {
            self.staging = minutes(m);
        }
        if let Some(m) = parse_minutes(STARTUP_TIMEOUT_ENV, startup)? {
            self.startup = minutes(m);
        }
        Ok(self)
    }

    /// Override the startup deadline with a value in seconds (`start -t`).
    #[must_use]
    pub fn with_startup_secs(mut self, secs: u64) -> Self {
        self.startup = Duration::from_secs(secs);
        self
    }

    /// Staging deadline for messages: whole minutes, or seconds below one minute.
    #[must_use]
    pub fn staging_window(&self) -> String {
        let secs = self.staging.as_secs();
        if secs >= 60 && secs % 60 == 0 {
            format!("{} minutes", secs / 60)
        } else {
            format!("{secs} seconds")
        }
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

fn parse_minutes(name: &str, value: Option<&str>) -> Result<Option<u64>, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                name: name.to_owned(),
                reason: e.to_string(),
            }),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
