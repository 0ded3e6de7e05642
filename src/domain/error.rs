//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Every start failure names the application and points
//! at the recent-logs command.

use thiserror::Error;

// ── Start errors ──────────────────────────────────────────────────────────────

/// Terminal outcomes of a start attempt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error(
        "{reason}\n\nTIP: Buildpacks are detected when the \"cf push\" is executed from \
         within the directory that contains the app source code.\n\nUse 'cf buildpacks' \
         to see a list of supported buildpacks.\n\nUse 'cf logs {app} --recent' for more \
         in depth log information."
    )]
    NoBuildpackDetected { app: String, reason: String },

    #[error("{reason}\n\nTIP: use 'cf logs {app} --recent' for more information")]
    StagingFailed { app: String, reason: String },

    #[error(
        "{app} failed to stage within {window}\n\nTIP: use 'cf logs {app} --recent' for more \
         information"
    )]
    StagingTimedOut { app: String, window: String },

    #[error(
        "Start app timeout\n\nTIP: Application must be listening on the right port. Instead of \
         hard coding the port, use the $PORT environment variable.\n\nUse 'cf logs {app} \
         --recent' for more information"
    )]
    StartupTimedOut { app: String },

    #[error("Start unsuccessful\n\nTIP: use 'cf logs {app} --recent' for more information")]
    StartUnsuccessful { app: String },

    /// A platform API call made on behalf of `app` failed.
    #[error(
        "failed to {action} {app}: {reason}\n\nTIP: use 'cf logs {app} --recent' for more \
         information"
    )]
    RequestFailed {
        app: String,
        action: &'static str,
        reason: String,
    },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for env var {name}\n{reason}")]
    InvalidEnvVar { name: String, reason: String },

    #[error("No {field} set. Add it to the target section of {path} or set {env}.")]
    MissingTarget {
        field: &'static str,
        env: &'static str,
        path: String,
    },
}
