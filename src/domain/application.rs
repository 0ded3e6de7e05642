//! Application record as reported by the platform API.
//!
//! Records are fetched fresh after every state-changing call; nothing in
//! this module mutates one in place.

use serde::{Deserialize, Serialize};

/// Desired (requested) application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppState {
    #[default]
    Stopped,
    Started,
}

impl AppState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Started => "started",
        }
    }
}

/// Package staging state.
///
/// The platform reports intermediate values such as `STAGING`; anything
/// other than `STAGED` or `FAILED` is treated as still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PackageState {
    Staged,
    Failed,
    #[default]
    #[serde(other)]
    Pending,
}

impl PackageState {
    /// Whether staging has reached a final state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Staged | Self::Failed)
    }
}

/// Staging failure reason reported when no buildpack accepted the app.
pub const NO_APP_DETECTED_REASON: &str = "NoAppDetectedError";

/// A deployed application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Application {
    pub guid: String,
    pub name: String,
    /// Desired state.
    pub state: AppState,
    pub package_state: PackageState,
    pub staging_failed_reason: Option<String>,
    /// Start command set explicitly by the user.
    pub command: Option<String>,
    /// Start command detected by the buildpack. Only populated once staging
    /// and the first start have completed.
    pub detected_start_command: Option<String>,
    /// Desired instance count.
    pub instances: u32,
    pub memory_mb: u64,
    pub disk_quota_mb: u64,
    pub routes: Vec<String>,
}

impl Application {
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state == AppState::Started
    }

    /// Staging failure reason, or an empty string when none was reported.
    #[must_use]
    pub fn failure_reason(&self) -> &str {
        self.staging_failed_reason.as_deref().unwrap_or("")
    }
}

/// Pick the command the app was actually started with.
///
/// `before` is the record as it was before starting: when it carried no
/// explicit command, the detected command of the settled record is used.
#[must_use]
pub fn effective_start_command(before: &Application, settled: &Application) -> Option<String> {
    let explicit = before.command.as_deref().filter(|c| !c.is_empty());
    if explicit.is_none() {
        settled.detected_start_command.clone()
    } else {
        settled.command.clone()
    }
}
