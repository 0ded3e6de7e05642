//! Staging status polling.

use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;
use tracing::debug;

use crate::application::ports::AppRepository;
use crate::application::services::request_failed;
use crate::domain::application::NO_APP_DETECTED_REASON;
use crate::domain::{Application, PackageState, StartError};

/// Non-error result of waiting for staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingOutcome {
    Staged,
    /// The deadline passed with staging still pending.
    TimedOut,
}

/// Poll the application until staging finishes or `deadline` elapses.
///
/// A zero deadline fetches exactly once. The deadline is measured from the
/// first fetch.
///
/// # Errors
///
/// Returns the fetch error if any status fetch fails, and a
/// [`StartError`] if staging ends in the `FAILED` state.
pub async fn wait_for_staged(
    apps: &impl AppRepository,
    app: &Application,
    deadline: Duration,
    interval: Duration,
) -> Result<StagingOutcome> {
    let started_at = Instant::now();
    let mut current = fetch(apps, app).await?;

    if !deadline.is_zero() {
        while !current.package_state.is_terminal() {
            tokio::time::sleep(interval).await;
            if started_at.elapsed() >= deadline {
                break;
            }
            current = fetch(apps, app).await?;
        }
    }

    debug!(app = %app.name, state = ?current.package_state, "staging poll finished");
    match current.package_state {
        PackageState::Staged => Ok(StagingOutcome::Staged),
        PackageState::Pending => Ok(StagingOutcome::TimedOut),
        PackageState::Failed => {
            let reason = current.failure_reason().to_owned();
            let app = app.name.clone();
            if reason == NO_APP_DETECTED_REASON {
                Err(StartError::NoBuildpackDetected { app, reason }.into())
            } else {
                Err(StartError::StagingFailed { app, reason }.into())
            }
        }
    }
}

async fn fetch(apps: &impl AppRepository, app: &Application) -> Result<Application> {
    apps.get_app(&app.guid)
        .await
        .map_err(|e| request_failed(&app.name, "fetch staging status for", &e))
}
