//! Instance polling after staging.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::ports::{InstanceRepository, ProgressReporter};
use crate::domain::{Application, InstanceSnapshot, StartError};

/// Poll instances until one is running.
///
/// Fetch failures are reported and retried; only the deadline bounds them.
/// Every successful fetch emits a progress line.
///
/// # Errors
///
/// Returns [`StartError::StartupTimedOut`] when `deadline` passes and
/// [`StartError::StartUnsuccessful`] as soon as an instance is flapping or
/// crashed.
pub async fn wait_for_running_instance<I, R>(
    instances: &I,
    reporter: &R,
    app: &Application,
    deadline: Duration,
    interval: Duration,
) -> Result<()>
where
    I: InstanceRepository,
    R: ProgressReporter + ?Sized,
{
    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    loop {
        let fetched = tokio::select! {
            biased;
            () = &mut timer => return Err(timed_out(app)),
            res = instances.get_instances(&app.guid) => res,
        };

        match fetched {
            Err(e) => {
                warn!(app = %app.name, error = %e, "instance fetch failed");
                reporter.warn(&format!("Could not fetch instance count: {e}"));
            }
            Ok(records) => {
                let snapshot = InstanceSnapshot::from_instances(&records);
                reporter.say(&snapshot.details_line());
                debug!(?snapshot, "instance poll");

                if snapshot.has_running() {
                    return Ok(());
                }
                if snapshot.has_failures() {
                    return Err(StartError::StartUnsuccessful {
                        app: app.name.clone(),
                    }
                    .into());
                }
            }
        }

        tokio::select! {
            biased;
            () = &mut timer => return Err(timed_out(app)),
            () = tokio::time::sleep(interval) => {}
        }
    }
}

fn timed_out(app: &Application) -> anyhow::Error {
    StartError::StartupTimedOut {
        app: app.name.clone(),
    }
    .into()
}
