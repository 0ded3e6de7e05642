//! Application service for the app start use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! Sequence: tail staging logs in the background, wait for the tail to be
//! ready, request the start, poll staging, stop and drain the tail, poll
//! instances, then re-fetch the settled record. The tail is drained on every
//! path once it has been spawned.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::application::ports::{
    AppRepository, InstanceRepository, LogRepository, ProgressReporter,
};
use crate::application::services::instances::wait_for_running_instance;
use crate::application::services::log_tail::LogTail;
use crate::application::services::request_failed;
use crate::application::services::staging::{StagingOutcome, wait_for_staged};
use crate::domain::application::effective_start_command;
use crate::domain::{AppState, Application, StartError, StartTimeouts};

/// Collaborators used by one start run.
///
/// The log transport and reporter are shared with the background tail task.
pub struct StartPorts<'a, A, I, L: ?Sized, R: ?Sized> {
    pub apps: &'a A,
    pub instances: &'a I,
    pub logs: Arc<L>,
    pub reporter: Arc<R>,
}

/// Who is starting what, where.
pub struct StartOptions<'a> {
    pub org_name: &'a str,
    pub space_name: &'a str,
    pub username: &'a str,
    pub timeouts: StartTimeouts,
}

/// Outcome of the `start_application` use-case.
#[derive(Debug)]
pub enum StartOutcome {
    /// The app was already in the started state; nothing was done.
    AlreadyStarted,
    /// The app staged and at least one instance is running.
    Started {
        /// Record fetched after startup completed.
        app: Application,
        /// Command the app was started with, if known.
        start_command: Option<String>,
    },
}

/// Start `app` and wait until it is running.
///
/// # Errors
///
/// Returns an error if the start request fails, staging fails or times out,
/// or no instance reaches the running state.
pub async fn start_application<A, I, L, R>(
    ports: &StartPorts<'_, A, I, L, R>,
    app: &Application,
    opts: &StartOptions<'_>,
) -> Result<StartOutcome>
where
    A: AppRepository,
    I: InstanceRepository,
    L: LogRepository + ?Sized + 'static,
    R: ProgressReporter + Send + Sync + ?Sized + 'static,
{
    if app.is_started() {
        ports
            .reporter
            .warn(&format!("App {} is already started", app.name));
        return Ok(StartOutcome::AlreadyStarted);
    }

    watch_staging(ports, app, opts.timeouts, |app| async move {
        ports.reporter.step(&format!(
            "Starting app {} in org {} / space {} as {}...",
            app.name, opts.org_name, opts.space_name, opts.username
        ));
        ports
            .apps
            .update_state(&app.guid, AppState::Started)
            .await
            .map_err(|e| request_failed(&app.name, "start app", &e))
    })
    .await
}

/// Run `start` while tailing staging logs, then wait for a running instance.
///
/// `start` receives the record as it was before starting and returns the
/// updated record.
///
/// # Errors
///
/// Returns the first error from `start`, staging, or instance polling.
pub async fn watch_staging<A, I, L, R, F, Fut>(
    ports: &StartPorts<'_, A, I, L, R>,
    app: &Application,
    timeouts: StartTimeouts,
    start: F,
) -> Result<StartOutcome>
where
    A: AppRepository,
    I: InstanceRepository,
    L: LogRepository + ?Sized + 'static,
    R: ProgressReporter + Send + Sync + ?Sized + 'static,
    F: FnOnce(Application) -> Fut,
    Fut: Future<Output = Result<Application>>,
{
    let (tail, ready) = LogTail::spawn(
        Arc::clone(&ports.logs),
        Arc::clone(&ports.reporter),
        &app.guid,
        timeouts.log_connection,
    );
    let how = ready.wait().await;
    debug!(app = %app.name, ?how, "log tail ready");

    let staged = async {
        let updated = start(app.clone()).await?;
        let outcome =
            wait_for_staged(ports.apps, &updated, timeouts.staging, timeouts.poll_interval)
                .await?;
        Ok::<_, anyhow::Error>((updated, outcome))
    }
    .await;

    tail.stop().await;
    debug!(app = %app.name, "log tail drained");
    ports.reporter.say("");

    let (updated, outcome) = staged?;
    if outcome == StagingOutcome::TimedOut {
        return Err(StartError::StagingTimedOut {
            app: app.name.clone(),
            window: timeouts.staging_window(),
        }
        .into());
    }

    wait_for_running_instance(
        ports.instances,
        &*ports.reporter,
        &updated,
        timeouts.startup,
        timeouts.poll_interval,
    )
    .await?;
    ports.reporter.success("App started");

    // The detected start command is only populated once starting completes.
    let settled = ports
        .apps
        .get_app(&updated.guid)
        .await
        .map_err(|e| request_failed(&app.name, "fetch app", &e))?;
    let start_command = effective_start_command(app, &settled);
    if let Some(cmd) = start_command.as_deref() {
        ports.reporter.say(&format!(
            "App {} was started using this command `{cmd}`",
            settled.name
        ));
    }

    Ok(StartOutcome::Started {
        app: settled,
        start_command,
    })
}
