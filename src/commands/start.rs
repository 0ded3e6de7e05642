//! `cf-start start`: start an app and wait until it is running.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{AppRepository, InstanceRepository};
use crate::application::services::app_start::{
    self as service, StartOptions, StartOutcome, StartPorts,
};
use crate::output::HumanRenderer;
use crate::output::human::Target;

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    /// Name of the app to start
    pub app_name: String,

    /// Max wait time for app instance startup, in seconds
    #[arg(short = 't', long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Run `cf-start start`.
///
/// # Errors
///
/// Returns an error if the app cannot be found, fails to stage, or never
/// reaches a running instance.
pub async fn run(args: &StartArgs, app: &AppContext) -> Result<()> {
    let timeouts = args
        .timeout
        .map_or(app.timeouts, |secs| app.timeouts.with_startup_secs(secs));
    let target = &app.config.target;

    let record = app
        .cloud_controller
        .find_by_name(&args.app_name)
        .await
        .with_context(|| format!("cannot look up app {}", args.app_name))?;

    let ports = StartPorts {
        apps: &app.cloud_controller,
        instances: &app.cloud_controller,
        logs: Arc::clone(&app.logs),
        reporter: Arc::new(app.terminal_reporter()),
    };
    let opts = StartOptions {
        org_name: &target.organization,
        space_name: &target.space,
        username: &target.username,
        timeouts,
    };

    match service::start_application(&ports, &record, &opts).await? {
        StartOutcome::AlreadyStarted => {}
        StartOutcome::Started {
            app: settled,
            start_command,
        } => {
            let instances = app
                .cloud_controller
                .get_instances(&settled.guid)
                .await
                .context("fetching instances for summary")?;
            HumanRenderer::new(&app.output).render_app_summary(
                &settled,
                &instances,
                start_command.as_deref(),
                &Target {
                    org: &target.organization,
                    space: &target.space,
                    username: &target.username,
                },
            );
        }
    }

    Ok(())
}
