//! Application context: unified state passed to every command handler.
//!
//! Built once per invocation from the config file, the environment and the
//! global flags. Timeout overrides are parsed before the target is
//! validated, so a malformed override is reported even without a target.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::domain::{CfConfig, StartTimeouts};
use crate::infra::cloud_controller::CloudControllerClient;
use crate::infra::config::{YamlConfigStore, resolve_timeouts};
use crate::infra::log_stream::HttpLogStream;
use crate::output::{OutputContext, TerminalReporter};

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Target fields given on the command line or through the environment.
#[derive(Default)]
pub struct TargetOverrides {
    pub api: Option<String>,
    pub token: Option<String>,
    pub space_guid: Option<String>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Target overrides.
    pub target: TargetOverrides,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Loaded configuration with overrides applied.
    pub config: CfConfig,
    /// Resolved deadlines before any per-command flag.
    pub timeouts: StartTimeouts,
    /// Platform API client.
    pub cloud_controller: CloudControllerClient,
    /// Log stream transport, shared with the background tail.
    pub logs: Arc<HttpLogStream>,
}

impl AppContext {
    /// Load configuration and build the platform clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable, a timeout override
    /// is malformed, a required target field is missing, or an HTTP client
    /// cannot be built.
    pub fn new(flags: AppFlags) -> Result<Self> {
        let store = YamlConfigStore::from_env()?;
        let mut config = store.load()?;
        let timeouts = resolve_timeouts(&config)?;

        apply_overrides(&mut config, flags.target);
        config
            .target
            .validate(&store.path().display().to_string())?;
        debug!(config = %store.path().display(), ?timeouts, "configuration loaded");

        let cloud_controller = CloudControllerClient::new(&config.target)?;
        let logs = Arc::new(HttpLogStream::new(&config.target)?);

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            config,
            timeouts,
            cloud_controller,
            logs,
        })
    }

    /// Create a progress reporter styled like this context's output.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter {
        TerminalReporter::new(&self.output)
    }
}

fn apply_overrides(config: &mut CfConfig, overrides: TargetOverrides) {
    let target = &mut config.target;
    if let Some(api) = overrides.api {
        target.api_endpoint = api;
    }
    if let Some(token) = overrides.token {
        target.access_token = token;
    }
    if let Some(space_guid) = overrides.space_guid {
        target.space_guid = space_guid;
    }
}
