//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};

use crate::domain::{AppState, Application, InstanceRecord, LogMessage};

// ── Platform API Ports ────────────────────────────────────────────────────────

/// Application records on the platform API.
#[allow(async_fn_in_trait)]
pub trait AppRepository {
    /// Look an application up by name in the targeted space.
    async fn find_by_name(&self, name: &str) -> Result<Application>;
    /// Fetch the current record for `guid`.
    async fn get_app(&self, guid: &str) -> Result<Application>;
    /// Set the desired state and return the updated record.
    async fn update_state(&self, guid: &str, state: AppState) -> Result<Application>;
}

/// Instance listings on the platform API.
#[allow(async_fn_in_trait)]
pub trait InstanceRepository {
    /// Fetch every instance of the application, in index order.
    async fn get_instances(&self, guid: &str) -> Result<Vec<InstanceRecord>>;
}

// ── Log Stream Port ───────────────────────────────────────────────────────────

/// Channels a log transport delivers into.
///
/// The transport owns the senders. Dropping `messages` ends the stream.
pub struct LogSinks {
    /// Fired once the transport has a live connection.
    pub on_connect: oneshot::Sender<()>,
    pub messages: mpsc::Sender<LogMessage>,
    pub errors: mpsc::Sender<anyhow::Error>,
}

/// Streaming log subscription.
///
/// Shared with the background tail task, hence sync and `Send + Sync`.
/// After `close()` the transport is expected to end the message stream and
/// may report exactly one trailing error, which the tailer ignores.
pub trait LogRepository: Send + Sync {
    /// Begin tailing logs for `app_guid`. Returns immediately; the transport
    /// runs in its own task.
    fn tail_logs_for(&self, app_guid: &str, sinks: LogSinks);
    /// Close the current subscription.
    fn close(&self);
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressReporter {
    /// Emit a plain line (log output, blank separators).
    fn say(&self, message: &str);
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
