//! Background tail of an application's staging logs.
//!
//! The tail runs as one spawned task and talks to its caller through three
//! single-use signals:
//!
//! - **ready** (task → caller, exactly once): the transport connected, or the
//!   task gave up waiting for it.
//! - **stop** (caller → task, at most once): buffered with capacity one so
//!   the caller never blocks, even when the task has already exited.
//! - **done** (task → caller, exactly once): the task has exited. Fired by a
//!   drop guard, so every exit path delivers it.
//!
//! Connection status is local to the task; nothing outside it reads it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::application::ports::{LogRepository, LogSinks, ProgressReporter};
use crate::domain::ConnectionStatus;

/// Buffered log lines between the transport and the tail task.
const LOG_BUFFER: usize = 64;

/// How the tail became ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTailReady {
    /// The transport confirmed a live connection.
    Connected,
    /// No connection; the start proceeds without logs.
    GaveUp,
}

/// Write-once notification that the tail is ready.
pub struct ReadySignal(oneshot::Receiver<LogTailReady>);

impl ReadySignal {
    /// Wait until the tail has connected or given up.
    pub async fn wait(self) -> LogTailReady {
        self.0.await.unwrap_or(LogTailReady::GaveUp)
    }
}

/// Caller-side handle on the running tail task.
///
/// Dropping the handle closes the stop channel, which the task treats as a
/// request to exit.
pub struct LogTail {
    stop: mpsc::Sender<()>,
    done: oneshot::Receiver<()>,
}

impl LogTail {
    /// Spawn the tail task for `app_guid`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<L, R>(
        logs: Arc<L>,
        reporter: Arc<R>,
        app_guid: &str,
        connection_timeout: Duration,
    ) -> (Self, ReadySignal)
    where
        L: LogRepository + ?Sized + 'static,
        R: ProgressReporter + Send + Sync + ?Sized + 'static,
    {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();

        let signals = Signals {
            ready: Some(ready_tx),
            done: Some(done_tx),
        };
        tokio::spawn(tail(
            logs,
            reporter,
            app_guid.to_owned(),
            connection_timeout,
            stop_rx,
            signals,
        ));

        (
            Self {
                stop: stop_tx,
                done: done_rx,
            },
            ReadySignal(ready_rx),
        )
    }

    /// Ask the task to stop, then wait until it has exited.
    pub async fn stop(self) {
        // Full buffer or closed channel: a stop is already queued or the task is gone.
        let _ = self.stop.try_send(());
        let _ = self.done.await;
    }

    /// Wait for the task to exit on its own.
    #[cfg(test)]
    pub async fn finished(self) {
        let Self { stop, done } = self;
        let _ = done.await;
        drop(stop);
    }
}

/// Ready/done senders owned by the task.
///
/// On drop, ready is resolved as `GaveUp` if it never fired, then done fires.
struct Signals {
    ready: Option<oneshot::Sender<LogTailReady>>,
    done: Option<oneshot::Sender<()>>,
}

impl Signals {
    fn ready(&mut self, how: LogTailReady) {
        if let Some(tx) = self.ready.take() {
            let _ = tx.send(how);
        }
    }
}

impl Drop for Signals {
    fn drop(&mut self) {
        self.ready(LogTailReady::GaveUp);
        if let Some(tx) = self.done.take() {
            let _ = tx.send(());
        }
    }
}

async fn tail<L, R>(
    logs: Arc<L>,
    reporter: Arc<R>,
    app_guid: String,
    connection_timeout: Duration,
    mut stop: mpsc::Receiver<()>,
    mut signals: Signals,
) where
    L: LogRepository + ?Sized,
    R: ProgressReporter + ?Sized,
{
    let mut status = ConnectionStatus::NotConnected;

    let (connect_tx, mut connected) = oneshot::channel();
    let (message_tx, mut messages) = mpsc::channel(LOG_BUFFER);
    let (error_tx, mut errors) = mpsc::channel(LOG_BUFFER);

    let timer = tokio::time::sleep(connection_timeout);
    tokio::pin!(timer);
    let mut timer_armed = true;
    let mut awaiting_connect = true;
    let mut errors_open = true;

    debug!(%app_guid, "tailing staging logs");
    logs.tail_logs_for(
        &app_guid,
        LogSinks {
            on_connect: connect_tx,
            messages: message_tx,
            errors: error_tx,
        },
    );

    loop {
        tokio::select! {
            () = &mut timer, if timer_armed => {
                timer_armed = false;
                if status == ConnectionStatus::NotConnected {
                    status = ConnectionStatus::GaveUp;
                    debug!(?status, "log server connection deadline passed");
                    reporter.warn("timeout connecting to log server, no log will be shown");
                    signals.ready(LogTailReady::GaveUp);
                    break;
                }
            }
            res = &mut connected, if awaiting_connect => {
                awaiting_connect = false;
                if res.is_ok() && status == ConnectionStatus::NotConnected {
                    status = ConnectionStatus::Connected;
                    debug!("log server connected");
                    signals.ready(LogTailReady::Connected);
                }
            }
            msg = messages.recv() => {
                let Some(msg) = msg else {
                    debug!(?status, "log stream ended");
                    break;
                };
                if msg.is_staging() {
                    reporter.say(&msg.message);
                }
            }
            err = errors.recv(), if errors_open => match err {
                None => errors_open = false,
                Some(err) if status == ConnectionStatus::Closed => {
                    debug!(error = %err, "ignoring log stream error after close");
                }
                Some(err) => {
                    warn!(error = %err, "log stream failed");
                    reporter.warn(&format!("error tailing logs: {err}"));
                    signals.ready(LogTailReady::GaveUp);
                    break;
                }
            },
            req = stop.recv() => {
                if req.is_some() && status == ConnectionStatus::Connected {
                    status = ConnectionStatus::Closed;
                    debug!("closing log stream");
                    logs.close();
                } else {
                    break;
                }
            }
        }
    }

    // Release a subscription that never connected; its request may still be pending.
    if matches!(
        status,
        ConnectionStatus::NotConnected | ConnectionStatus::GaveUp
    ) {
        logs.close();
    }
}
