//! Shared test doubles for the start services.
//!
//! Scripted repositories hand out queued responses in order and repeat the
//! last successful one once the queue runs dry.

#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};

use crate::application::ports::{
    AppRepository, InstanceRepository, LogRepository, LogSinks, ProgressReporter,
};
use crate::domain::{AppState, Application, InstanceRecord, LogMessage, PackageState};

// ── Reporter ─────────────────────────────────────────────────────────────────

/// Reporter that records every line by kind.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    fn record(&self, kind: &'static str, message: &str) {
        self.events
            .lock()
            .expect("reporter lock")
            .push((kind, message.to_owned()));
    }

    fn of_kind(&self, kind: &str) -> Vec<String> {
        self.events
            .lock()
            .expect("reporter lock")
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn said(&self) -> Vec<String> {
        self.of_kind("say")
    }

    pub fn warnings(&self) -> Vec<String> {
        self.of_kind("warn")
    }
}

impl ProgressReporter for RecordingReporter {
    fn say(&self, message: &str) {
        self.record("say", message);
    }
    fn step(&self, message: &str) {
        self.record("step", message);
    }
    fn success(&self, message: &str) {
        self.record("success", message);
    }
    fn warn(&self, message: &str) {
        self.record("warn", message);
    }
}

// ── Log transport ────────────────────────────────────────────────────────────

/// Log transport driven by hand from the test body.
pub struct ScriptedLogs {
    on_connect: Mutex<Option<oneshot::Sender<()>>>,
    messages: Mutex<Option<mpsc::Sender<LogMessage>>>,
    errors: Mutex<Option<mpsc::Sender<anyhow::Error>>>,
    subscriptions: AtomicUsize,
    closes: AtomicUsize,
    /// On close, report one error and keep the stream open until `end()`.
    trailing_error: bool,
}

impl ScriptedLogs {
    /// Transport that ends its stream as soon as it is closed.
    pub fn ending_on_close() -> Self {
        Self::build(false)
    }

    /// Transport that reports an error on close and keeps streaming.
    pub fn with_trailing_error() -> Self {
        Self::build(true)
    }

    fn build(trailing_error: bool) -> Self {
        Self {
            on_connect: Mutex::new(None),
            messages: Mutex::new(None),
            errors: Mutex::new(None),
            subscriptions: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            trailing_error,
        }
    }

    pub async fn wait_subscribed(&self) {
        while self.subscriptions.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.messages.lock().expect("logs lock").is_some()
    }

    pub fn connect(&self) {
        if let Some(tx) = self.on_connect.lock().expect("logs lock").take() {
            let _ = tx.send(());
        }
    }

    pub fn emit(&self, source: &str, message: &str) {
        if let Some(tx) = self.messages.lock().expect("logs lock").as_ref() {
            let _ = tx.try_send(LogMessage::new(source, message));
        }
    }

    pub fn fail(&self, message: &str) {
        if let Some(tx) = self.errors.lock().expect("logs lock").as_ref() {
            let _ = tx.try_send(anyhow::anyhow!(message.to_owned()));
        }
    }

    /// Drop every sink, ending the stream.
    pub fn end(&self) {
        self.on_connect.lock().expect("logs lock").take();
        self.messages.lock().expect("logs lock").take();
        self.errors.lock().expect("logs lock").take();
    }
}

impl LogRepository for ScriptedLogs {
    fn tail_logs_for(&self, _app_guid: &str, sinks: LogSinks) {
        *self.on_connect.lock().expect("logs lock") = Some(sinks.on_connect);
        *self.messages.lock().expect("logs lock") = Some(sinks.messages);
        *self.errors.lock().expect("logs lock") = Some(sinks.errors);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.trailing_error {
            self.fail("websocket: close sent");
        } else {
            self.end();
        }
    }
}

// ── Platform API ─────────────────────────────────────────────────────────────

/// Scripted response: a record or an error message.
pub type Scripted<T> = std::result::Result<T, String>;

fn next<T: Clone>(queue: &Mutex<VecDeque<Scripted<T>>>, last: &Mutex<Option<T>>) -> Result<T> {
    let popped = queue.lock().expect("stub lock").pop_front();
    match popped {
        Some(Ok(value)) => {
            *last.lock().expect("stub lock") = Some(value.clone());
            Ok(value)
        }
        Some(Err(msg)) => anyhow::bail!(msg),
        None => last
            .lock()
            .expect("stub lock")
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no scripted response")),
    }
}

/// Application repository returning scripted `get_app` responses.
pub struct StubApps {
    app: Application,
    fetches: Mutex<VecDeque<Scripted<Application>>>,
    last: Mutex<Option<Application>>,
    get_calls: AtomicUsize,
}

impl StubApps {
    pub fn new(app: Application, fetches: Vec<Scripted<Application>>) -> Self {
        Self {
            app,
            fetches: Mutex::new(fetches.into()),
            last: Mutex::new(None),
            get_calls: AtomicUsize::new(0),
        }
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

impl AppRepository for StubApps {
    async fn find_by_name(&self, _name: &str) -> Result<Application> {
        Ok(self.app.clone())
    }

    async fn get_app(&self, _guid: &str) -> Result<Application> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.fetches, &self.last)
    }

    async fn update_state(&self, _guid: &str, state: AppState) -> Result<Application> {
        Ok(Application {
            state,
            ..self.app.clone()
        })
    }
}

/// Instance repository returning scripted listings.
pub struct StubInstances {
    fetches: Mutex<VecDeque<Scripted<Vec<InstanceRecord>>>>,
    last: Mutex<Option<Vec<InstanceRecord>>>,
    calls: AtomicUsize,
}

impl StubInstances {
    pub fn new(fetches: Vec<Scripted<Vec<InstanceRecord>>>) -> Self {
        Self {
            fetches: Mutex::new(fetches.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InstanceRepository for StubInstances {
    async fn get_instances(&self, _guid: &str) -> Result<Vec<InstanceRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        next(&self.fetches, &self.last)
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn stopped_app(name: &str) -> Application {
    Application {
        guid: format!("{name}-guid"),
        name: name.to_owned(),
        instances: 1,
        ..Application::default()
    }
}

pub fn with_package(app: &Application, state: PackageState) -> Application {
    Application {
        package_state: state,
        ..app.clone()
    }
}
