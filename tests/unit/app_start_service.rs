//! Start use-case scenarios driven through in-memory ports.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use cf_start::application::services::app_start::{
    StartOptions, StartOutcome, StartPorts, start_application,
};
use cf_start::domain::{
    AppState, Application, InstanceState, LogMessage, PackageState, StartError, StartTimeouts,
};

use crate::helpers::{
    DETECTED_COMMAND, EventReporter, Events, FakeApps, FakeInstances, FakeLogs, instances,
    stopped_app, timeouts,
};

fn options(timeouts: StartTimeouts) -> StartOptions<'static> {
    StartOptions {
        org_name: "acme",
        space_name: "dev",
        username: "alice",
        timeouts,
    }
}

async fn run(
    apps: &FakeApps,
    insts: &FakeInstances,
    logs: FakeLogs,
    events: &Events,
    timeouts: StartTimeouts,
) -> anyhow::Result<StartOutcome> {
    let ports = StartPorts {
        apps,
        instances: insts,
        logs: Arc::new(logs),
        reporter: Arc::new(EventReporter(events.clone())),
    };
    start_application(&ports, &apps.app, &options(timeouts)).await
}

fn staging_line(text: &str) -> LogMessage {
    LogMessage::new("STG", text)
}

#[tokio::test(start_paused = true)]
async fn already_started_app_returns_without_logs_or_polling() {
    let events = Events::default();
    let app = Application {
        state: AppState::Started,
        ..stopped_app()
    };
    let apps = FakeApps::new(app, &[PackageState::Staged], &events);
    let insts = FakeInstances::new(vec![instances(&[InstanceState::Running])], &events);
    let logs = FakeLogs::connecting(Vec::new(), &events);

    let outcome = run(&apps, &insts, logs, &events, timeouts()).await.unwrap();

    assert!(matches!(outcome, StartOutcome::AlreadyStarted));
    assert_eq!(events.all(), vec!["warn:App web is already started".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn start_relays_staging_logs_and_drains_before_instance_polling() {
    let events = Events::default();
    let apps = FakeApps::new(
        stopped_app(),
        &[PackageState::Pending, PackageState::Pending, PackageState::Staged],
        &events,
    );
    let insts = FakeInstances::new(
        vec![
            instances(&[InstanceState::Starting]),
            instances(&[InstanceState::Running]),
        ],
        &events,
    );
    let logs = FakeLogs::connecting(
        vec![
            staging_line("-----> Downloaded app package (4.0K)"),
            LogMessage::new("APP", "not shown"),
        ],
        &events,
    );

    let outcome = run(&apps, &insts, logs, &events, timeouts()).await.unwrap();

    let StartOutcome::Started { app, start_command } = outcome else {
        panic!("expected Started");
    };
    assert_eq!(app.name, "web");
    assert_eq!(start_command.as_deref(), Some(DETECTED_COMMAND));

    let relayed = events
        .first("say:-----> Downloaded app package (4.0K)")
        .expect("staging line relayed");
    let staged_fetch = events.nth("get_app", 2).expect("third staging fetch");
    assert!(relayed < staged_fetch, "{:?}", events.all());
    assert!(!events.contains("say:not shown"));

    // The tail is closed and drained before the first instance fetch.
    let closed = events.first("close").expect("log stream closed");
    let drained = events.first("say:").expect("separator after drain");
    let first_poll = events.first("get_instances").expect("instances polled");
    assert!(closed < drained && drained < first_poll, "{:?}", events.all());

    assert_eq!(events.count("get_instances"), 2);
    assert!(events.contains("say:0 of 1 instances running, 1 starting"));
    assert!(events.contains("say:1 of 1 instances running"));
    assert!(events.contains("step:Starting app web in org acme / space dev as alice..."));
    assert!(events.contains("success:App started"));
    assert!(events.contains(&format!(
        "say:App web was started using this command `{DETECTED_COMMAND}`"
    )));
}

#[tokio::test(start_paused = true)]
async fn start_waits_for_log_readiness_before_requesting_start() {
    let events = Events::default();
    let apps = FakeApps::new(stopped_app(), &[PackageState::Staged], &events);
    let insts = FakeInstances::new(vec![instances(&[InstanceState::Running])], &events);
    let logs = FakeLogs::connecting(Vec::new(), &events);

    run(&apps, &insts, logs, &events, timeouts()).await.unwrap();

    let subscribed = events.first("subscribe").expect("subscribed");
    let started = events.first("update_state").expect("start requested");
    assert!(subscribed < started);
    assert_eq!(events.count("subscribe"), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_log_server_is_a_warning_not_a_failure() {
    let events = Events::default();
    let apps = FakeApps::new(stopped_app(), &[PackageState::Staged], &events);
    let insts = FakeInstances::new(vec![instances(&[InstanceState::Running])], &events);
    let logs = FakeLogs::silent(&events);

    let started_at = tokio::time::Instant::now();
    let outcome = run(&apps, &insts, logs, &events, timeouts()).await.unwrap();

    assert!(matches!(outcome, StartOutcome::Started { .. }));
    assert!(started_at.elapsed() >= Duration::from_secs(20));
    assert!(events.contains("warn:timeout connecting to log server, no log will be shown"));
    // The pending subscription is released once, before the start request.
    assert_eq!(events.count("close"), 1);
    let released = events.first("close").expect("subscription released");
    let started = events.first("update_state").expect("start requested");
    assert!(released < started, "{:?}", events.all());
}

#[tokio::test(start_paused = true)]
async fn failed_start_request_still_drains_the_tail() {
    let events = Events::default();
    let mut apps = FakeApps::new(stopped_app(), &[PackageState::Staged], &events);
    apps.start_fails = true;
    let insts = FakeInstances::new(vec![instances(&[InstanceState::Running])], &events);
    let logs = FakeLogs::connecting(Vec::new(), &events);

    let err = run(&apps, &insts, logs, &events, timeouts()).await.unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("failed to start app web"), "{msg}");
    assert!(msg.contains("cf logs web --recent"), "{msg}");
    assert!(matches!(
        err.downcast_ref::<StartError>(),
        Some(StartError::RequestFailed { action: "start app", .. })
    ));
    assert!(events.contains("close"));
    assert!(events.contains("say:"));
    assert!(!events.contains("get_app"));
    assert!(!events.contains("get_instances"));
}

#[tokio::test(start_paused = true)]
async fn staging_failure_drains_the_tail_and_skips_instances() {
    let events = Events::default();
    let mut apps = FakeApps::new(
        stopped_app(),
        &[PackageState::Pending, PackageState::Failed],
        &events,
    );
    apps.failure_reason = Some("BuildpackCompileFailed".into());
    let insts = FakeInstances::new(vec![instances(&[InstanceState::Running])], &events);
    let logs = FakeLogs::connecting(Vec::new(), &events);

    let err = run(&apps, &insts, logs, &events, timeouts()).await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<StartError>(),
        Some(&StartError::StagingFailed {
            app: "web".into(),
            reason: "BuildpackCompileFailed".into(),
        })
    );
    assert!(events.contains("close"));
    assert!(!events.contains("get_instances"));
}

#[tokio::test(start_paused = true)]
async fn staging_timeout_names_the_window() {
    let events = Events::default();
    let apps = FakeApps::new(stopped_app(), &[PackageState::Pending], &events);
    let insts = FakeInstances::new(vec![instances(&[InstanceState::Running])], &events);
    let logs = FakeLogs::connecting(Vec::new(), &events);
    let short = StartTimeouts {
        staging: Duration::from_secs(30),
        ..timeouts()
    };

    let err = run(&apps, &insts, logs, &events, short).await.unwrap_err();

    assert!(
        err.to_string().starts_with("web failed to stage within 30 seconds"),
        "{err}"
    );
    assert!(err.to_string().contains("cf logs web --recent"));
    assert!(events.contains("close"));
    assert!(!events.contains("get_instances"));
}

#[tokio::test(start_paused = true)]
async fn crashed_instance_fails_the_start() {
    let events = Events::default();
    let apps = FakeApps::new(stopped_app(), &[PackageState::Staged], &events);
    let insts = FakeInstances::new(vec![instances(&[InstanceState::Crashed])], &events);
    let logs = FakeLogs::connecting(Vec::new(), &events);

    let err = run(&apps, &insts, logs, &events, timeouts()).await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<StartError>(),
        Some(&StartError::StartUnsuccessful { app: "web".into() })
    );
    assert_eq!(events.count("get_instances"), 1);
    assert!(!events.contains("success:App started"));
}

#[tokio::test(start_paused = true)]
async fn explicit_command_is_reported_over_detected_one() {
    let events = Events::default();
    let app = Application {
        command: Some("./run.sh".into()),
        ..stopped_app()
    };
    let apps = FakeApps::new(app, &[PackageState::Staged], &events);
    let insts = FakeInstances::new(vec![instances(&[InstanceState::Running])], &events);
    let logs = FakeLogs::connecting(Vec::new(), &events);

    let outcome = run(&apps, &insts, logs, &events, timeouts()).await.unwrap();

    let StartOutcome::Started { start_command, .. } = outcome else {
        panic!("expected Started");
    };
    assert_eq!(start_command.as_deref(), Some("./run.sh"));
}
