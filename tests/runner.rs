//! End-to-end tests driving real `/bin/sh` children through the runner.
#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::time::timeout;

use runvisor::{
    Config, Event, EventKind, ExitOutcome, LogLevel, Runner, RunId, RunSpec, StartError, StopError,
};

/// Writes an executable shell script into `dir` and returns its path.
fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn runner() -> Arc<Runner> {
    Runner::builder(Config::default()).build()
}

/// Waits for the run's terminal event and returns its exit outcome.
async fn wait_for_stopped(rx: &mut broadcast::Receiver<Event>, id: &RunId) -> ExitOutcome {
    timeout(Duration::from_secs(10), async {
        loop {
            let ev = rx.recv().await.expect("event bus closed");
            if ev.kind == EventKind::RunStopped && ev.run.as_ref() == Some(id) {
                return ev.exit.expect("RunStopped carries an exit outcome");
            }
        }
    })
    .await
    .expect("timed out waiting for RunStopped")
}

/// Counts further `RunStopped` events for `id` over a short settle window.
async fn extra_stopped_events(rx: &mut broadcast::Receiver<Event>, id: &RunId) -> usize {
    let mut extra = 0;
    while let Ok(Ok(ev)) = timeout(Duration::from_millis(300), rx.recv()).await {
        if ev.kind == EventKind::RunStopped && ev.run.as_ref() == Some(id) {
            extra += 1;
        }
    }
    extra
}

#[tokio::test]
async fn stdout_line_then_success_summary() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(script(&dir, "hello.sh", "echo hello"), "hello").unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();

    let exit = wait_for_stopped(&mut events, &id).await;
    assert_eq!(exit, ExitOutcome::Exited(0));

    let logs = runner.get_logs(&id).await;
    assert!(
        logs.iter()
            .any(|e| e.level == LogLevel::Stdout && e.message.as_ref() == "hello"),
        "missing stdout entry in {logs:?}"
    );
    let last = logs.last().unwrap();
    assert_eq!(last.level, LogLevel::Success);
}

#[tokio::test]
async fn stderr_and_nonzero_exit_are_reported() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(
        script(&dir, "fail.sh", "echo oops >&2\nexit 2"),
        "fail",
    )
    .unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();

    let exit = wait_for_stopped(&mut events, &id).await;
    assert_eq!(exit, ExitOutcome::Exited(2));

    let logs = runner.get_logs(&id).await;
    assert!(
        logs.iter()
            .any(|e| e.level == LogLevel::Stderr && e.message.as_ref() == "oops"),
        "missing stderr entry in {logs:?}"
    );
    let last = logs.last().unwrap();
    assert_eq!(last.level, LogLevel::Error);
    assert!(last.message.contains('2'), "summary should name the code");
}

#[tokio::test]
async fn graceful_stop_retires_sleeping_run() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(script(&dir, "sleep.sh", "exec sleep 30"), "sleeper").unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();
    assert_eq!(runner.list_running().await, vec![id.clone()]);
    assert!(runner.is_running(&id).await);

    let records = runner.snapshot().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert!(records[0].pid.is_some());

    let begun = Instant::now();
    runner.stop_run(&id).await.unwrap();
    assert!(
        begun.elapsed() < Duration::from_secs(4),
        "graceful stop should not need the full grace window"
    );

    let exit = wait_for_stopped(&mut events, &id).await;
    assert_eq!(exit, ExitOutcome::Terminated);
    assert!(runner.list_running().await.is_empty());
    assert!(!runner.is_running(&id).await);
}

#[tokio::test]
async fn stubborn_child_is_killed_after_grace() {
    let mut cfg = Config::default();
    cfg.grace = Duration::from_millis(300);
    let runner = Runner::builder(cfg).build();

    let dir = TempDir::new().unwrap();
    // Ignores SIGTERM and spins without spawning children, so the pipes close
    // with the shell itself.
    let spec = RunSpec::new(
        script(&dir, "stubborn.sh", "trap '' TERM\nwhile :; do :; done"),
        "stubborn",
    )
    .unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();

    runner.stop_run(&id).await.unwrap();
    let exit = wait_for_stopped(&mut events, &id).await;
    assert_eq!(exit, ExitOutcome::Terminated);
    assert!(runner.list_running().await.is_empty());

    assert_eq!(extra_stopped_events(&mut events, &id).await, 0);
}

#[tokio::test]
async fn stop_without_start_is_not_running() {
    let runner = runner();
    let id = RunId::new("never-started");
    match runner.stop_run(&id).await {
        Err(StopError::NotRunning { id: reported }) => assert_eq!(reported, id),
        other => panic!("expected NotRunning, got {other:?}"),
    }
}

#[tokio::test]
async fn stop_after_natural_exit_is_not_running() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(script(&dir, "quick.sh", "true"), "quick").unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();
    wait_for_stopped(&mut events, &id).await;

    assert!(matches!(
        runner.stop_run(&id).await,
        Err(StopError::NotRunning { .. })
    ));
}

#[tokio::test]
async fn vanished_path_is_not_found() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let path = script(&dir, "gone.sh", "echo hi");
    let spec = RunSpec::new(&path, "gone").unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut events = runner.subscribe_events();
    match runner.start_run(spec).await {
        Err(StartError::NotFound { .. }) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(runner.list_running().await.is_empty());
    assert!(
        timeout(Duration::from_millis(200), events.recv()).await.is_err(),
        "no event may be published for a rejected start"
    );
}

#[tokio::test]
async fn unreadable_script_is_spawn_failure() {
    use std::os::unix::fs::PermissionsExt;

    let runner = runner();
    let dir = TempDir::new().unwrap();
    let path = script(&dir, "noexec.sh", "echo hi");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
    let spec = RunSpec::new(&path, "noexec").unwrap();

    let mut events = runner.subscribe_events();
    match runner.start_run(spec).await {
        Err(StartError::Spawn { .. }) => {}
        other => panic!("expected Spawn, got {other:?}"),
    }
    assert!(runner.list_running().await.is_empty());
    assert!(
        timeout(Duration::from_millis(200), events.recv()).await.is_err(),
        "no event may be published for a rejected start"
    );
}

#[tokio::test]
async fn duplicate_start_is_rejected() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(script(&dir, "sleep.sh", "exec sleep 30"), "sleeper").unwrap();
    let id = spec.id().clone();

    runner.start_run(spec.clone()).await.unwrap();
    match runner.start_run(spec).await {
        Err(StartError::AlreadyRunning { id: reported }) => assert_eq!(reported, id),
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }

    runner.stop_run(&id).await.unwrap();
}

#[tokio::test]
async fn concurrent_duplicate_start_has_one_winner() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(script(&dir, "sleep.sh", "exec sleep 30"), "sleeper").unwrap();
    let id = spec.id().clone();

    let (a, b) = tokio::join!(runner.start_run(spec.clone()), runner.start_run(spec));
    let accepted = [&a, &b].iter().filter(|r| r.is_ok()).count();
    let rejected = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(StartError::AlreadyRunning { .. })))
        .count();
    assert_eq!((accepted, rejected), (1, 1), "got {a:?} / {b:?}");

    runner.stop_run(&id).await.unwrap();
}

#[tokio::test]
async fn logs_grow_monotonically() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let body = "\
n=0
while [ $n -lt 10 ]; do echo early$n; n=$((n+1)); done
sleep 1
n=0
while [ $n -lt 10 ]; do echo late$n; n=$((n+1)); done";
    let spec = RunSpec::new(script(&dir, "chatty.sh", body), "chatty").unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    let mid = runner.get_logs(&id).await;

    wait_for_stopped(&mut events, &id).await;
    let done = runner.get_logs(&id).await;

    assert!(mid.len() <= done.len());
    assert_eq!(
        &done[..mid.len()],
        &mid[..],
        "an in-progress read must be a strict prefix of the final history"
    );
}

#[tokio::test]
async fn new_run_replaces_previous_history() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(script(&dir, "hello.sh", "echo hello"), "hello").unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec.clone()).await.unwrap();
    wait_for_stopped(&mut events, &id).await;

    runner.start_run(spec).await.unwrap();
    wait_for_stopped(&mut events, &id).await;

    let logs = runner.get_logs(&id).await;
    let notices = logs
        .iter()
        .filter(|e| e.level == LogLevel::Info && e.message.starts_with("starting"))
        .count();
    assert_eq!(notices, 1, "history must hold only the latest run: {logs:?}");
}

#[tokio::test]
async fn started_precedes_logs_precedes_stopped() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(script(&dir, "hello.sh", "echo hello"), "hello").unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();

    let mut seen = Vec::new();
    timeout(Duration::from_secs(10), async {
        loop {
            let ev = events.recv().await.unwrap();
            if ev.run.as_ref() != Some(&id) {
                continue;
            }
            let terminal = ev.kind == EventKind::RunStopped;
            seen.push(ev.kind);
            if terminal {
                break;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(seen.first(), Some(&EventKind::RunStarted));
    assert_eq!(seen.last(), Some(&EventKind::RunStopped));
    assert!(
        seen[1..seen.len() - 1]
            .iter()
            .all(|kind| *kind == EventKind::RunLog),
        "unexpected event between started and stopped: {seen:?}"
    );
    assert!(seen.len() >= 3, "expected at least one RunLog: {seen:?}");
}

#[tokio::test]
async fn interpreter_runs_non_executable_scripts() {
    let mut cfg = Config::default();
    cfg.interpreter = Some("/bin/sh".into());
    let runner = Runner::builder(cfg).build();

    let dir = TempDir::new().unwrap();
    // Plain file, no shebang, no exec bit: only runnable through the
    // configured interpreter.
    let path = dir.path().join("plain.sh");
    std::fs::write(&path, "echo via-interpreter\n").unwrap();
    let spec = RunSpec::new(&path, "plain").unwrap();
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();

    let exit = wait_for_stopped(&mut events, &id).await;
    assert_eq!(exit, ExitOutcome::Exited(0));
    assert!(
        runner
            .get_logs(&id)
            .await
            .iter()
            .any(|e| e.level == LogLevel::Stdout && e.message.as_ref() == "via-interpreter")
    );
}

#[tokio::test]
async fn args_and_env_reach_the_child() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let spec = RunSpec::new(script(&dir, "show.sh", "echo \"$1-$MODE\""), "show")
        .unwrap()
        .with_args(["x"])
        .with_env("MODE", "ci");
    let id = spec.id().clone();

    let mut events = runner.subscribe_events();
    runner.start_run(spec).await.unwrap();

    let exit = wait_for_stopped(&mut events, &id).await;
    assert_eq!(exit, ExitOutcome::Exited(0));
    assert!(
        runner
            .get_logs(&id)
            .await
            .iter()
            .any(|e| e.level == LogLevel::Stdout && e.message.as_ref() == "x-ci")
    );
}

#[tokio::test]
async fn unknown_id_has_empty_logs() {
    let runner = runner();
    assert!(runner.get_logs(&RunId::new("unknown")).await.is_empty());
}

#[tokio::test]
async fn shutdown_stops_every_active_run() {
    let runner = runner();
    let dir = TempDir::new().unwrap();
    let one = RunSpec::new(script(&dir, "one.sh", "exec sleep 30"), "one").unwrap();
    let two = RunSpec::new(script(&dir, "two.sh", "exec sleep 30"), "two").unwrap();

    let mut events = runner.subscribe_events();
    runner.start_run(one).await.unwrap();
    runner.start_run(two).await.unwrap();
    assert_eq!(runner.list_running().await.len(), 2);

    runner.shutdown().await;
    assert!(runner.list_running().await.is_empty());

    let mut saw_all_stopped = false;
    while let Ok(Ok(ev)) = timeout(Duration::from_millis(300), events.recv()).await {
        if ev.kind == EventKind::AllStopped {
            saw_all_stopped = true;
        }
    }
    assert!(saw_all_stopped);
}
