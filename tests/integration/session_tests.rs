//! End-to-end runs against real processes
//!
//! These spawn short-lived `sh`/`sleep` processes and inspect `/proc`, so
//! they only run on Linux.
#![cfg(target_os = "linux")]

use procrec::{run_monitor, MonitorConfig, MonitorError, Session, Target, Termination};
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn pid_exists(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

/// Test that a spawned command is killed once the time budget is spent
#[test]
fn test_spawned_process_killed_after_duration() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("sleep.log");

    let config = MonitorConfig::builder(Target::Command("sleep 30".to_string()))
        .log_path(&log_path)
        .duration_secs(0.5)
        .interval_secs(0.05)
        .build()
        .unwrap();

    let session = Session::start(config).unwrap();
    let pid = session.pid();
    assert!(session.is_spawned());

    let started = Instant::now();
    let report = session.run(None).unwrap();

    assert_eq!(report.termination, Termination::DurationExceeded);
    assert!(report.spawned);
    assert!(report.samples_taken >= 2);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!pid_exists(pid), "spawned pid {} survived the run", pid);

    // One header plus one row per sample
    let text = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(text.lines().count(), report.samples_taken + 1);
    for row in text.lines().skip(1) {
        let fields: Vec<f64> = row
            .split_whitespace()
            .map(|f| f.parse().unwrap())
            .collect();
        assert_eq!(fields.len(), 4);
        assert!(fields[0] <= 0.5 + 0.05 + 0.5, "elapsed {} too large", fields[0]);
    }
}

/// Test that a command exiting on its own ends the run as finished
#[test]
fn test_short_command_finishes() {
    let config = MonitorConfig::builder(Target::Command("sleep 0.3".to_string()))
        .interval_secs(0.05)
        .duration_secs(20.0)
        .build()
        .unwrap();

    let session = Session::start(config).unwrap();
    let pid = session.pid();

    let report = session.run(None).unwrap();

    assert_eq!(report.termination, Termination::ProcessFinished);
    assert!(report.samples_taken >= 1);
    assert!(report.elapsed < Duration::from_secs(20));
    // Reaped, not left behind as a zombie
    assert!(!pid_exists(pid), "finished pid {} was not reaped", pid);
}

/// Test that the run can be interrupted and the process is still released
#[test]
fn test_interrupt_releases_spawned_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = MonitorConfig::builder(Target::Command("sleep 30".to_string()))
        .interval_secs(0.05)
        .chart_path(dir.path().join("interrupted.svg"))
        .build()
        .unwrap();
    let session = Session::start(config).unwrap();
    let pid = session.pid();

    let running = Arc::new(AtomicBool::new(true));
    let stopper = {
        let running = running.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            running.store(false, Ordering::SeqCst);
        })
    };

    // Chart rendering may be unavailable on font-less hosts; the process
    // must be gone either way
    let result = session.run(Some(running));
    stopper.join().unwrap();

    match result {
        Ok(report) => {
            assert_eq!(report.termination, Termination::Interrupted);
            assert!(report.samples_taken >= 1);
            assert_eq!(report.series.len(), report.samples_taken);
        }
        Err(MonitorError::Chart(_)) => {}
        Err(e) => panic!("unexpected error: {}", e),
    }
    assert!(!pid_exists(pid));
}

/// Test that children of the shell are aggregated into the sample
#[test]
fn test_children_are_counted() {
    let config = MonitorConfig::builder(Target::Command("sleep 5 & sleep 5 & wait".to_string()))
        .include_children(true)
        .interval_secs(0.1)
        .duration_secs(0.8)
        .build()
        .unwrap();

    let report = run_monitor(config, None).unwrap();

    assert_eq!(report.termination, Termination::DurationExceeded);
    assert!(
        report.summary.peak_process_count >= 3,
        "expected shell plus two sleeps, saw {}",
        report.summary.peak_process_count
    );
}

/// Test that an attached process is left running
#[test]
fn test_attached_process_is_not_killed() {
    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id();

    let config = MonitorConfig::builder(Target::Pid(pid))
        .duration_secs(0.3)
        .interval_secs(0.05)
        .build()
        .unwrap();
    let report = run_monitor(config, None).unwrap();

    let still_running = child.try_wait().unwrap().is_none();
    child.kill().ok();
    child.wait().ok();

    assert_eq!(report.termination, Termination::DurationExceeded);
    assert!(!report.spawned);
    assert!(still_running);
}

/// Test that an unwritable log fails before the command is started
#[test]
fn test_unwritable_log_fails_before_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("started");
    let config = MonitorConfig::builder(Target::Command(format!(
        "touch {}",
        marker.display()
    )))
    .log_path(dir.path().join("no-such-dir").join("run.log"))
    .build()
    .unwrap();

    let result = Session::start(config);
    assert!(matches!(result, Err(MonitorError::LogUnwritable { .. })));

    thread::sleep(Duration::from_millis(100));
    assert!(!marker.exists());
}

#[test]
fn test_attach_to_missing_pid() {
    let config = MonitorConfig::builder(Target::Pid(4_194_304 + 41))
        .build()
        .unwrap();
    assert!(matches!(
        run_monitor(config, None),
        Err(MonitorError::ProcessNotFound(_))
    ));
}
