// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Supervisor against a real PID file and real child processes

#![cfg(unix)]

use std::io;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use webdavd_core::application::launcher::Launcher;
use webdavd_core::infrastructure::pidfile::{PidFile, Registry};
use webdavd_core::infrastructure::process::{ProcessControl, SystemProcessControl};
use webdavd_core::{Outcome, ServeConfig, Supervisor};

/// Spawns `sleep` instead of a serving process. Children are reaped on a
/// background thread so a terminated child stops showing up as alive.
#[derive(Default)]
struct SleepLauncher {
    launches: AtomicUsize,
}

impl Launcher for SleepLauncher {
    fn launch(&self, _config: &ServeConfig) -> io::Result<u32> {
        let mut child = Command::new("sleep").arg("30").spawn()?;
        let pid = child.id();
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(pid)
    }
}

fn supervisor(path: &std::path::Path, launcher: Arc<SleepLauncher>) -> Supervisor {
    Supervisor::new(
        Box::new(PidFile::with_path(path)),
        Arc::new(SystemProcessControl::new()),
        launcher,
    )
    .with_stop_grace(Duration::from_secs(5))
}

#[test]
fn test_double_start_then_stop() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("webdavd.pid");
    let launcher = Arc::new(SleepLauncher::default());
    let supervisor = supervisor(&path, Arc::clone(&launcher));
    let config = ServeConfig::new(tmp.path());

    let Outcome::Started { pid } = supervisor.start(&config).unwrap() else {
        panic!("expected a fresh start");
    };
    assert_eq!(
        supervisor.start(&config).unwrap(),
        Outcome::AlreadyRunning { pid }
    );
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    assert_eq!(PidFile::with_path(&path).read().unwrap(), pid);
    assert_eq!(supervisor.status().unwrap(), Outcome::Running { pid });

    assert_eq!(supervisor.stop().unwrap(), Outcome::Stopped { pid });
    assert!(!path.exists());
    assert!(!SystemProcessControl::new().is_running(pid));
    assert_eq!(supervisor.status().unwrap(), Outcome::NotRunning);
}

#[test]
fn test_stop_never_started() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("webdavd.pid");
    let supervisor = supervisor(&path, Arc::new(SleepLauncher::default()));

    assert_eq!(supervisor.stop().unwrap(), Outcome::NotRunning);
    assert_eq!(supervisor.stop().unwrap(), Outcome::NotRunning);
    assert!(!path.exists());
}

#[test]
fn test_stale_record_is_cleared() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("webdavd.pid");

    let mut exited = Command::new("true").spawn().unwrap();
    let stale_pid = exited.id();
    exited.wait().unwrap();
    PidFile::with_path(&path).write(stale_pid).unwrap();

    let launcher = Arc::new(SleepLauncher::default());
    let supervisor = supervisor(&path, Arc::clone(&launcher));
    assert_eq!(supervisor.status().unwrap(), Outcome::NotRunning);
    assert!(!path.exists());

    // start over a stale record launches a new process
    PidFile::with_path(&path).write(stale_pid).unwrap();
    let Outcome::Started { pid } = supervisor.start(&ServeConfig::new(tmp.path())).unwrap() else {
        panic!("expected a fresh start");
    };
    assert_ne!(pid, stale_pid);
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    supervisor.stop().unwrap();
}

#[test]
fn test_corrupt_record_is_left_in_place() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("webdavd.pid");
    std::fs::write(&path, "not-a-pid").unwrap();

    let launcher = Arc::new(SleepLauncher::default());
    let supervisor = supervisor(&path, Arc::clone(&launcher));
    assert!(supervisor.status().is_err());
    assert!(supervisor.start(&ServeConfig::new(tmp.path())).is_err());
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "not-a-pid");
}

#[test]
fn test_concurrent_starts_spawn_one_process() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("webdavd.pid");
    let launcher = Arc::new(SleepLauncher::default());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            let launcher = Arc::clone(&launcher);
            let root = tmp.path().to_path_buf();
            std::thread::spawn(move || supervisor(&path, launcher).start(&ServeConfig::new(root)))
        })
        .collect();

    let outcomes: Vec<Outcome> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    let started = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Started { .. }))
        .count();
    assert_eq!(started, 1);
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);

    supervisor(&path, Arc::clone(&launcher)).stop().unwrap();
}
