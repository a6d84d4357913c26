//! Concurrent upgrade specs
//!
//! Two processes starting at once: one migrates, the other waits for the
//! lock and then finds nothing to do.

use crate::prelude::*;
use std::time::Duration;

#[test]
fn concurrent_runs_migrate_once() {
    let project = Project::empty();
    project.config("preferences.json", json!({"theme": "dark", "telemetry": true}));
    for name in ["a", "b", "c"] {
        project.config(
            &format!("agents/{name}.json"),
            json!({"name": name, "model": "claude", "preferences": {"autoApprove": true}}),
        );
    }
    let mut config = project.engine_config();
    config.lock.max_attempts = 40;
    config.lock.max_delay = Duration::from_millis(50);

    let reports: Vec<RunReport> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| s.spawn(|| Executor::new(&config).unwrap().run().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let migrated: Vec<usize> = reports.iter().map(|r| r.migrated().count()).collect();
    assert!(migrated == vec![4, 0] || migrated == vec![0, 4], "{migrated:?}");
    assert!(reports.iter().any(|r| r.is_noop() && r.backup.is_none()));
    assert_eq!(project.backups().len(), 1);
    assert_eq!(project.read_config("agents/b.json")["preferences"]["approvals"]["mode"], "auto");
}

#[test]
fn held_lock_makes_the_cli_fail_without_writing() {
    let project = Project::empty();
    project.config("preferences.json", json!({"theme": "dark"}));
    let before = project.read_raw("preferences.json");
    let _held = cm_storage::MigrationLock::acquire(
        &project.state().join(cm_storage::LOCK_FILE_NAME),
        &cm_storage::LockConfig::default(),
        &cm_core::SystemClock,
    )
    .unwrap();

    project
        .cm()
        .args(&["upgrade"])
        .env("CM_LOCK_ATTEMPTS", "2")
        .env("CM_LOCK_BASE_DELAY_MS", "1")
        .fails_with(1)
        .stderr_has("error:");

    assert_eq!(project.read_raw("preferences.json"), before);
    assert!(project.backups().is_empty());
}
