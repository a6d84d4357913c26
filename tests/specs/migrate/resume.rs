//! Crash recovery specs
//!
//! A status record left by an interrupted run is picked up by the next one:
//! files it already finished are skipped and its backup is reused.

use crate::prelude::*;
use cm_storage::{StatusRecord, StatusStore, STATUS_FILE_NAME};

fn interrupted(project: &Project, backup: &str, completed: &[&str]) {
    std::fs::create_dir_all(project.root().join(backup)).unwrap();
    let mut record = StatusRecord::new(
        Version::ZERO,
        ENGINE_VERSION,
        project.root().join(backup),
        FakeClock::new().now_utc(),
    );
    for file in completed {
        record.mark_completed(*file);
    }
    StatusStore::new(project.state().join(STATUS_FILE_NAME)).save(&record).unwrap();
}

#[test]
fn interrupted_run_is_finished_by_the_next_one() {
    let project = Project::empty();
    project.config(
        "agents/a.json",
        json!({"version": engine_version(), "name": "a", "llm": {"model": {"name": "claude"}}}),
    );
    project.config("agents/b.json", json!({"name": "b", "model": "claude"}));
    interrupted(&project, "state.backup-20260101T000000000Z", &["agents/a.json"]);

    let report = project.executor().run().unwrap();

    assert!(report.resumed);
    assert!(report.marker_advanced);
    assert_eq!(report.backup.as_ref().map(|b| b.as_str()), Some("state.backup-20260101T000000000Z"));
    let results: Vec<(&str, &FileResult)> = report.files.iter().map(|f| (f.file.as_str(), &f.result)).collect();
    assert_eq!(results[0], ("agents/a.json", &FileResult::Skipped));
    assert!(matches!(results[1], ("agents/b.json", FileResult::Migrated { .. })));
    assert!(!project.state().join(STATUS_FILE_NAME).exists());
    // No second snapshot for the resumed run
    assert_eq!(project.backups(), vec!["state.backup-20260101T000000000Z"]);
}

#[test]
fn cli_reports_the_resumed_run() {
    let project = Project::empty();
    project.config("preferences.json", json!({"theme": "dark"}));
    interrupted(&project, "state.backup-20260101T000000000Z", &[]);

    project
        .cm()
        .args(&["upgrade"])
        .passes()
        .stdout_has("Resumed an interrupted migration")
        .stdout_has("preferences.json  0.0.0 -> 2.0.0");
}
