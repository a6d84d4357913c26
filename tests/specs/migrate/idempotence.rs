//! Idempotence specs
//!
//! A second run over already-migrated files writes nothing.

use crate::prelude::*;

#[test]
fn second_run_leaves_every_byte_alone() {
    let project = Project::empty();
    project.config("preferences.json", json!({"theme": "light", "telemetry": false}));
    project.config("agents/helper.json", json!({"name": "helper", "model": "claude"}));

    project.executor().run().unwrap();
    let prefs = project.read_raw("preferences.json");
    let agent = project.read_raw("agents/helper.json");

    let report = project.executor().run().unwrap();

    assert!(report.is_noop());
    assert!(report.files.iter().all(|f| f.result == FileResult::Unchanged));
    assert_eq!(project.read_raw("preferences.json"), prefs);
    assert_eq!(project.read_raw("agents/helper.json"), agent);
    assert_eq!(project.backups().len(), 1);
}

#[test]
fn current_files_never_take_a_backup() {
    let project = Project::empty();
    project.config(
        "preferences.json",
        json!({"version": engine_version(), "ui": {"theme": "system"}}),
    );

    let report = project.executor().run().unwrap();

    assert!(report.is_noop());
    assert!(project.backups().is_empty());
}
