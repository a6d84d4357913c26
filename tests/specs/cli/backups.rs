//! `cm backups` and `cm restore-backup` specs

use crate::prelude::*;

fn migrated_project() -> Project {
    let project = Project::empty();
    project.config("preferences.json", json!({"theme": "dark", "telemetry": false}));
    project.cm().args(&["upgrade"]).passes();
    project
}

#[test]
fn backups_is_empty_before_any_migration() {
    Project::empty().cm().args(&["backups"]).passes().stdout_has("No backups of");
}

#[test]
fn backups_lists_the_upgrade_snapshot() {
    let project = migrated_project();
    let backups = project.backups();

    let listed = project.cm().args(&["--format", "json", "backups"]).passes().json();

    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], json!(backups[0]));
}

#[test]
fn restore_latest_returns_the_pre_migration_files() {
    let project = migrated_project();
    assert_eq!(project.read_config("preferences.json")["version"], "2.0.0");

    project.cm().args(&["restore-backup"]).passes().stdout_has("Restored ").stdout_has(&project.backups()[0]);

    assert_eq!(project.read_config("preferences.json"), json!({"theme": "dark", "telemetry": false}));
    assert!(!project.state().join(".migrate-version").exists());
}

#[test]
fn restore_by_id_picks_that_snapshot() {
    let project = migrated_project();
    let id = project.backups()[0].clone();

    project.cm().args(&["restore-backup", &id]).passes();

    assert_eq!(project.read_config("preferences.json")["theme"], "dark");
}

#[test]
fn restore_unknown_backup_fails() {
    let project = migrated_project();
    let before = project.read_raw("preferences.json");

    project
        .cm()
        .args(&["restore-backup", "state.backup-19990101T000000000Z"])
        .fails_with(1)
        .stderr_has("error:");

    assert_eq!(project.read_raw("preferences.json"), before);
}

#[test]
fn restore_without_backups_fails() {
    let project = Project::empty();
    project.config("preferences.json", json!({"theme": "dark"}));

    project.cm().args(&["restore-backup"]).fails_with(1).stderr_has("error:");
}
