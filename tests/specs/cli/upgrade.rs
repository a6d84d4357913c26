//! `cm upgrade` specs

use crate::prelude::*;

fn legacy_project() -> Project {
    let project = Project::empty();
    project.config("preferences.json", json!({"theme": "dark", "telemetry": true}));
    project.config("agents/helper.json", json!({"name": "helper", "model": "claude"}));
    project
}

#[test]
fn upgrade_reports_each_file_and_the_backup() {
    let project = legacy_project();

    project
        .cm()
        .args(&["upgrade"])
        .passes()
        .stdout_has("Backup: ")
        .stdout_has("agents/helper.json  0.0.0 -> 2.0.0")
        .stdout_has("preferences.json  0.0.0 -> 2.0.0")
        .stdout_has("2 file(s) migrated to 2.0.0, 0 failed");

    assert_eq!(project.read_config("preferences.json")["telemetry"], json!({"enabled": true}));
}

#[test]
fn upgrade_twice_says_files_are_current() {
    let project = legacy_project();
    project.cm().args(&["upgrade"]).passes();

    project
        .cm()
        .args(&["upgrade"])
        .passes()
        .stdout_has("Config files are at 2.0.0")
        .stdout_lacks("Backup:");
}

#[test]
fn dry_run_writes_nothing() {
    let project = legacy_project();
    let before = project.read_raw("preferences.json");

    project
        .cm()
        .args(&["upgrade", "--dry-run"])
        .passes()
        .stdout_has("Dry run, no changes made")
        .stdout_has("Upgrade: 0.0.0 -> 2.0.0")
        .stdout_has("2.0.0 nest theme under `ui`")
        .stdout_has("(breaking)");

    assert_eq!(project.read_raw("preferences.json"), before);
    assert!(project.backups().is_empty());
    assert!(!project.state().join(".migrate-version").exists());
}

#[test]
fn dry_run_json_lists_pending_versions() {
    let project = legacy_project();

    let plan = project.cm().args(&["--format", "json", "upgrade", "--dry-run"]).passes().json();

    assert_eq!(plan["toVersion"], "2.0.0");
    let pending = |name: &str| {
        let files = plan["files"].as_array().unwrap();
        files.iter().find(|f| f["file"] == name).unwrap()["pending"].clone()
    };
    assert_eq!(pending("agents/helper.json"), json!(["1.6.0", "1.7.0", "2.0.0"]));
    assert_eq!(pending("preferences.json"), json!(["2.0.0"]));
    assert_eq!(plan["files"][0]["state"], "unversioned");
}

#[test]
fn failed_file_exits_nonzero_and_names_the_backup() {
    let project = legacy_project();
    project.file("state/agents/broken.json", "{ not json");

    project
        .cm()
        .args(&["upgrade"])
        .fails_with(1)
        .stdout_has("agents/broken.json  failed: ")
        .stdout_has("cm restore-backup")
        .stderr_has("error:");

    assert_eq!(project.read_raw("agents/broken.json"), "{ not json");
    assert_eq!(project.read_config("preferences.json")["version"], "2.0.0");
}

#[test]
fn state_dir_flag_overrides_the_environment() {
    let project = legacy_project();
    let other = Project::empty();

    other
        .cm()
        .args(&["--state-dir", project.state().to_str().unwrap(), "upgrade"])
        .passes()
        .stdout_has("2 file(s) migrated");

    assert_eq!(project.read_config("agents/helper.json")["version"], "2.0.0");
}
