//! Upgrade specs
//!
//! Legacy config files are folded through every pending migration, stamped
//! with the running version, and backed up first.

use crate::prelude::*;
use similar_asserts::assert_eq;

fn legacy_agent(version: Option<&str>) -> Value {
    let mut doc = json!({
        "name": "reviewer",
        "model": "claude",
        "mcpServers": {"git": {"command": "mcp-git"}},
        "preferences": {"theme": "light", "autoApprove": false}
    });
    if let Some(v) = version {
        doc["version"] = json!(v);
    }
    doc
}

#[test]
fn versioned_agent_runs_every_pending_migration() {
    let project = Project::empty();
    project.config("agents/reviewer.json", legacy_agent(Some("1.4.0")));

    let report = project.executor().run().unwrap();

    assert!(report.is_success());
    assert_eq!(
        report.files[0].result,
        FileResult::Migrated {
            from: Version::new(1, 4, 0),
            to: ENGINE_VERSION,
            applied: vec![Version::new(1, 6, 0), Version::new(1, 7, 0), Version::new(2, 0, 0)],
        }
    );
    assert_eq!(
        project.read_config("agents/reviewer.json"),
        json!({
            "version": engine_version(),
            "name": "reviewer",
            "llm": {"model": {"name": "claude"}},
            "servers": {"git": {"command": "mcp-git"}},
            "preferences": {"ui": {"theme": "light"}, "approvals": {"mode": "ask"}}
        })
    );
}

#[test]
fn partially_migrated_agent_only_runs_the_rest() {
    let project = Project::empty();
    project.config(
        "agents/reviewer.json",
        json!({
            "version": "1.6.0",
            "name": "reviewer",
            "llm": {"model": {"name": "claude"}},
            "mcpServers": {"git": {"command": "mcp-git"}}
        }),
    );

    let report = project.executor().run().unwrap();

    let FileResult::Migrated { applied, .. } = &report.files[0].result else {
        panic!("expected a migration, got {:?}", report.files[0].result);
    };
    assert_eq!(applied, &vec![Version::new(1, 7, 0), Version::new(2, 0, 0)]);
    assert_eq!(project.read_config("agents/reviewer.json")["servers"]["git"]["command"], "mcp-git");
}

#[test]
fn upgrade_snapshots_the_state_directory_before_writing() {
    let project = Project::empty();
    project.config("agents/reviewer.json", legacy_agent(None));
    project.config("preferences.json", json!({"theme": "dark"}));
    let before = project.read_raw("agents/reviewer.json");

    let report = project.executor().run().unwrap();

    let backups = project.backups();
    assert_eq!(backups.len(), 1);
    assert_eq!(report.backup.as_ref().map(|b| b.as_str().to_string()), Some(backups[0].clone()));
    let snapshot = project.root().join(&backups[0]);
    assert_eq!(std::fs::read_to_string(snapshot.join("agents/reviewer.json")).unwrap(), before);
    assert!(snapshot.join("preferences.json").exists());
}

#[test]
fn unknown_field_keeps_the_file_untouched() {
    let project = Project::empty();
    let mut doc = legacy_agent(None);
    doc["plugins"] = json!(["lint"]);
    project.config("agents/reviewer.json", doc);
    project.config("preferences.json", json!({"theme": "dark"}));
    let before = project.read_raw("agents/reviewer.json");

    let report = project.executor().run().unwrap();

    let failures: Vec<(&str, String)> = report.failures().map(|(f, e)| (f, e.to_string())).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "agents/reviewer.json");
    assert!(failures[0].1.contains("unrecognized fields: plugins"), "{}", failures[0].1);
    assert_eq!(project.read_raw("agents/reviewer.json"), before);
    assert_eq!(project.read_config("preferences.json")["version"], json!(engine_version()));
    assert!(!report.marker_advanced);
}

#[test]
fn bootstrap_marker_sets_the_start_of_unversioned_files() {
    let project = Project::empty();
    project.file("state/.migrate-version", "1.7.0\n");
    // Written at 1.7.0 but never stamped
    project.config(
        "agents/reviewer.json",
        json!({
            "name": "reviewer",
            "llm": {"model": {"name": "claude"}},
            "preferences": {"theme": "dark"}
        }),
    );

    let report = project.executor().run().unwrap();

    assert_eq!(
        report.files[0].result,
        FileResult::Migrated {
            from: Version::new(1, 7, 0),
            to: ENGINE_VERSION,
            applied: vec![Version::new(2, 0, 0)],
        }
    );
    assert_eq!(project.read_raw(".migrate-version").trim(), engine_version());
}
