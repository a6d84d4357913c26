//! Backup retention specs
//!
//! Each migrating run takes one snapshot; only the newest N are kept. Files
//! are rewritten at an old explicit version so every run has work to do.

use crate::prelude::*;

fn upgrade_legacy(project: &Project, config: &EngineConfig, theme: &str) {
    project.config("preferences.json", json!({"version": "1.0.0", "theme": theme}));
    let report = Executor::new(config).unwrap().run().unwrap();
    assert_eq!(report.migrated().count(), 1);
}

#[test]
fn only_the_newest_backups_survive() {
    let project = Project::empty();
    let mut config = project.engine_config();
    config.backup_retention = 3;

    let mut taken = Vec::new();
    for theme in ["dark", "light", "system", "dark"] {
        upgrade_legacy(&project, &config, theme);
        let fresh: Vec<String> = project.backups().into_iter().filter(|b| !taken.contains(b)).collect();
        taken.extend(fresh);
    }

    assert_eq!(taken.len(), 4);
    assert_eq!(project.backups(), taken[1..].to_vec());
}

#[test]
fn retention_comes_from_the_environment_for_the_cli() {
    let project = Project::empty();
    for theme in ["dark", "light", "system"] {
        project.config("preferences.json", json!({"version": "1.0.0", "theme": theme}));
        project.cm().args(&["upgrade"]).env("CM_BACKUP_RETENTION", "1").passes();
    }

    assert_eq!(project.backups().len(), 1);
    project.cm().args(&["backups"]).passes().stdout_has(&project.backups()[0]);
}
