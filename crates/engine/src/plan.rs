// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only migration planning.

use crate::file::{read_document, FileMigrator, FileState};
use crate::layout::StateLayout;
use crate::schemas::SchemaSet;
use cm_core::{ConfigKind, ManifestEntry, MigrationRegistry, Version};
use serde::Serialize;
use std::io;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedFile {
    pub file: String,
    pub kind: ConfigKind,
    #[serde(flatten)]
    pub state: FileState,
    /// Migrations that will touch this file, ascending
    pub pending: Vec<Version>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    /// Lowest starting version among files that need migrating
    pub from_version: Option<Version>,
    pub to_version: Version,
    pub migrations: Vec<ManifestEntry>,
    pub files: Vec<PlannedFile>,
}

impl MigrationPlan {
    pub fn pending_files(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.iter().filter(|f| f.state.needs_migration())
    }

    /// True when running would write nothing.
    pub fn is_noop(&self) -> bool {
        self.pending_files().next().is_none()
    }
}

/// Classify every config file without writing anything.
pub fn build_plan(
    layout: &StateLayout,
    registry: &MigrationRegistry,
    schemas: &SchemaSet,
    target: Version,
    bootstrap: Option<Version>,
) -> io::Result<MigrationPlan> {
    let migrator = FileMigrator::new(registry, schemas, target, bootstrap);
    let mut files = Vec::new();
    for file in layout.discover()? {
        let state = match read_document(&file.path) {
            Ok(doc) => migrator.classify(&doc),
            Err(error) => FileState::Invalid { error },
        };
        let pending = match state.start(&target) {
            Some(start) if state.needs_migration() => {
                registry.transforms_for(file.kind, &start, &target).into_iter().map(|(v, _)| v).collect()
            }
            _ => Vec::new(),
        };
        files.push(PlannedFile { file: file.rel, kind: file.kind, state, pending });
    }

    let from_version = files
        .iter()
        .filter(|f| f.state.needs_migration())
        .filter_map(|f| f.state.start(&target))
        .min();
    let migrations = match from_version {
        Some(from) => registry.migrations_between(&from, &target).iter().map(|m| m.manifest_entry()).collect(),
        None => Vec::new(),
    };

    Ok(MigrationPlan { from_version, to_version: target, migrations, files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::builtin_registry;
    use crate::schemas::current_schemas;
    use std::fs;
    use tempfile::tempdir;

    fn plan_for(dir: &std::path::Path, bootstrap: Option<Version>) -> MigrationPlan {
        build_plan(
            &StateLayout::new(dir),
            &builtin_registry().unwrap(),
            &current_schemas(),
            Version::new(2, 0, 0),
            bootstrap,
        )
        .unwrap()
    }

    #[test]
    fn plan_reports_minimum_start_and_applicable_migrations() {
        let dir = tempdir().unwrap();
        let layout = StateLayout::new(dir.path());
        fs::create_dir_all(layout.agents_dir()).unwrap();
        fs::write(layout.agents_dir().join("a.json"), r#"{"version":"1.6.0"}"#).unwrap();
        fs::write(layout.agents_dir().join("b.json"), r#"{"version":"2.0.0"}"#).unwrap();
        fs::write(layout.preferences_path(), r#"{"theme":"dark"}"#).unwrap();

        let plan = plan_for(dir.path(), Some(Version::new(1, 7, 0)));

        assert_eq!(plan.from_version, Some(Version::new(1, 6, 0)));
        let versions: Vec<Version> = plan.migrations.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![Version::new(1, 7, 0), Version::new(2, 0, 0)]);
        assert_eq!(plan.pending_files().count(), 2);
        assert!(!plan.is_noop());

        let prefs = plan.files.iter().find(|f| f.file == "preferences.json").unwrap();
        assert_eq!(prefs.state, FileState::Unversioned { assumed: Version::new(1, 7, 0) });
        assert_eq!(prefs.pending, vec![Version::new(2, 0, 0)]);
    }

    #[test]
    fn current_and_invalid_files_make_a_noop_plan() {
        let dir = tempdir().unwrap();
        let layout = StateLayout::new(dir.path());
        fs::create_dir_all(layout.agents_dir()).unwrap();
        fs::write(layout.agents_dir().join("a.json"), r#"{"version":"2.0.0"}"#).unwrap();
        fs::write(layout.agents_dir().join("b.json"), "not json").unwrap();

        let plan = plan_for(dir.path(), None);

        assert!(plan.is_noop());
        assert_eq!(plan.from_version, None);
        assert!(plan.migrations.is_empty());
        assert!(matches!(plan.files[1].state, FileState::Invalid { .. }));
    }

    #[test]
    fn plan_does_not_write() {
        let dir = tempdir().unwrap();
        let layout = StateLayout::new(dir.path());
        fs::write(layout.preferences_path(), r#"{"theme":"dark"}"#).unwrap();

        plan_for(dir.path(), None);

        assert_eq!(fs::read_to_string(layout.preferences_path()).unwrap(), r#"{"theme":"dark"}"#);
    }
}
