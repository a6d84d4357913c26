//! `cm verify` specs
//!
//! The verifier reads the shape artifact committed on a base ref and fails
//! when a breaking schema change ships without a migration. Skipped when
//! git is not installed.

use crate::prelude::*;
use cm_core::{ConfigKind, MigrationRegistry};
use cm_engine::{builtin_migrations, SchemaSet};
use cm_shape::{FieldType, ObjectDef};
use cm_verify::ShapeArtifact;

fn legacy_schemas() -> SchemaSet {
    let theme = FieldType::enumeration(["dark", "light", "system"]);
    let agent = ObjectDef::new()
        .optional("version", FieldType::String)
        .required("name", FieldType::String)
        .required("model", FieldType::String)
        .optional(
            "mcpServers",
            FieldType::map_of(FieldType::Object(ObjectDef::new().required("command", FieldType::String))),
        )
        .optional(
            "preferences",
            FieldType::Object(
                ObjectDef::new().optional("theme", theme.clone()).optional("autoApprove", FieldType::Boolean),
            ),
        );
    let preferences = ObjectDef::new()
        .optional("version", FieldType::String)
        .optional("theme", theme)
        .optional("telemetry", FieldType::Boolean);
    [(ConfigKind::Agent, agent), (ConfigKind::Preferences, preferences)].into_iter().collect()
}

/// A repo whose HEAD holds the shape artifact of the 1.x schemas.
fn legacy_repo() -> Project {
    let project = Project::empty();
    project.git_init();
    let registry = MigrationRegistry::new(builtin_migrations().into_iter().take(2).collect()).unwrap();
    ShapeArtifact::generate(&legacy_schemas(), &registry, &FakeClock::new())
        .save(&project.root().join("schema/shapes.lock.json"))
        .unwrap();
    project.git(&["add", "schema"]);
    project.git(&["commit", "-q", "-m", "shapes at 1.7.0"]);
    project
}

#[test]
fn breaking_change_with_a_migration_passes() {
    if !git_available() {
        return;
    }
    let project = legacy_repo();
    project.cm().args(&["shapes", "generate"]).passes();

    project
        .cm()
        .args(&["verify", "--base", "HEAD"])
        .passes()
        .stdout_has("Baseline: HEAD:schema/shapes.lock.json")
        .stdout_has("preferences  changed, 2 breaking, migrated by 2.0.0")
        .stdout_has("ok");
}

#[test]
fn stale_working_artifact_fails() {
    if !git_available() {
        return;
    }
    let project = legacy_repo();

    project
        .cm()
        .args(&["verify", "--base", "HEAD"])
        .fails_with(2)
        .stdout_has("error: ")
        .stderr_has("schema verification failed");
}

#[test]
fn unchanged_schemas_pass() {
    if !git_available() {
        return;
    }
    let project = Project::empty();
    project.git_init();
    project.cm().args(&["shapes", "generate"]).passes();
    project.git(&["add", "schema"]);
    project.git(&["commit", "-q", "-m", "shapes"]);

    let report = project.cm().args(&["--format", "json", "verify", "--base", "HEAD"]).passes().json();

    assert_eq!(report["findings"], json!([]));
    assert_eq!(report["newMigrations"], json!([]));
    let outcomes: Vec<&str> =
        report["kinds"].as_array().unwrap().iter().map(|k| k["outcome"].as_str().unwrap()).collect();
    assert_eq!(outcomes, vec!["unchanged", "unchanged"]);
}

#[test]
fn first_introduction_has_no_baseline() {
    if !git_available() {
        return;
    }
    let project = Project::empty();
    project.git_init();
    project.file("README.md", "config\n");
    project.git(&["add", "README.md"]);
    project.git(&["commit", "-q", "-m", "init"]);
    project.cm().args(&["shapes", "generate"]).passes();

    project
        .cm()
        .args(&["verify", "--base", "HEAD"])
        .passes()
        .stdout_has("Baseline: none (first introduction)")
        .stdout_has("agent  added");
}

#[test]
fn unknown_base_ref_is_an_error() {
    if !git_available() {
        return;
    }
    let project = legacy_repo();

    project
        .cm()
        .args(&["verify", "--base", "no-such-branch"])
        .fails_with(1)
        .stderr_has("unknown base ref 'no-such-branch'");
}
