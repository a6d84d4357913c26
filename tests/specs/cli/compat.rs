//! `cm compat` specs
//!
//! Same major and minor is compatible, a differing minor warns, and a
//! differing major is rejected with exit code 2.

use crate::prelude::*;

#[test]
fn same_version_is_compatible() {
    cli().args(&["compat", "2.0.0"]).passes().stdout_has("compatible with engine 2.0.0");
}

#[test]
fn patch_difference_is_compatible() {
    cli().args(&["compat", "2.0.7"]).passes().stdout_has("compatible");
}

#[test]
fn minor_difference_warns_but_passes() {
    cli()
        .args(&["compat", "2.3.0"])
        .passes()
        .stdout_has("warning: built for 2.3.0, running 2.0.0");
}

#[test]
fn newer_major_is_rejected() {
    cli()
        .args(&["compat", "3.0.0"])
        .fails_with(2)
        .stderr_has("module built for engine 3.0.0 cannot run on engine 2.0.0")
        .stderr_has("update the engine to 3.x");
}

#[test]
fn older_major_is_rejected() {
    cli().args(&["compat", "1.9.0"]).fails_with(2).stderr_has("rebuild the module against engine 2.x");
}

#[test]
fn json_output_carries_status() {
    let out = cli().args(&["--format", "json", "compat", "2.1.0"]).passes().json();
    assert_eq!(out["status"], "warning");
    assert_eq!(out["engine"], "2.0.0");
    assert_eq!(out["declared"], "2.1.0");
}

#[test]
fn manifest_is_read_from_a_module_directory() {
    let project = Project::empty();
    project.file("module/cm-module.json", r#"{"name": "search", "engineVersion": "2.0.1"}"#);

    let out = project.cm().args(&["--format", "json", "compat", "--manifest", "module"]).passes().json();

    assert_eq!(out["module"], "search");
    assert_eq!(out["status"], "compatible");
}

#[test]
fn incompatible_manifest_names_the_module() {
    let project = Project::empty();
    project.file("module/cm-module.json", r#"{"name": "search", "engineVersion": "1.2.0"}"#);

    project
        .cm()
        .args(&["compat", "--manifest", "module/cm-module.json"])
        .fails_with(2)
        .stderr_has("module 'search'");
}

#[test]
fn invalid_version_is_a_usage_error() {
    cli().args(&["compat", "two"]).fails_with(2).stderr_has("invalid value");
}

#[test]
fn version_and_manifest_conflict() {
    cli().args(&["compat", "2.0.0", "--manifest", "x"]).fails_with(2);
}
