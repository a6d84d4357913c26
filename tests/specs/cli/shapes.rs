//! `cm shapes` specs

use crate::prelude::*;

const ARTIFACT: &str = "schema/shapes.lock.json";

fn read_artifact(project: &Project) -> Value {
    serde_json::from_str(&std::fs::read_to_string(project.root().join(ARTIFACT)).unwrap()).unwrap()
}

#[test]
fn generate_writes_every_kind_and_the_manifest() {
    let project = Project::empty();

    project.cm().args(&["shapes", "generate"]).passes().stdout_has("wrote schema/shapes.lock.json");

    let artifact = read_artifact(&project);
    assert_eq!(artifact["format"], 1);
    assert_eq!(artifact["engineVersion"], "2.0.0");
    assert!(artifact["kinds"]["agent"]["hash"].is_string());
    assert!(artifact["kinds"]["preferences"]["shape"].is_object());
    let versions: Vec<&str> =
        artifact["migrations"].as_array().unwrap().iter().map(|m| m["version"].as_str().unwrap()).collect();
    assert_eq!(versions, vec!["1.6.0", "1.7.0", "2.0.0"]);
}

#[test]
fn generate_leaves_an_up_to_date_artifact_alone() {
    let project = Project::empty();
    project.cm().args(&["shapes", "generate"]).passes();
    let first = std::fs::read_to_string(project.root().join(ARTIFACT)).unwrap();

    project.cm().args(&["shapes", "generate"]).passes().stdout_has("is up to date");

    assert_eq!(std::fs::read_to_string(project.root().join(ARTIFACT)).unwrap(), first);
}

#[test]
fn check_passes_after_generate() {
    let project = Project::empty();
    project.cm().args(&["shapes", "generate"]).passes();

    project.cm().args(&["shapes", "check"]).passes().stdout_has("is up to date");
}

#[test]
fn check_rejects_a_missing_artifact() {
    Project::empty()
        .cm()
        .args(&["shapes", "check"])
        .fails_with(2)
        .stderr_has("is missing; run `cm shapes generate`");
}

#[test]
fn check_names_the_kind_whose_shape_drifted() {
    let project = Project::empty();
    project.cm().args(&["shapes", "generate"]).passes();
    let mut artifact = read_artifact(&project);
    artifact["kinds"]["agent"]["hash"] = json!("0000");
    project.file(ARTIFACT, &serde_json::to_string_pretty(&artifact).unwrap());

    project.cm().args(&["shapes", "check"]).fails_with(2).stderr_has("shapes changed: agent");
}

#[test]
fn custom_artifact_path() {
    let project = Project::empty();

    project.cm().args(&["shapes", "generate", "--path", "out/shapes.json"]).passes();

    assert!(project.root().join("out/shapes.json").exists());
    project.cm().args(&["shapes", "check", "--path", "out/shapes.json"]).passes();
}
