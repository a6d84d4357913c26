//! Breaking-change detection specs
//!
//! Shapes are compared structurally; only changes an existing document
//! could trip over are reported as breaking.

use crate::prelude::*;
use cm_shape::{detect_breaking_changes, generate_shape, BreakingChange, FieldType, ObjectDef};

#[test]
fn removed_field_is_the_only_change() {
    let old = ObjectDef::new().required("a", FieldType::String).required("b", FieldType::Number);
    let new = ObjectDef::new().required("a", FieldType::String);

    let changes = detect_breaking_changes(&generate_shape(&old), &generate_shape(&new));

    assert_eq!(changes, vec![BreakingChange::FieldRemoved { path: "b".to_string(), was: "number".to_string() }]);
}

#[test]
fn declaration_order_does_not_matter() {
    let old = ObjectDef::new().required("a", FieldType::String).optional("b", FieldType::Boolean);
    let new = ObjectDef::new().optional("b", FieldType::Boolean).required("a", FieldType::String);

    assert!(detect_breaking_changes(&generate_shape(&old), &generate_shape(&new)).is_empty());
}

#[test]
fn shipped_preferences_change_is_breaking() {
    let legacy = ObjectDef::new()
        .optional("theme", FieldType::enumeration(["dark", "light", "system"]))
        .optional("telemetry", FieldType::Boolean);
    let current = cm_engine::schema_for(cm_core::ConfigKind::Preferences);

    let changes = detect_breaking_changes(&generate_shape(&legacy), &generate_shape(&current));

    let paths: Vec<&str> = changes.iter().filter(|c| c.is_breaking()).map(|c| c.path()).collect();
    assert_eq!(paths, vec!["telemetry", "theme"]);
}
