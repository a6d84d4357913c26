// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breaking-change detection between two shapes.

use crate::shape::{FieldShape, Shape};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One structural difference between an old and a new shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum BreakingChange {
    FieldRemoved { path: String, was: String },
    TypeChanged { path: String, old_type: String, new_type: String },
    EnumValueRemoved { path: String, removed: Vec<String> },
    NewRequiredFieldWithoutDefault { path: String },
    /// A removed and an added field of the same primitive type in the same
    /// object. Reported for review only; never applied automatically.
    LikelyRename { from: String, to: String, field_type: String },
}

impl BreakingChange {
    pub fn path(&self) -> &str {
        match self {
            BreakingChange::FieldRemoved { path, .. }
            | BreakingChange::TypeChanged { path, .. }
            | BreakingChange::EnumValueRemoved { path, .. }
            | BreakingChange::NewRequiredFieldWithoutDefault { path } => path,
            BreakingChange::LikelyRename { from, .. } => from,
        }
    }

    pub fn is_breaking(&self) -> bool {
        !matches!(self, BreakingChange::LikelyRename { .. })
    }
}

impl fmt::Display for BreakingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakingChange::FieldRemoved { path, was } => write!(f, "- {path} ({was}) removed"),
            BreakingChange::TypeChanged { path, old_type, new_type } => {
                write!(f, "~ {path}: {old_type} -> {new_type}")
            }
            BreakingChange::EnumValueRemoved { path, removed } => {
                write!(f, "~ {path}: enum values removed [{}]", removed.join(", "))
            }
            BreakingChange::NewRequiredFieldWithoutDefault { path } => {
                write!(f, "+ {path} is required and has no default")
            }
            BreakingChange::LikelyRename { from, to, field_type } => {
                write!(f, "? {from} -> {to} ({field_type}) looks like a rename")
            }
        }
    }
}

/// Compare two shapes and list everything a document valid under `old`
/// could trip over under `new`, ordered by path.
///
/// Additive changes are not reported: new optional or defaulted fields, new
/// enum values, and changed default values.
pub fn detect_breaking_changes(old: &Shape, new: &Shape) -> Vec<BreakingChange> {
    let mut changes = Vec::new();
    compare(old, new, "", &mut changes);
    changes.sort_by(|a, b| a.path().cmp(b.path()));
    changes
}

/// Format changes for display, one per line.
pub fn format_changes(changes: &[BreakingChange]) -> String {
    changes.iter().map(|c| format!("  {c}")).collect::<Vec<_>>().join("\n")
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn compare(old: &Shape, new: &Shape, path: &str, out: &mut Vec<BreakingChange>) {
    match (old, new) {
        (
            Shape::Object { required: old_required, fields: old_fields },
            Shape::Object { required: new_required, fields: new_fields },
        ) => compare_objects(
            (old_required, old_fields),
            (new_required, new_fields),
            path,
            out,
        ),
        (Shape::Array { items: a }, Shape::Array { items: b }) => {
            compare(a, b, &format!("{path}[]"), out)
        }
        (Shape::Map { values: a }, Shape::Map { values: b }) => compare(a, b, &join(path, "*"), out),
        (Shape::Enum { values: a }, Shape::Enum { values: b }) => {
            let removed: Vec<String> = a.difference(b).cloned().collect();
            if !removed.is_empty() {
                out.push(BreakingChange::EnumValueRemoved { path: path.to_string(), removed });
            }
        }
        (a, b) if a.type_name() != b.type_name() => out.push(BreakingChange::TypeChanged {
            path: path.to_string(),
            old_type: a.type_name().to_string(),
            new_type: b.type_name().to_string(),
        }),
        _ => {}
    }
}

type ObjectParts<'a> = (&'a BTreeSet<String>, &'a BTreeMap<String, FieldShape>);

/// A field may be absent from a document exactly when it is optional or defaulted.
fn may_be_absent(required: &BTreeSet<String>, name: &str, field: &FieldShape) -> bool {
    !required.contains(name) || field.has_default
}

fn compare_objects(
    (old_required, old_fields): ObjectParts<'_>,
    (new_required, new_fields): ObjectParts<'_>,
    prefix: &str,
    out: &mut Vec<BreakingChange>,
) {
    let mut removed = Vec::new();
    let mut added = Vec::new();

    let names: BTreeSet<&String> = old_fields.keys().chain(new_fields.keys()).collect();
    for name in names {
        let path = join(prefix, name);
        match (old_fields.get(name), new_fields.get(name)) {
            (Some(old), None) => {
                out.push(BreakingChange::FieldRemoved {
                    path,
                    was: old.shape.type_name().to_string(),
                });
                removed.push((name, old));
            }
            (None, Some(new)) => {
                if !may_be_absent(new_required, name, new) {
                    out.push(BreakingChange::NewRequiredFieldWithoutDefault { path });
                }
                added.push((name, new));
            }
            (Some(old), Some(new)) => {
                compare(&old.shape, &new.shape, &path, out);
                if may_be_absent(old_required, name, old) && !may_be_absent(new_required, name, new)
                {
                    out.push(BreakingChange::NewRequiredFieldWithoutDefault { path });
                }
            }
            (None, None) => {}
        }
    }

    for (from, old) in &removed {
        for (to, new) in &added {
            if old.shape.is_primitive() && old.shape.type_name() == new.shape.type_name() {
                out.push(BreakingChange::LikelyRename {
                    from: join(prefix, from),
                    to: join(prefix, to),
                    field_type: old.shape.type_name().to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
