// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shipped migrations.
//!
//! Append-only: a released entry is never edited or removed. Every transform
//! leaves documents that lack the fields it rewrites untouched, so a legacy
//! file can be folded through the full chain.

use cm_core::{ConfigKind, Migration, MigrationRegistry, RegistryError, Transform, TransformError, Version};
use serde_json::{json, Map, Value};

type Object = Map<String, Value>;

const V1_6_0: &[(ConfigKind, Transform)] = &[(ConfigKind::Agent, agent_model_to_llm)];
const V1_7_0: &[(ConfigKind, Transform)] = &[(ConfigKind::Agent, agent_mcp_servers_to_servers)];
const V2_0_0: &[(ConfigKind, Transform)] = &[
    (ConfigKind::Agent, agent_nest_preferences),
    (ConfigKind::Preferences, preferences_nest_sections),
];

pub fn builtin_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: Version::new(1, 6, 0),
            description: "agent: move `model` to `llm.model.name`",
            breaking: true,
            transforms: V1_6_0,
        },
        Migration {
            version: Version::new(1, 7, 0),
            description: "agent: rename `mcpServers` to `servers`",
            breaking: true,
            transforms: V1_7_0,
        },
        Migration {
            version: Version::new(2, 0, 0),
            description: "nest theme under `ui`, approvals and telemetry under their own sections",
            breaking: true,
            transforms: V2_0_0,
        },
    ]
}

pub fn builtin_registry() -> Result<MigrationRegistry, RegistryError> {
    MigrationRegistry::new(builtin_migrations())
}

fn on_object(
    mut doc: Value,
    f: impl FnOnce(&mut Object) -> Result<(), TransformError>,
) -> Result<Value, TransformError> {
    f(doc.as_object_mut().ok_or(TransformError::NotAnObject)?)?;
    Ok(doc)
}

fn unexpected(path: &[&str], expected: &'static str) -> TransformError {
    TransformError::UnexpectedType { field: path.join("."), expected }
}

/// The object at `path`, created when absent.
fn object_at<'a>(obj: &'a mut Object, path: &[&str]) -> Result<&'a mut Object, TransformError> {
    descend(obj, path, path)
}

fn descend<'a>(obj: &'a mut Object, full: &[&str], rest: &[&str]) -> Result<&'a mut Object, TransformError> {
    let Some((head, tail)) = rest.split_first() else {
        return Ok(obj);
    };
    let depth = full.len() - tail.len();
    match obj.entry(head.to_string()).or_insert_with(|| Value::Object(Map::new())) {
        Value::Object(next) => descend(next, full, tail),
        _ => Err(unexpected(&full[..depth], "an object")),
    }
}

/// Remove and return the value at `path`, if present.
fn take(obj: &mut Object, path: &[&str]) -> Result<Option<Value>, TransformError> {
    take_in(obj, path, path)
}

fn take_in(obj: &mut Object, full: &[&str], rest: &[&str]) -> Result<Option<Value>, TransformError> {
    match rest {
        [] => Ok(None),
        [leaf] => Ok(obj.remove(*leaf)),
        [head, tail @ ..] => match obj.get_mut(*head) {
            None => Ok(None),
            Some(Value::Object(next)) => take_in(next, full, tail),
            Some(_) => Err(unexpected(&full[..full.len() - tail.len()], "an object")),
        },
    }
}

/// Set the value at `path`. An existing different value is a conflict: the
/// user's data would otherwise be silently overwritten.
fn put(obj: &mut Object, path: &[&str], value: Value) -> Result<(), TransformError> {
    let Some((leaf, parents)) = path.split_last() else {
        return Err(TransformError::Other("empty field path".to_string()));
    };
    let target = object_at(obj, parents)?;
    match target.get(*leaf) {
        Some(existing) if *existing != value => Err(TransformError::Other(format!(
            "'{}' is already set to a different value",
            path.join(".")
        ))),
        _ => {
            target.insert(leaf.to_string(), value);
            Ok(())
        }
    }
}

fn move_field(obj: &mut Object, from: &[&str], to: &[&str]) -> Result<(), TransformError> {
    if let Some(value) = take(obj, from)? {
        put(obj, to, value)?;
    }
    Ok(())
}

/// 1.6.0: `model: "gpt"` becomes `llm: { model: { name: "gpt" } }`.
fn agent_model_to_llm(doc: Value) -> Result<Value, TransformError> {
    on_object(doc, |obj| {
        let target: Option<&[&str]> = match obj.get("model") {
            None => None,
            Some(Value::String(_)) => Some(&["llm", "model", "name"][..]),
            Some(Value::Object(_)) => Some(&["llm", "model"][..]),
            Some(_) => return Err(unexpected(&["model"], "a string or an object")),
        };
        match target {
            Some(to) => move_field(obj, &["model"], to),
            None => Ok(()),
        }
    })
}

/// 1.7.0: `mcpServers` becomes `servers`; entries merge with any existing
/// `servers` map.
fn agent_mcp_servers_to_servers(doc: Value) -> Result<Value, TransformError> {
    on_object(doc, |obj| {
        let Some(legacy) = obj.remove("mcpServers") else {
            return Ok(());
        };
        let Value::Object(entries) = legacy else {
            return Err(unexpected(&["mcpServers"], "an object"));
        };
        object_at(obj, &["servers"])?;
        for (name, server) in entries {
            put(obj, &["servers", name.as_str()], server)?;
        }
        Ok(())
    })
}

/// 2.0.0: agent `preferences.theme` moves to `preferences.ui.theme` and the
/// `preferences.autoApprove` flag becomes `preferences.approvals.mode`.
fn agent_nest_preferences(doc: Value) -> Result<Value, TransformError> {
    on_object(doc, |obj| {
        move_field(obj, &["preferences", "theme"], &["preferences", "ui", "theme"])?;
        let mode = match take(obj, &["preferences", "autoApprove"])? {
            None => return Ok(()),
            Some(Value::Bool(true)) => "auto",
            Some(Value::Bool(false)) => "ask",
            Some(_) => return Err(unexpected(&["preferences", "autoApprove"], "a boolean")),
        };
        put(obj, &["preferences", "approvals", "mode"], json!(mode))
    })
}

/// 2.0.0: preferences `theme` moves to `ui.theme`; `telemetry: bool` becomes
/// `telemetry: { enabled: bool }`.
fn preferences_nest_sections(doc: Value) -> Result<Value, TransformError> {
    on_object(doc, |obj| {
        move_field(obj, &["theme"], &["ui", "theme"])?;
        match obj.get("telemetry").cloned() {
            None | Some(Value::Object(_)) => Ok(()),
            Some(Value::Bool(enabled)) => {
                obj.insert("telemetry".to_string(), json!({ "enabled": enabled }));
                Ok(())
            }
            Some(_) => Err(unexpected(&["telemetry"], "a boolean or an object")),
        }
    })
}

#[cfg(test)]
#[path = "migrations_tests.rs"]
mod tests;
