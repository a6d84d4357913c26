// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative schema definitions for config documents, and structural
//! validation of a JSON document against them.
//!
//! Validation is structural only: types, requiredness, enum membership, and
//! unrecognized fields. Business rules about values are out of scope.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    /// Any JSON value; contents are never inspected
    Any,
    Enum(BTreeSet<String>),
    Array(Box<FieldType>),
    /// Object with free-form keys and uniformly typed values
    Map(Box<FieldType>),
    Object(ObjectDef),
}

impl FieldType {
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldType::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn array_of(item: FieldType) -> Self {
        FieldType::Array(Box::new(item))
    }

    pub fn map_of(value: FieldType) -> Self {
        FieldType::Map(Box::new(value))
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Any => "any",
            FieldType::Enum(_) => "enum",
            FieldType::Array(_) => "array",
            FieldType::Map(_) => "map",
            FieldType::Object(_) => "object",
        }
    }
}

/// A single declared field of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub required: bool,
    /// Default applied at validation time when the field is absent
    pub default: Option<Value>,
}

/// An object schema: a set of named fields.
///
/// Declaration order is kept for readability but carries no meaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectDef {
    fields: Vec<FieldDef>,
}

impl ObjectDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field(FieldDef { name: name.into(), ty, required: true, default: None })
    }

    pub fn optional(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field(FieldDef { name: name.into(), ty, required: false, default: None })
    }

    /// A required field whose absence is filled by `default`.
    pub fn with_default(self, name: impl Into<String>, ty: FieldType, default: Value) -> Self {
        self.field(FieldDef { name: name.into(), ty, required: true, default: Some(default) })
    }

    /// Add a field, replacing any earlier declaration with the same name.
    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.retain(|f| f.name != def.name);
        self.fields.push(def);
        self
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One structural problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

/// Result of validating a document against an [`ObjectDef`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Dotted paths of fields the schema does not recognize
    pub unknown_fields: Vec<String>,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_fields.is_empty() && self.violations.is_empty()
    }

    fn violation(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation { path: path.to_string(), message: message.into() });
    }
}

/// Validate `value` against `schema`.
pub fn validate(value: &Value, schema: &ObjectDef) -> ValidationReport {
    let mut report = ValidationReport::default();
    match value.as_object() {
        Some(map) => check_object(map, schema, "", &mut report),
        None => report.violation("", format!("expected object, found {}", json_type(value))),
    }
    report.unknown_fields.sort();
    report
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn check_object(map: &Map<String, Value>, schema: &ObjectDef, prefix: &str, report: &mut ValidationReport) {
    for def in schema.fields() {
        let path = join(prefix, &def.name);
        match map.get(&def.name) {
            Some(value) => check_value(value, &def.ty, &path, report),
            None if def.required && def.default.is_none() => {
                report.violation(&path, "required field is missing");
            }
            None => {}
        }
    }

    report.unknown_fields.extend(
        map.keys().filter(|key| schema.get(key).is_none()).map(|key| join(prefix, key)),
    );
}

fn check_value(value: &Value, ty: &FieldType, path: &str, report: &mut ValidationReport) {
    let mismatch = |report: &mut ValidationReport| {
        report.violation(path, format!("expected {}, found {}", ty.name(), json_type(value)));
    };

    match ty {
        FieldType::Any => {}
        FieldType::String => {
            if !value.is_string() {
                mismatch(report);
            }
        }
        FieldType::Number => {
            if !value.is_number() {
                mismatch(report);
            }
        }
        FieldType::Integer => {
            if !(value.is_i64() || value.is_u64()) {
                mismatch(report);
            }
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                mismatch(report);
            }
        }
        FieldType::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(s) => {}
            Some(s) => {
                let expected: Vec<&str> = allowed.iter().map(String::as_str).collect();
                report.violation(path, format!("'{s}' is not one of [{}]", expected.join(", ")));
            }
            None => mismatch(report),
        },
        FieldType::Array(item) => match value.as_array() {
            Some(items) => {
                for (i, element) in items.iter().enumerate() {
                    check_value(element, item, &format!("{path}[{i}]"), report);
                }
            }
            None => mismatch(report),
        },
        FieldType::Map(inner) => match value.as_object() {
            Some(map) => {
                for (key, element) in map {
                    check_value(element, inner, &join(path, key), report);
                }
            }
            None => mismatch(report),
        },
        FieldType::Object(def) => match value.as_object() {
            Some(map) => check_object(map, def, path, report),
            None => mismatch(report),
        },
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
