// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical shapes of schema definitions.
//!
//! A [`Shape`] is the order-independent structural summary of an
//! [`ObjectDef`]: field names and types, which fields are required, which
//! carry defaults, and enum value sets. All collections are sorted, so the
//! serialized form (and therefore [`shape_hash`]) only changes when the
//! structure does.

use crate::schema::{FieldType, ObjectDef};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    String,
    Number,
    Integer,
    Boolean,
    Any,
    Enum { values: BTreeSet<String> },
    Array { items: Box<Shape> },
    Map { values: Box<Shape> },
    Object { required: BTreeSet<String>, fields: BTreeMap<String, FieldShape> },
}

/// Shape of one object field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldShape {
    pub shape: Shape,
    pub has_default: bool,
}

impl Shape {
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::Number => "number",
            Shape::Integer => "integer",
            Shape::Boolean => "boolean",
            Shape::Any => "any",
            Shape::Enum { .. } => "enum",
            Shape::Array { .. } => "array",
            Shape::Map { .. } => "map",
            Shape::Object { .. } => "object",
        }
    }

    /// Scalar types that can plausibly carry a renamed value.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Shape::String | Shape::Number | Shape::Integer | Shape::Boolean | Shape::Enum { .. }
        )
    }
}

/// Extract the canonical shape of an object schema.
pub fn generate_shape(def: &ObjectDef) -> Shape {
    let mut required = BTreeSet::new();
    let mut fields = BTreeMap::new();
    for field in def.fields() {
        if field.required {
            required.insert(field.name.clone());
        }
        fields.insert(
            field.name.clone(),
            FieldShape { shape: shape_of(&field.ty), has_default: field.default.is_some() },
        );
    }
    Shape::Object { required, fields }
}

fn shape_of(ty: &FieldType) -> Shape {
    match ty {
        FieldType::String => Shape::String,
        FieldType::Number => Shape::Number,
        FieldType::Integer => Shape::Integer,
        FieldType::Boolean => Shape::Boolean,
        FieldType::Any => Shape::Any,
        FieldType::Enum(values) => Shape::Enum { values: values.clone() },
        FieldType::Array(item) => Shape::Array { items: Box::new(shape_of(item)) },
        FieldType::Map(value) => Shape::Map { values: Box::new(shape_of(value)) },
        FieldType::Object(def) => generate_shape(def),
    }
}

/// Content hash of a shape: `sha256:` followed by the hex digest of its
/// canonical JSON.
pub fn shape_hash(shape: &Shape) -> String {
    let canonical = serde_json::to_string(shape).unwrap_or_default();
    format!("sha256:{:x}", Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
#[path = "shape_tests.rs"]
mod tests;
