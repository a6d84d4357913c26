// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Current schemas of every managed config kind.

use cm_core::ConfigKind;
use cm_shape::{FieldType, ObjectDef};
use serde_json::json;
use std::collections::BTreeMap;

/// Schema per config kind.
pub type SchemaSet = BTreeMap<ConfigKind, ObjectDef>;

/// Schemas at the running engine version.
pub fn current_schemas() -> SchemaSet {
    ConfigKind::ALL.into_iter().map(|kind| (kind, schema_for(kind))).collect()
}

pub fn schema_for(kind: ConfigKind) -> ObjectDef {
    match kind {
        ConfigKind::Agent => agent_schema(),
        ConfigKind::Preferences => preferences_schema(),
    }
}

fn theme() -> FieldType {
    FieldType::enumeration(["dark", "light", "system"])
}

fn agent_schema() -> ObjectDef {
    let llm = ObjectDef::new()
        .required(
            "model",
            FieldType::Object(
                ObjectDef::new()
                    .required("name", FieldType::String)
                    .optional("provider", FieldType::String),
            ),
        )
        .optional("temperature", FieldType::Number)
        .optional("maxTokens", FieldType::Integer);

    let server = ObjectDef::new()
        .required("command", FieldType::String)
        .optional("args", FieldType::array_of(FieldType::String))
        .optional("env", FieldType::map_of(FieldType::String));

    let preferences = ObjectDef::new()
        .optional("ui", FieldType::Object(ObjectDef::new().optional("theme", theme())))
        .optional(
            "approvals",
            FieldType::Object(ObjectDef::new().with_default(
                "mode",
                FieldType::enumeration(["ask", "auto", "never"]),
                json!("ask"),
            )),
        );

    ObjectDef::new()
        .optional("version", FieldType::String)
        .required("name", FieldType::String)
        .optional("description", FieldType::String)
        .required("llm", FieldType::Object(llm))
        .optional("servers", FieldType::map_of(FieldType::Object(server)))
        .optional("tools", FieldType::array_of(FieldType::String))
        .optional("preferences", FieldType::Object(preferences))
}

fn preferences_schema() -> ObjectDef {
    ObjectDef::new()
        .optional("version", FieldType::String)
        .optional(
            "ui",
            FieldType::Object(
                ObjectDef::new()
                    .with_default("theme", theme(), json!("system"))
                    .optional("fontSize", FieldType::Integer),
            ),
        )
        .optional(
            "telemetry",
            FieldType::Object(ObjectDef::new().with_default("enabled", FieldType::Boolean, json!(false))),
        )
        .optional("defaultAgent", FieldType::String)
        .optional("editor", FieldType::String)
}
