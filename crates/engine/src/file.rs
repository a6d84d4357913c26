// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-file migration state machine.
//!
//! ```text
//! Unversioned --(bootstrap marker)--> Behind --(fold, stamp, validate)--> Current
//!                                        \--> Invalid
//! ```
//!
//! Nothing is written unless the migrated document validates cleanly against
//! the target schema.

use crate::layout::ConfigFile;
use crate::report::FileResult;
use crate::schemas::SchemaSet;
use cm_core::{ConfigKind, MigrationRegistry, Version};
use cm_shape::{validate, Violation};
use cm_storage::write_json_atomic;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a file could not be migrated. The file is left untouched.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum FileError {
    #[error("not a valid config document: {message}")]
    Parse { message: String },
    #[error("invalid version field '{value}'")]
    InvalidVersion { value: String },
    #[error("written by engine {version}, newer than running engine {running}; {remediation}")]
    FutureVersion { version: Version, running: Version, remediation: String },
    #[error("migration {version} failed: {message}")]
    Transform { version: Version, message: String },
    #[error("{}", describe_validation(unknown_fields, violations))]
    Validation { unknown_fields: Vec<String>, violations: Vec<Violation> },
    #[error("no schema for config kind '{kind}'")]
    NoSchema { kind: ConfigKind },
    #[error("IO error: {message}")]
    Io { message: String },
}

fn describe_validation(unknown_fields: &[String], violations: &[Violation]) -> String {
    let mut parts = Vec::new();
    if !unknown_fields.is_empty() {
        parts.push(format!("unrecognized fields: {}", unknown_fields.join(", ")));
    }
    for v in violations {
        parts.push(format!("{}: {}", v.path, v.message));
    }
    format!("result does not match the current schema ({})", parts.join("; "))
}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        FileError::Io { message: e.to_string() }
    }
}

/// Where a file stands relative to the running engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum FileState {
    /// No `version` field; starts from the bootstrap marker (or `0.0.0`)
    Unversioned { assumed: Version },
    Behind { version: Version },
    Current,
    Invalid { error: FileError },
}

impl FileState {
    /// Version the file's migration chain starts from.
    pub fn start(&self, target: &Version) -> Option<Version> {
        match self {
            FileState::Unversioned { assumed } => Some(*assumed),
            FileState::Behind { version } => Some(*version),
            FileState::Current => Some(*target),
            FileState::Invalid { .. } => None,
        }
    }

    pub fn needs_migration(&self) -> bool {
        matches!(self, FileState::Unversioned { .. } | FileState::Behind { .. })
    }
}

/// A document that migrated and validated, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    pub document: Value,
    pub from: Version,
    pub applied: Vec<Version>,
}

pub fn read_document(path: &Path) -> Result<Value, FileError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| FileError::Parse { message: e.to_string() })
}

/// Drives single documents through the state machine.
pub struct FileMigrator<'a> {
    registry: &'a MigrationRegistry,
    schemas: &'a SchemaSet,
    target: Version,
    bootstrap: Option<Version>,
}

impl<'a> FileMigrator<'a> {
    pub fn new(
        registry: &'a MigrationRegistry,
        schemas: &'a SchemaSet,
        target: Version,
        bootstrap: Option<Version>,
    ) -> Self {
        Self { registry, schemas, target, bootstrap }
    }

    fn future(&self, version: Version) -> FileError {
        FileError::FutureVersion {
            version,
            running: self.target,
            remediation: format!(
                "upgrade the engine to {version} or later, or restore a backup taken by this engine"
            ),
        }
    }

    pub fn classify(&self, doc: &Value) -> FileState {
        let Some(obj) = doc.as_object() else {
            return FileState::Invalid {
                error: FileError::Parse { message: "document root must be an object".to_string() },
            };
        };
        let version = match obj.get("version") {
            None => {
                let assumed = self.bootstrap.unwrap_or(Version::ZERO);
                if assumed > self.target {
                    return FileState::Invalid { error: self.future(assumed) };
                }
                return FileState::Unversioned { assumed };
            }
            Some(Value::String(s)) => match s.parse::<Version>() {
                Ok(v) => v,
                Err(_) => {
                    return FileState::Invalid {
                        error: FileError::InvalidVersion { value: s.clone() },
                    }
                }
            },
            Some(other) => {
                return FileState::Invalid {
                    error: FileError::InvalidVersion { value: other.to_string() },
                }
            }
        };

        match version.cmp(&self.target) {
            std::cmp::Ordering::Equal => FileState::Current,
            std::cmp::Ordering::Less => FileState::Behind { version },
            std::cmp::Ordering::Greater => FileState::Invalid { error: self.future(version) },
        }
    }

    /// Run `doc` to the target version. `Ok(None)` means it is already current.
    pub fn migrate_document(&self, kind: ConfigKind, doc: Value) -> Result<Option<Migrated>, FileError> {
        let from = match self.classify(&doc) {
            FileState::Current => return Ok(None),
            FileState::Invalid { error } => return Err(error),
            FileState::Unversioned { assumed } => assumed,
            FileState::Behind { version } => version,
        };
        let schema = self.schemas.get(&kind).ok_or(FileError::NoSchema { kind })?;

        let chain = self.registry.transforms_for(kind, &from, &self.target);
        let applied: Vec<Version> = chain.iter().map(|(v, _)| *v).collect();
        let mut document = chain.into_iter().try_fold(doc, |doc, (version, transform)| {
            debug!(%kind, %version, "applying transform");
            transform(doc).map_err(|e| FileError::Transform { version, message: e.to_string() })
        })?;

        let Some(obj) = document.as_object_mut() else {
            return Err(FileError::Parse {
                message: "migration produced a non-object document".to_string(),
            });
        };
        obj.insert("version".to_string(), Value::String(self.target.to_string()));

        let report = validate(&document, schema);
        if !report.is_clean() {
            return Err(FileError::Validation {
                unknown_fields: report.unknown_fields,
                violations: report.violations,
            });
        }
        Ok(Some(Migrated { document, from, applied }))
    }

    /// Read, migrate, and atomically rewrite one file.
    pub fn migrate_file(&self, file: &ConfigFile) -> Result<FileResult, FileError> {
        let doc = read_document(&file.path)?;
        match self.migrate_document(file.kind, doc)? {
            None => Ok(FileResult::Unchanged),
            Some(migrated) => {
                write_json_atomic(&file.path, &migrated.document)?;
                debug!(file = %file.rel, from = %migrated.from, to = %self.target, "file migrated");
                Ok(FileResult::Migrated {
                    from: migrated.from,
                    to: self.target,
                    applied: migrated.applied,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
