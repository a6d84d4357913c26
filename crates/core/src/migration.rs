// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version-tagged config migrations and the registry that orders them.
//!
//! A [`Migration`] is immutable data: the version it brings a document to, a
//! description, whether the schema change behind it is breaking, and one pure
//! transform per config kind it touches. The [`MigrationRegistry`] holds them
//! in strictly ascending version order and answers range queries.
//!
//! Shipped migrations are never edited. New schema changes append a new entry
//! with a higher version.

use crate::kind::ConfigKind;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A pure document transform for one config kind.
///
/// Receives the whole document and returns the whole document. Transforms must
/// tolerate fields they rewrite being absent so legacy files without a version
/// can be folded through the full chain.
pub type Transform = fn(Value) -> Result<Value, TransformError>;

/// Errors raised by an individual transform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("expected '{field}' to be {expected}")]
    UnexpectedType { field: String, expected: &'static str },

    #[error("document root must be an object")]
    NotAnObject,

    #[error("{0}")]
    Other(String),
}

/// One shipped migration step.
#[derive(Debug, Clone)]
pub struct Migration {
    /// The version a document is at after this migration is applied
    pub version: Version,
    pub description: &'static str,
    /// Whether the schema change behind this migration is breaking
    pub breaking: bool,
    pub transforms: &'static [(ConfigKind, Transform)],
}

impl Migration {
    /// The transform for `kind`, if this migration touches it.
    pub fn transform_for(&self, kind: ConfigKind) -> Option<Transform> {
        self.transforms.iter().find(|(k, _)| *k == kind).map(|(_, t)| *t)
    }

    /// Kinds this migration supplies transforms for, sorted.
    pub fn kinds(&self) -> Vec<ConfigKind> {
        let mut kinds: Vec<ConfigKind> = self.transforms.iter().map(|(k, _)| *k).collect();
        kinds.sort();
        kinds
    }

    pub fn manifest_entry(&self) -> ManifestEntry {
        ManifestEntry {
            version: self.version,
            description: self.description.to_string(),
            breaking: self.breaking,
            kinds: self.kinds(),
        }
    }
}

/// Serializable description of a migration, recorded in the committed shape
/// artifact so later builds can tell which migrations already shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub version: Version,
    pub description: String,
    pub breaking: bool,
    pub kinds: Vec<ConfigKind>,
}

/// Registry invariant violations, detected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("migration {next} is listed after {previous}; versions must be strictly ascending")]
    NotAscending { previous: Version, next: Version },

    #[error("duplicate migration version {0}")]
    Duplicate(Version),

    #[error("migration {0} declares no transforms")]
    NoTransforms(Version),

    #[error("migration {version} declares more than one transform for '{kind}'")]
    DuplicateKind { version: Version, kind: ConfigKind },
}

/// Ordered, validated list of migrations.
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    migrations: Vec<Migration>,
}

impl MigrationRegistry {
    /// Build a registry, enforcing ascending unique versions and at least one
    /// transform (and at most one per kind) on every migration.
    pub fn new(migrations: Vec<Migration>) -> Result<Self, RegistryError> {
        for pair in migrations.windows(2) {
            let (previous, next) = (pair[0].version, pair[1].version);
            if previous == next {
                return Err(RegistryError::Duplicate(next));
            }
            if next < previous {
                return Err(RegistryError::NotAscending { previous, next });
            }
        }
        for migration in &migrations {
            if migration.transforms.is_empty() {
                return Err(RegistryError::NoTransforms(migration.version));
            }
            let kinds = migration.kinds();
            if let Some(dup) = kinds.windows(2).find(|w| w[0] == w[1]) {
                return Err(RegistryError::DuplicateKind {
                    version: migration.version,
                    kind: dup[0],
                });
            }
        }
        Ok(Self { migrations })
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// The highest registered version.
    pub fn latest(&self) -> Option<Version> {
        self.migrations.last().map(|m| m.version)
    }

    /// Migrations with `from < version <= to`, ascending.
    pub fn migrations_between(&self, from: &Version, to: &Version) -> &[Migration] {
        let start = self.migrations.partition_point(|m| m.version <= *from);
        let end = self.migrations.partition_point(|m| m.version <= *to);
        if start >= end {
            &[]
        } else {
            &self.migrations[start..end]
        }
    }

    /// Whether any migration in `(from, to]` is flagged breaking.
    pub fn has_breaking_changes_between(&self, from: &Version, to: &Version) -> bool {
        self.migrations_between(from, to).iter().any(|m| m.breaking)
    }

    /// The ordered transform chain for one kind over `(from, to]`.
    pub fn transforms_for(
        &self,
        kind: ConfigKind,
        from: &Version,
        to: &Version,
    ) -> Vec<(Version, Transform)> {
        self.migrations_between(from, to)
            .iter()
            .filter_map(|m| m.transform_for(kind).map(|t| (m.version, t)))
            .collect()
    }

    pub fn manifest(&self) -> Vec<ManifestEntry> {
        self.migrations.iter().map(Migration::manifest_entry).collect()
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
