// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The committed shape artifact (`schema/shapes.lock.json`).

use chrono::{DateTime, Utc};
use cm_core::{Clock, ConfigKind, ManifestEntry, MigrationRegistry, Version, ENGINE_VERSION};
use cm_engine::SchemaSet;
use cm_shape::{generate_shape, shape_hash, Shape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Artifact location relative to the repository root
pub const ARTIFACT_PATH: &str = "schema/shapes.lock.json";

/// Artifact format version
pub const ARTIFACT_FORMAT: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("IO error on {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid shape artifact {origin}: {source}")]
    Json { origin: String, source: serde_json::Error },
    #[error("unsupported shape artifact format {found} (expected {ARTIFACT_FORMAT})")]
    Format { found: u32 },
}

/// Shape and content hash of one config kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindShape {
    pub hash: String,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeArtifact {
    pub format: u32,
    pub generated_at: DateTime<Utc>,
    pub engine_version: Version,
    pub kinds: BTreeMap<ConfigKind, KindShape>,
    /// Every shipped migration, ascending
    pub migrations: Vec<ManifestEntry>,
}

impl ShapeArtifact {
    pub fn generate(schemas: &SchemaSet, registry: &MigrationRegistry, clock: &impl Clock) -> Self {
        let kinds = schemas
            .iter()
            .map(|(kind, schema)| {
                let shape = generate_shape(schema);
                (*kind, KindShape { hash: shape_hash(&shape), shape })
            })
            .collect();
        Self {
            format: ARTIFACT_FORMAT,
            generated_at: clock.now_utc(),
            engine_version: ENGINE_VERSION,
            kinds,
            migrations: registry.manifest(),
        }
    }

    /// Parse artifact JSON. `origin` names the source in errors.
    pub fn from_json(json: &str, origin: &str) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(json)
            .map_err(|source| ArtifactError::Json { origin: origin.to_string(), source })?;
        if artifact.format != ARTIFACT_FORMAT {
            return Err(ArtifactError::Format { found: artifact.format });
        }
        Ok(artifact)
    }

    /// Load from disk; `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ArtifactError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ArtifactError::Io { path: path.to_path_buf(), source }),
        };
        Self::from_json(&content, &path.display().to_string()).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let io_err = |source| ArtifactError::Io { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        cm_storage::write_json_atomic(path, self).map_err(io_err)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn hash_of(&self, kind: ConfigKind) -> Option<&str> {
        self.kinds.get(&kind).map(|k| k.hash.as_str())
    }

    /// Kinds whose hash differs between the two artifacts, including kinds
    /// present in only one of them.
    pub fn changed_kinds(&self, other: &ShapeArtifact) -> Vec<ConfigKind> {
        let mut kinds: Vec<ConfigKind> = self.kinds.keys().chain(other.kinds.keys()).copied().collect();
        kinds.sort();
        kinds.dedup();
        kinds.retain(|kind| self.hash_of(*kind) != other.hash_of(*kind));
        kinds
    }

    /// Same shapes and same migration manifest. Timestamps and the generating
    /// engine version are ignored.
    pub fn same_content(&self, other: &ShapeArtifact) -> bool {
        self.changed_kinds(other).is_empty() && self.migrations == other.migrations
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
