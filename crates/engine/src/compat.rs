// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependent-module compatibility against the running engine.

use cm_core::{Compatibility, CompatibilityError, Version, ENGINE_VERSION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Manifest file a dependent module ships at its root
pub const MODULE_MANIFEST_FILE: &str = "cm-module.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    pub name: String,
    /// Engine version the module was built against
    pub engine_version: Version,
}

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("IO error reading {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid module manifest {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("module '{name}': {source}")]
    Incompatible { name: String, source: CompatibilityError },
}

/// Compare a declared build-target version with the running engine.
///
/// Minor drift is logged and passes; a major mismatch is an error.
pub fn check_compatibility(declared: &Version) -> Result<Compatibility, CompatibilityError> {
    let result = cm_core::check_compatibility(declared, &ENGINE_VERSION);
    if let Compatibility::Warning { declared, running } = &result {
        warn!(%declared, %running, "module built for a different engine minor version");
    }
    result.into_result()
}

impl ModuleManifest {
    /// Read a manifest file, or `cm-module.json` inside a directory.
    pub fn load(path: &Path) -> Result<Self, ModuleError> {
        let path = if path.is_dir() { path.join(MODULE_MANIFEST_FILE) } else { path.to_path_buf() };
        let content = std::fs::read_to_string(&path)
            .map_err(|source| ModuleError::Io { path: path.clone(), source })?;
        serde_json::from_str(&content).map_err(|source| ModuleError::Json { path, source })
    }

    pub fn check(&self) -> Result<Compatibility, ModuleError> {
        check_compatibility(&self.engine_version)
            .map_err(|source| ModuleError::Incompatible { name: self.name.clone(), source })
    }
}

/// Load a module manifest and check it against the running engine.
pub fn check_module(path: &Path) -> Result<(ModuleManifest, Compatibility), ModuleError> {
    let manifest = ModuleManifest::load(path)?;
    let compat = manifest.check()?;
    Ok((manifest, compat))
}
