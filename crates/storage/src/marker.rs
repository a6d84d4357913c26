// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap marker: the engine version of the last fully successful run.
//!
//! Only consulted for legacy files that carry no `version` field.

use crate::atomic::write_atomic;
use cm_core::{Version, VersionError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker file name inside the state directory
pub const MARKER_FILE_NAME: &str = ".migrate-version";

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("bootstrap marker {} is unreadable: {source}", path.display())]
    Invalid { path: PathBuf, source: VersionError },
}

#[derive(Debug, Clone)]
pub struct BootstrapMarker {
    path: PathBuf,
}

impl BootstrapMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Option<Version>, MarkerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        content
            .parse()
            .map(Some)
            .map_err(|source| MarkerError::Invalid { path: self.path.clone(), source })
    }

    pub fn write(&self, version: &Version) -> Result<(), MarkerError> {
        write_atomic(&self.path, format!("{version}\n").as_bytes())?;
        Ok(())
    }
}
