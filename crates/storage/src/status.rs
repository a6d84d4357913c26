// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient record of an in-flight migration run.
//!
//! Written after the backup is taken and checkpointed after every migrated
//! file; a record found at startup means the previous run did not finish.

use crate::atomic::write_json_atomic;
use chrono::{DateTime, Utc};
use cm_core::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Record file name inside the state directory
pub const STATUS_FILE_NAME: &str = ".migrate-status.json";

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt status record: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub started_at: DateTime<Utc>,
    pub from_version: Version,
    pub to_version: Version,
    /// Paths relative to the state directory
    pub completed_files: Vec<String>,
    pub state: RunState,
    pub backup_path: PathBuf,
}

impl StatusRecord {
    pub fn new(from: Version, to: Version, backup_path: PathBuf, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            from_version: from,
            to_version: to,
            completed_files: Vec::new(),
            state: RunState::InProgress,
            backup_path,
        }
    }

    pub fn is_completed(&self, file: &str) -> bool {
        self.completed_files.iter().any(|f| f == file)
    }

    pub fn mark_completed(&mut self, file: impl Into<String>) {
        let file = file.into();
        if !self.is_completed(&file) {
            self.completed_files.push(file);
        }
    }
}

/// Loads, checkpoints, and clears the status record.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<StatusRecord>, StatusError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, record: &StatusRecord) -> Result<(), StatusError> {
        write_json_atomic(&self.path, record)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StatusError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
