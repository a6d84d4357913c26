// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of a migration run.

use crate::file::FileError;
use cm_core::Version;
use cm_storage::BackupId;
use serde::Serialize;
use std::path::PathBuf;

/// What happened to one config file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum FileResult {
    /// Already at the running version; not written
    Unchanged,
    Migrated { from: Version, to: Version, applied: Vec<Version> },
    /// Finished by an earlier, interrupted attempt of the same run
    Skipped,
    Failed { error: FileError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(flatten)]
    pub result: FileResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub from_version: Option<Version>,
    pub to_version: Version,
    /// Snapshot taken (or reused) for this run; `None` when nothing needed migrating
    pub backup: Option<BackupId>,
    pub backup_path: Option<PathBuf>,
    pub resumed: bool,
    pub marker_advanced: bool,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn new(from_version: Option<Version>, to_version: Version) -> Self {
        Self {
            from_version,
            to_version,
            backup: None,
            backup_path: None,
            resumed: false,
            marker_advanced: false,
            files: Vec::new(),
        }
    }

    pub fn push(&mut self, file: impl Into<String>, result: FileResult) {
        self.files.push(FileReport { file: file.into(), result });
    }

    pub fn migrated(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| matches!(f.result, FileResult::Migrated { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &FileError)> {
        self.files.iter().filter_map(|f| match &f.result {
            FileResult::Failed { error } => Some((f.file.as_str(), error)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// True when no file was written.
    pub fn is_noop(&self) -> bool {
        self.migrated().next().is_none()
    }
}
