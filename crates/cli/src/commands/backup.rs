// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cm backups` and `cm restore-backup`

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use cm_engine::{EngineConfig, Executor};
use cm_storage::{BackupId, RestoreTarget};
use serde::Serialize;

use crate::color;
use crate::output::{format_or_json, OutputFormat};

#[derive(Debug, Serialize)]
struct BackupEntry {
    id: BackupId,
    path: PathBuf,
}

/// List snapshots of the state directory, oldest first.
pub fn list(config: &EngineConfig, format: OutputFormat) -> Result<()> {
    let executor = Executor::new(config)?;
    let backups = executor.backups();
    let entries = backups
        .list()?
        .into_iter()
        .map(|id| Ok(BackupEntry { path: backups.path_of(&id)?, id }))
        .collect::<Result<Vec<_>>>()?;

    format_or_json(format, &entries, |out| {
        if entries.is_empty() {
            return writeln!(out, "No backups of {}", config.state_dir.display());
        }
        for entry in &entries {
            writeln!(out, "{}  {}", entry.id, color::context(&entry.path.display().to_string()))?;
        }
        Ok(())
    })
}

pub fn restore(config: &EngineConfig, target: &RestoreTarget, format: OutputFormat) -> Result<()> {
    let executor = Executor::new(config)?;
    let id = executor.restore_backup(target)?;
    let entry = BackupEntry { path: executor.backups().path_of(&id)?, id };

    format_or_json(format, &entry, |out| {
        writeln!(out, "Restored {} from {}", config.state_dir.display(), entry.id)
    })
}
