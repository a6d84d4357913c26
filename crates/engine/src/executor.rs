// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration executor: lock, back up, migrate, checkpoint, finish.
//!
//! A status record on disk marks a run in flight. If the process dies, the
//! next invocation finds the record, reuses its backup, and picks up after
//! the last checkpointed file.
//!
//! Pending files are migrated in memory before the snapshot. When none of
//! them would be written, the run takes no backup and leaves no record, so
//! repeated failing runs never rotate the real pre-migration snapshot away.

use crate::config::{ConfigError, EngineConfig};
use crate::file::{read_document, FileError, FileMigrator, FileState};
use crate::layout::StateLayout;
use crate::migrations::builtin_registry;
use crate::plan::{build_plan, MigrationPlan};
use crate::report::{FileResult, RunReport};
use crate::schemas::{current_schemas, SchemaSet};
use cm_core::{Clock, MigrationRegistry, RegistryError, SystemClock, Version, ENGINE_VERSION};
use cm_storage::{
    BackupError, BackupId, BackupManager, BootstrapMarker, LockConfig, LockError, MarkerError,
    MigrationLock, RestoreTarget, RunState, StatusError, StatusRecord, StatusStore, LOCK_FILE_NAME,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("backup failed, no files were changed: {0}")]
    Backup(#[from] BackupError),
    #[error("status record: {0}")]
    Status(#[from] StatusError),
    #[error("bootstrap marker: {0}")]
    Marker(#[from] MarkerError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid migration registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("migration run failed; restore with the backup at {}: {source}", backup_path.display())]
    RunFailed { backup_path: PathBuf, source: Box<ExecutorError> },
}

/// Applies registered migrations to every config file in a state directory.
pub struct Executor<C: Clock = SystemClock> {
    layout: StateLayout,
    registry: MigrationRegistry,
    schemas: SchemaSet,
    target: Version,
    lock: LockConfig,
    backups: BackupManager<C>,
    clock: C,
}

impl Executor<SystemClock> {
    /// Executor for the shipped migrations and schemas at the running version.
    pub fn new(config: &EngineConfig) -> Result<Self, ExecutorError> {
        Ok(Self::with_parts(config, builtin_registry()?, current_schemas(), ENGINE_VERSION, SystemClock))
    }
}

impl<C: Clock> Executor<C> {
    pub fn with_parts(
        config: &EngineConfig,
        registry: MigrationRegistry,
        schemas: SchemaSet,
        target: Version,
        clock: C,
    ) -> Self {
        let backups = BackupManager::with_clock(&config.state_dir, clock.clone())
            .retention(config.backup_retention)
            .exclude(LOCK_FILE_NAME);
        Self {
            layout: StateLayout::new(&config.state_dir),
            registry,
            schemas,
            target,
            lock: config.lock.clone(),
            backups,
            clock,
        }
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn backups(&self) -> &BackupManager<C> {
        &self.backups
    }

    pub fn target(&self) -> Version {
        self.target
    }

    fn status(&self) -> StatusStore {
        StatusStore::new(self.layout.status_path())
    }

    fn marker(&self) -> BootstrapMarker {
        BootstrapMarker::new(self.layout.marker_path())
    }

    /// What a run would do, without taking the lock or writing anything.
    pub fn plan(&self) -> Result<MigrationPlan, ExecutorError> {
        let bootstrap = self.marker().read()?;
        Ok(build_plan(&self.layout, &self.registry, &self.schemas, self.target, bootstrap)?)
    }

    /// Bring every config file up to the target version.
    pub fn run(&self) -> Result<RunReport, ExecutorError> {
        if !self.layout.root().is_dir() {
            debug!(state_dir = %self.layout.root().display(), "no state directory; nothing to migrate");
            return Ok(RunReport::new(None, self.target));
        }

        let _lock = MigrationLock::acquire(&self.layout.lock_path(), &self.lock, &self.clock)?;
        let status = self.status();
        let bootstrap = self.marker().read()?;

        let (mut record, resumed) = match status.load()? {
            Some(record) => (self.resume(record), true),
            None => {
                let plan = build_plan(&self.layout, &self.registry, &self.schemas, self.target, bootstrap)?;
                if plan.is_noop() {
                    info!(version = %self.target, "config files already current");
                    return Ok(unchanged_report(plan, BTreeMap::new()));
                }

                let blocked = self.rehearse(&plan, bootstrap);
                if blocked.len() == plan.pending_files().count() {
                    warn!(files = blocked.len(), "no config file can be migrated; skipping backup");
                    return Ok(unchanged_report(plan, blocked));
                }

                let backup = self.backups.snapshot()?;
                let record = StatusRecord::new(
                    plan.from_version.unwrap_or(Version::ZERO),
                    self.target,
                    self.backups.path_of(&backup)?,
                    self.clock.now_utc(),
                );
                status.save(&record)?;
                info!(
                    from = %record.from_version,
                    to = %self.target,
                    files = plan.pending_files().count(),
                    backup = %backup,
                    "starting migration"
                );
                (record, false)
            }
        };

        match self.apply(&mut record, &status, bootstrap, resumed) {
            Ok(report) => Ok(report),
            Err(e) => {
                record.state = RunState::Failed;
                if let Err(save_err) = status.save(&record) {
                    warn!(error = %save_err, "could not mark status record failed");
                }
                Err(ExecutorError::RunFailed { backup_path: record.backup_path, source: Box::new(e) })
            }
        }
    }

    /// Migrate every pending file in memory, returning the ones that would fail.
    fn rehearse(&self, plan: &MigrationPlan, bootstrap: Option<Version>) -> BTreeMap<String, FileError> {
        let migrator = FileMigrator::new(&self.registry, &self.schemas, self.target, bootstrap);
        plan.pending_files()
            .filter_map(|file| {
                read_document(&self.layout.root().join(&file.file))
                    .and_then(|doc| migrator.migrate_document(file.kind, doc))
                    .err()
                    .map(|error| (file.file.clone(), error))
            })
            .collect()
    }

    fn resume(&self, mut record: StatusRecord) -> StatusRecord {
        warn!(
            started_at = %record.started_at,
            completed = record.completed_files.len(),
            backup = %record.backup_path.display(),
            "resuming interrupted migration"
        );
        if record.to_version != self.target {
            warn!(
                recorded = %record.to_version,
                running = %self.target,
                "interrupted run targeted a different version; re-checking every file"
            );
            record.to_version = self.target;
            record.completed_files.clear();
            record.state = RunState::InProgress;
        }
        record
    }

    fn apply(
        &self,
        record: &mut StatusRecord,
        status: &StatusStore,
        bootstrap: Option<Version>,
        resumed: bool,
    ) -> Result<RunReport, ExecutorError> {
        let mut report = RunReport::new(Some(record.from_version), self.target);
        report.resumed = resumed;
        report.backup = record.backup_path.file_name().map(|n| BackupId::new(n.to_string_lossy()));
        report.backup_path = Some(record.backup_path.clone());

        let files = self.layout.discover()?;
        if record.state != RunState::Completed {
            let migrator = FileMigrator::new(&self.registry, &self.schemas, self.target, bootstrap);
            for file in &files {
                if record.is_completed(&file.rel) {
                    debug!(file = %file.rel, "already migrated by the interrupted run");
                    report.push(&file.rel, FileResult::Skipped);
                    continue;
                }
                match migrator.migrate_file(file) {
                    Ok(result) => {
                        record.mark_completed(&file.rel);
                        status.save(record)?;
                        report.push(&file.rel, result);
                    }
                    Err(error) => {
                        warn!(file = %file.rel, %error, "config file left unchanged");
                        report.push(&file.rel, FileResult::Failed { error });
                    }
                }
            }
            record.state = RunState::Completed;
            status.save(record)?;
        }

        let all_done = files.iter().all(|f| record.is_completed(&f.rel));
        if all_done {
            self.marker().write(&self.target)?;
            report.marker_advanced = true;
        } else {
            warn!(version = %self.target, "some files failed; bootstrap marker not advanced");
        }
        status.clear()?;

        info!(
            to = %self.target,
            migrated = report.migrated().count(),
            failed = report.failures().count(),
            "migration finished"
        );
        Ok(report)
    }

    /// Restore a snapshot over the state directory, under the migration lock.
    pub fn restore_backup(&self, target: &RestoreTarget) -> Result<BackupId, ExecutorError> {
        let _lock = MigrationLock::acquire(&self.layout.lock_path(), &self.lock, &self.clock)?;
        let id = self.backups.restore(target)?;
        self.status().clear()?;
        Ok(id)
    }
}

/// Report for a run that wrote nothing. `blocked` holds pending files that failed in memory.
fn unchanged_report(plan: MigrationPlan, mut blocked: BTreeMap<String, FileError>) -> RunReport {
    let mut report = RunReport::new(None, plan.to_version);
    for file in plan.files {
        let result = match (blocked.remove(&file.file), file.state) {
            (Some(error), _) | (None, FileState::Invalid { error }) => FileResult::Failed { error },
            _ => FileResult::Unchanged,
        };
        report.push(file.file, result);
    }
    report
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
