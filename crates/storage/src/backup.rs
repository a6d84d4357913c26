// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full-directory backups of the managed state directory.
//!
//! Each snapshot is a sibling of the live directory named
//! `<live-name>.backup-<YYYYMMDDTHHMMSSmmmZ>`, with a `-N` counter appended
//! when two snapshots land in the same millisecond. Retention keeps the
//! newest snapshots and prunes the oldest.

use cm_core::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Snapshots kept after pruning unless configured otherwise
pub const DEFAULT_RETENTION: usize = 3;

const BACKUP_INFIX: &str = ".backup-";
const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";
const STAMP_LEN: usize = 19;
const RESTORING_SUFFIX: &str = ".restoring";
const DISPLACED_SUFFIX: &str = ".replaced";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("refusing to follow symlink at {}", .0.display())]
    Symlink(PathBuf),
    #[error("'{name}' is not a backup of {live}")]
    InvalidName { name: String, live: String },
    #[error("backup {} resolves outside {}", path.display(), parent.display())]
    OutsideParent { path: PathBuf, parent: PathBuf },
    #[error("backup not found: {0}")]
    NotFound(BackupId),
    #[error("no backups exist for {}", .0.display())]
    NoBackups(PathBuf),
    #[error("state directory has no parent: {}", .0.display())]
    NoParent(PathBuf),
}

/// Directory name of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupId(String);

impl BackupId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which snapshot to restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreTarget {
    Latest,
    Id(BackupId),
}

impl FromStr for RestoreTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "latest" => RestoreTarget::Latest,
            other => RestoreTarget::Id(BackupId::new(other)),
        })
    }
}

/// Sort key of a well-formed backup name: timestamp, then collision counter.
fn parse_name(live_name: &str, name: &str) -> Option<(String, u32)> {
    let rest = name.strip_prefix(live_name)?.strip_prefix(BACKUP_INFIX)?;
    let stamp = rest.get(..STAMP_LEN)?;
    let (stamp, counter) = match &rest[STAMP_LEN..] {
        "" => (stamp, 1),
        suffix => {
            let n = suffix.strip_prefix('-')?;
            if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (stamp, n.parse().ok()?)
        }
    };

    let bytes = stamp.as_bytes();
    let well_formed = bytes.iter().enumerate().all(|(i, b)| match i {
        8 => *b == b'T',
        18 => *b == b'Z',
        _ => b.is_ascii_digit(),
    });
    well_formed.then(|| (stamp.to_string(), counter))
}

fn is_symlink(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.file_type().is_symlink()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Creates, lists, prunes, and restores snapshots of one live directory.
pub struct BackupManager<C: Clock = SystemClock> {
    live: PathBuf,
    retention: usize,
    excluded: Vec<OsString>,
    clock: C,
}

impl BackupManager<SystemClock> {
    pub fn new(live: impl Into<PathBuf>) -> Self {
        Self::with_clock(live, SystemClock)
    }
}

impl<C: Clock> BackupManager<C> {
    pub fn with_clock(live: impl Into<PathBuf>, clock: C) -> Self {
        Self { live: live.into(), retention: DEFAULT_RETENTION, excluded: Vec::new(), clock }
    }

    /// Number of snapshots kept by [`prune`](Self::prune). At least one is
    /// always kept.
    pub fn retention(mut self, count: usize) -> Self {
        self.retention = count.max(1);
        self
    }

    /// Skip a top-level entry of the live directory when snapshotting and
    /// leave it in place when restoring.
    pub fn exclude(mut self, name: impl Into<OsString>) -> Self {
        self.excluded.push(name.into());
        self
    }

    pub fn live_dir(&self) -> &Path {
        &self.live
    }

    fn live_name(&self) -> Result<String, BackupError> {
        self.live
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BackupError::NoParent(self.live.clone()))
    }

    fn parent(&self) -> Result<&Path, BackupError> {
        self.live
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| BackupError::NoParent(self.live.clone()))
    }

    fn check_live(&self) -> Result<(), BackupError> {
        if is_symlink(&self.live)? {
            return Err(BackupError::Symlink(self.live.clone()));
        }
        Ok(())
    }

    /// Copy the live directory into a new snapshot, then prune.
    pub fn snapshot(&self) -> Result<BackupId, BackupError> {
        self.check_live()?;
        let parent = self.parent()?;
        let base = format!(
            "{}{BACKUP_INFIX}{}",
            self.live_name()?,
            self.clock.now_utc().format(STAMP_FORMAT)
        );

        let mut name = base.clone();
        let mut counter = 1;
        while fs::symlink_metadata(parent.join(&name)).is_ok() {
            counter += 1;
            name = format!("{base}-{counter}");
        }

        let dest = parent.join(&name);
        fs::create_dir(&dest)?;
        if let Err(e) = copy_contents(&self.live, &dest, &self.excluded) {
            let _ = fs::remove_dir_all(&dest);
            return Err(e.into());
        }

        let id = BackupId(name);
        info!(backup = %id, live = %self.live.display(), "snapshot taken");
        self.prune()?;
        Ok(id)
    }

    /// All snapshots of the live directory, oldest first.
    pub fn list(&self) -> Result<Vec<BackupId>, BackupError> {
        let live_name = self.live_name()?;
        let mut found = Vec::new();
        for entry in fs::read_dir(self.parent()?)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = parse_name(&live_name, &name) else {
                continue;
            };
            // file_type does not follow symlinks
            if entry.file_type()?.is_dir() {
                found.push((key, BackupId(name)));
            }
        }
        found.sort();
        Ok(found.into_iter().map(|(_, id)| id).collect())
    }

    /// Delete the oldest snapshots beyond the retention count.
    pub fn prune(&self) -> Result<Vec<BackupId>, BackupError> {
        let ids = self.list()?;
        let excess = ids.len().saturating_sub(self.retention);
        let mut removed = Vec::with_capacity(excess);
        for id in ids.into_iter().take(excess) {
            let path = self.path_of(&id)?;
            fs::remove_dir_all(&path)?;
            warn!(backup = %id, "pruned old backup");
            removed.push(id);
        }
        Ok(removed)
    }

    /// Resolve a snapshot id to its directory, refusing anything that is not
    /// a real snapshot directory of this live directory.
    pub fn path_of(&self, id: &BackupId) -> Result<PathBuf, BackupError> {
        let name = id.as_str();
        let invalid = || BackupError::InvalidName {
            name: name.to_string(),
            live: self.live.display().to_string(),
        };
        if name.contains(['/', '\\']) || name.contains("..") {
            return Err(invalid());
        }
        if parse_name(&self.live_name()?, name).is_none() {
            return Err(invalid());
        }

        let parent = self.parent()?;
        let path = parent.join(name);
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.file_type().is_symlink() => return Err(BackupError::Symlink(path)),
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(invalid()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BackupError::NotFound(id.clone()))
            }
            Err(e) => return Err(e.into()),
        }

        let canonical_parent = parent.canonicalize()?;
        if path.canonicalize()?.parent() != Some(canonical_parent.as_path()) {
            return Err(BackupError::OutsideParent { path, parent: canonical_parent });
        }
        Ok(path)
    }

    /// Replace the live directory's contents with a snapshot's.
    ///
    /// The snapshot is copied into a staging sibling first, so a failed copy
    /// leaves the live directory as it was. Excluded entries (the lock marker)
    /// are left untouched.
    pub fn restore(&self, target: &RestoreTarget) -> Result<BackupId, BackupError> {
        self.check_live()?;
        let id = match target {
            RestoreTarget::Latest => {
                self.list()?.pop().ok_or_else(|| BackupError::NoBackups(self.live.clone()))?
            }
            RestoreTarget::Id(id) => id.clone(),
        };
        let source = self.path_of(&id)?;

        let staging = self.scratch_dir(RESTORING_SUFFIX)?;
        if let Err(e) = copy_contents(&source, &staging, &self.excluded) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e.into());
        }

        fs::create_dir_all(&self.live)?;
        let displaced = self.scratch_dir(DISPLACED_SUFFIX)?;
        if let Err(e) = self.move_entries(&self.live, &displaced) {
            // Put back whatever already moved
            let _ = self.move_entries(&displaced, &self.live);
            let _ = fs::remove_dir_all(&displaced);
            let _ = fs::remove_dir_all(&staging);
            return Err(e.into());
        }
        self.move_entries(&staging, &self.live)?;
        fs::remove_dir(&staging)?;
        if let Err(e) = fs::remove_dir_all(&displaced) {
            warn!(path = %displaced.display(), error = %e, "could not remove replaced contents");
        }

        info!(backup = %id, live = %self.live.display(), "restored backup");
        Ok(id)
    }

    /// Fresh empty sibling `<live-name><suffix>`, replacing any leftover from
    /// an earlier interrupted restore.
    fn scratch_dir(&self, suffix: &str) -> Result<PathBuf, BackupError> {
        let path = self.parent()?.join(format!("{}{suffix}", self.live_name()?));
        if is_symlink(&path)? {
            return Err(BackupError::Symlink(path));
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir(&path)?;
        Ok(path)
    }

    /// Rename every non-excluded top-level entry of `from` into `to`.
    fn move_entries(&self, from: &Path, to: &Path) -> io::Result<()> {
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            let name = entry.file_name();
            if self.excluded.contains(&name) {
                continue;
            }
            fs::rename(entry.path(), to.join(&name))?;
        }
        Ok(())
    }
}

/// Copy the contents of `src` into the existing directory `dest`.
///
/// Nested symlinks are skipped. `excluded` names apply to the top level only.
fn copy_contents(src: &Path, dest: &Path, excluded: &[OsString]) -> io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if excluded.contains(&name) {
            continue;
        }
        let file_type = entry.file_type()?;
        let target = dest.join(&name);
        if file_type.is_symlink() {
            debug!(path = %entry.path().display(), "skipping symlink");
        } else if file_type.is_dir() {
            fs::create_dir(&target)?;
            copy_contents(&entry.path(), &target, &[])?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
