// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process migration lock.
//!
//! The marker file holds a JSON token with the holder's pid and acquisition
//! time. Exclusion comes from an OS advisory lock on the open file; the token
//! only serves staleness checks and diagnostics. Releasing clears the token
//! but never deletes the file, so a process waiting on the old inode can't
//! end up holding a lock nobody else sees.
//!
//! The OS drops the advisory lock when its holder exits, so a busy lock with
//! an old token usually means a long run that is still going. Such a lock is
//! only reclaimed once the token's pid is gone, which covers a dead holder
//! whose descriptor lives on in a child process or a remote NFS client.

use cm_core::Clock;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Marker file name inside the state directory
pub const LOCK_FILE_NAME: &str = ".migrate.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("migration lock {} is held by {}; gave up after {attempts} attempts", path.display(), holder.map_or_else(|| "another process".to_string(), |pid| format!("pid {pid}")))]
    Contended { path: PathBuf, holder: Option<u32>, attempts: u32 },
    #[error("refusing to lock through symlink {}", .0.display())]
    Symlink(PathBuf),
}

/// Retry and staleness policy for acquiring the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Age after which a held token is considered abandoned
    pub stale_after: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            stale_after: Duration::from_secs(10 * 60),
        }
    }
}

/// Contents of the marker file while held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockToken {
    pub pid: u32,
    pub acquired_at_ms: u64,
}

impl LockToken {
    fn age(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.acquired_at_ms))
    }
}

enum Attempt {
    Acquired(MigrationLock),
    Busy(Option<LockToken>),
}

/// A held migration lock. Released on drop.
#[derive(Debug)]
pub struct MigrationLock {
    file: File,
    path: PathBuf,
    reclaimed: Option<LockToken>,
}

impl MigrationLock {
    /// Acquire the lock at `path`, retrying with exponential backoff.
    pub fn acquire<C: Clock>(path: &Path, config: &LockConfig, clock: &C) -> Result<Self, LockError> {
        let attempts = config.max_attempts.max(1);
        let mut delay = config.base_delay;
        let mut holder = None;

        for attempt in 1..=attempts {
            match try_acquire(path, clock)? {
                Attempt::Acquired(lock) => {
                    info!(path = %path.display(), attempt, "acquired migration lock");
                    return Ok(lock);
                }
                Attempt::Busy(token) => {
                    holder = token.as_ref().map(|t| t.pid);
                    match token.filter(|t| t.age(clock.epoch_ms()) >= config.stale_after) {
                        Some(token) if holder_alive(token.pid) => {
                            debug!(pid = token.pid, "stale migration lock holder is still running");
                        }
                        Some(token) => {
                            warn!(
                                pid = token.pid,
                                acquired_at_ms = token.acquired_at_ms,
                                path = %path.display(),
                                "reclaiming stale migration lock"
                            );
                            match fs::remove_file(path) {
                                Ok(()) => continue,
                                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                                Err(e) => return Err(e.into()),
                            }
                        }
                        None => {}
                    }
                    debug!(attempt, delay_ms = delay.as_millis() as u64, "migration lock busy");
                    if attempt < attempts {
                        std::thread::sleep(delay);
                        delay = (delay * 2).min(config.max_delay);
                    }
                }
            }
        }

        Err(LockError::Contended { path: path.to_path_buf(), holder, attempts })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Token left behind by a holder that exited without releasing.
    pub fn reclaimed(&self) -> Option<&LockToken> {
        self.reclaimed.as_ref()
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = self.file.sync_all();
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "released migration lock");
    }
}

fn read_token(path: &Path) -> Option<LockToken> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Whether `pid` names a running process. Unknown counts as running.
#[cfg(unix)]
fn holder_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return true;
    };
    // Signal 0 only checks existence; EPERM still means the process exists
    !matches!(kill(Pid::from_raw(raw), None), Err(Errno::ESRCH))
}

#[cfg(not(unix))]
fn holder_alive(_pid: u32) -> bool {
    true
}

fn try_acquire<C: Clock>(path: &Path, clock: &C) -> Result<Attempt, LockError> {
    if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
        return Err(LockError::Symlink(path.to_path_buf()));
    }

    // Don't truncate before the lock is held
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    if let Err(e) = file.try_lock_exclusive() {
        if e.kind() == io::ErrorKind::WouldBlock
            || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
        {
            return Ok(Attempt::Busy(read_token(path)));
        }
        return Err(e.into());
    }

    // The marker may have been reclaimed between open and lock
    if !still_at_path(&file, path)? {
        debug!(path = %path.display(), "lock marker replaced while locking; retrying");
        return Ok(Attempt::Busy(None));
    }

    let mut previous = String::new();
    file.read_to_string(&mut previous)?;
    let reclaimed = serde_json::from_str::<LockToken>(&previous).ok();
    if let Some(token) = &reclaimed {
        warn!(pid = token.pid, "previous migration exited without releasing its lock");
    }

    let token = LockToken { pid: std::process::id(), acquired_at_ms: clock.epoch_ms() };
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&serde_json::to_vec(&token).map_err(io::Error::from)?)?;
    file.sync_all()?;

    Ok(Attempt::Acquired(MigrationLock { file, path: path.to_path_buf(), reclaimed }))
}

#[cfg(unix)]
fn still_at_path(file: &File, path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    match fs::metadata(path) {
        Ok(current) => Ok(held.ino() == current.ino() && held.dev() == current.dev()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn still_at_path(_file: &File, path: &Path) -> io::Result<bool> {
    Ok(path.exists())
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
