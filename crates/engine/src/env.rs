// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigError;

/// Resolve state directory: CM_STATE_DIR > XDG_STATE_HOME/cm > ~/.local/state/cm
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CM_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cm"));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoStateDir)?;
    Ok(home.join(".local/state/cm"))
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Number of backups to keep (`CM_BACKUP_RETENTION`)
pub fn backup_retention() -> Option<usize> {
    parsed("CM_BACKUP_RETENTION")
}

/// Age after which a held lock is reclaimed (`CM_LOCK_STALE_MS`)
pub fn lock_stale_after() -> Option<Duration> {
    parsed("CM_LOCK_STALE_MS").map(Duration::from_millis)
}

/// Lock acquisition attempts before giving up (`CM_LOCK_ATTEMPTS`)
pub fn lock_attempts() -> Option<u32> {
    parsed("CM_LOCK_ATTEMPTS")
}

/// First retry delay; doubles per attempt (`CM_LOCK_BASE_DELAY_MS`)
pub fn lock_base_delay() -> Option<Duration> {
    parsed("CM_LOCK_BASE_DELAY_MS").map(Duration::from_millis)
}
