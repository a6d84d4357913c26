// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Resolution order for each setting: environment variable, then
//! `<state>/migrate.toml`, then the built-in default.

use crate::env;
use cm_storage::{LockConfig, DEFAULT_RETENTION};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Optional config file inside the state directory
pub const CONFIG_FILE_NAME: &str = "migrate.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory (set CM_STATE_DIR)")]
    NoStateDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid {}: {source}", path.display())]
    Toml { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    backup_retention: Option<usize>,
    #[serde(default)]
    lock: FileLockConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileLockConfig {
    stale_ms: Option<u64>,
    attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

/// Resolved settings for one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub state_dir: PathBuf,
    pub backup_retention: usize,
    pub lock: LockConfig,
}

impl EngineConfig {
    /// Defaults only; no file or environment lookups.
    pub fn for_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            backup_retention: DEFAULT_RETENTION,
            lock: LockConfig::default(),
        }
    }

    /// Resolve the state directory from the environment, then load.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(env::state_dir()?)
    }

    /// Load settings for a known state directory.
    pub fn load_from(state_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::for_state_dir(state_dir);
        let file = read_file_config(&config.state_dir.join(CONFIG_FILE_NAME))?;

        if let Some(n) = env::backup_retention().or(file.backup_retention) {
            config.backup_retention = n;
        }
        if let Some(d) = env::lock_stale_after().or(file.lock.stale_ms.map(Duration::from_millis)) {
            config.lock.stale_after = d;
        }
        if let Some(n) = env::lock_attempts().or(file.lock.attempts) {
            config.lock.max_attempts = n;
        }
        if let Some(d) = env::lock_base_delay().or(file.lock.base_delay_ms.map(Duration::from_millis))
        {
            config.lock.base_delay = d;
        }
        if let Some(ms) = file.lock.max_delay_ms {
            config.lock.max_delay = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&content).map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
