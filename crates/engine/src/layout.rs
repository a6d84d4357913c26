// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Paths inside the managed state directory.

use cm_core::ConfigKind;
use cm_storage::{LOCK_FILE_NAME, MARKER_FILE_NAME, STATUS_FILE_NAME};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const PREFERENCES_FILE: &str = "preferences.json";
pub const AGENTS_DIR: &str = "agents";

/// One managed config file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConfigFile {
    /// Path relative to the state directory, `/`-separated
    pub rel: String,
    pub kind: ConfigKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.root.join(PREFERENCES_FILE)
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join(AGENTS_DIR)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    pub fn status_path(&self) -> PathBuf {
        self.root.join(STATUS_FILE_NAME)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.root.join(MARKER_FILE_NAME)
    }

    /// Every managed config file, sorted by relative path.
    ///
    /// Only regular `.json` files count. Hidden files (including in-flight
    /// temp files) and symlinks are ignored.
    pub fn discover(&self) -> io::Result<Vec<ConfigFile>> {
        let mut files = Vec::new();

        let prefs = self.preferences_path();
        if is_regular(&prefs)? {
            files.push(ConfigFile {
                rel: PREFERENCES_FILE.to_string(),
                kind: ConfigKind::Preferences,
                path: prefs,
            });
        }

        let agents = self.agents_dir();
        if fs::symlink_metadata(&agents).is_ok_and(|m| m.is_dir()) {
            for entry in fs::read_dir(&agents)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') || !name.ends_with(".json") || !entry.file_type()?.is_file() {
                    continue;
                }
                files.push(ConfigFile {
                    rel: format!("{AGENTS_DIR}/{name}"),
                    kind: ConfigKind::Agent,
                    path: entry.path(),
                });
            }
        }

        files.sort();
        Ok(files)
    }
}

fn is_regular(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.file_type().is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
