// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where the verifier reads the base branch's artifact from.

use crate::artifact::{ArtifactError, ShapeArtifact, ARTIFACT_PATH};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("unknown base ref '{base_ref}': {stderr}")]
    UnknownRef { base_ref: String, stderr: String },
    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Source of the immutable baseline artifact.
pub trait Baseline {
    /// The artifact at the base, or `None` when the base predates it.
    fn artifact(&self) -> Result<Option<ShapeArtifact>, BaselineError>;

    /// Human-readable origin, used in reports.
    fn describe(&self) -> String;
}

/// Reads the artifact out of git history at a base ref, never from the
/// working tree.
#[derive(Debug, Clone)]
pub struct GitBaseline {
    repo: PathBuf,
    base_ref: String,
    path: String,
}

impl GitBaseline {
    pub fn new(repo: impl Into<PathBuf>, base_ref: impl Into<String>) -> Self {
        Self { repo: repo.into(), base_ref: base_ref.into(), path: ARTIFACT_PATH.to_string() }
    }

    /// Artifact path relative to the repository root, `/`-separated.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn git(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .output()
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl Baseline for GitBaseline {
    fn artifact(&self) -> Result<Option<ShapeArtifact>, BaselineError> {
        let commit = format!("{}^{{commit}}", self.base_ref);
        let output = self.git(&["rev-parse", "--verify", "--quiet", &commit])?;
        if !output.status.success() {
            return Err(BaselineError::UnknownRef {
                base_ref: self.base_ref.clone(),
                stderr: stderr_of(&output),
            });
        }

        let object = format!("{}:{}", self.base_ref, self.path);
        if !self.git(&["cat-file", "-e", &object])?.status.success() {
            debug!(base = %self.base_ref, path = %self.path, "no artifact at base");
            return Ok(None);
        }

        let output = self.git(&["show", &object])?;
        if !output.status.success() {
            return Err(BaselineError::Git { command: format!("show {object}"), stderr: stderr_of(&output) });
        }
        let content = String::from_utf8_lossy(&output.stdout);
        Ok(Some(ShapeArtifact::from_json(&content, &object)?))
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.base_ref, self.path)
    }
}

/// A baseline held in memory, for callers that already have the artifact.
#[derive(Debug, Clone, Default)]
pub struct FixedBaseline(pub Option<ShapeArtifact>);

impl Baseline for FixedBaseline {
    fn artifact(&self) -> Result<Option<ShapeArtifact>, BaselineError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "fixed baseline".to_string()
    }
}

#[cfg(test)]
#[path = "baseline_tests.rs"]
mod tests;
