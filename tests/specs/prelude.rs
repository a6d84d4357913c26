//! Shared helpers for specs: a temp project with a state directory, and a
//! small DSL over `assert_cmd` for driving the `cm` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub use cm_core::{Clock, FakeClock, Version, ENGINE_VERSION};
pub use cm_engine::{EngineConfig, Executor, FileResult, RunReport};
pub use serde_json::{json, Value};
use tempfile::TempDir;

/// A temp directory holding a managed state directory at `state/`.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let project = Self { dir: tempfile::tempdir().unwrap() };
        std::fs::create_dir_all(project.state()).unwrap();
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn state(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    /// Write a file relative to the project root.
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Write a JSON document relative to the state directory.
    pub fn config(&self, rel: &str, doc: Value) {
        self.file(&format!("state/{rel}"), &serde_json::to_string_pretty(&doc).unwrap());
    }

    pub fn read_config(&self, rel: &str) -> Value {
        serde_json::from_str(&self.read_raw(rel)).unwrap()
    }

    pub fn read_raw(&self, rel: &str) -> String {
        std::fs::read_to_string(self.state().join(rel)).unwrap()
    }

    /// Backup directories beside the state directory, sorted.
    pub fn backups(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("state.backup-"))
            .collect();
        names.sort();
        names
    }

    /// Engine settings for this project, with a short lock backoff.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::for_state_dir(self.state());
        config.lock.base_delay = Duration::from_millis(5);
        config
    }

    pub fn executor(&self) -> Executor {
        Executor::new(&self.engine_config()).unwrap()
    }

    pub fn git_init(&self) {
        self.git(&["init", "-q"]);
    }

    pub fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .args(["-c", "user.name=cm", "-c", "user.email=cm@example.com", "-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(self.root())
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .output()
            .unwrap();
        assert!(output.status.success(), "git {args:?}: {}", String::from_utf8_lossy(&output.stderr));
    }

    /// `cm` running in the project root against its state directory.
    pub fn cm(&self) -> CliBuilder {
        let mut builder = cli();
        builder.cmd.current_dir(self.root()).env("CM_STATE_DIR", self.state());
        builder
    }
}

pub fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok_and(|o| o.status.success())
}

/// `cm` with color and inherited state settings stripped.
pub fn cli() -> CliBuilder {
    let mut cmd = assert_cmd::Command::cargo_bin("cm").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("COLOR")
        .env_remove("CM_STATE_DIR")
        .env_remove("CM_LOG")
        .env_remove("CM_BACKUP_RETENTION");
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    fn output(mut self) -> RunOutput {
        let output = self.cmd.output().unwrap();
        RunOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Run and require exit code 0.
    pub fn passes(self) -> RunOutput {
        let out = self.output();
        assert_eq!(out.code, Some(0), "stdout:\n{}\nstderr:\n{}", out.stdout, out.stderr);
        out
    }

    /// Run and require a specific non-zero exit code.
    pub fn fails_with(self, code: i32) -> RunOutput {
        let out = self.output();
        assert_eq!(out.code, Some(code), "stdout:\n{}\nstderr:\n{}", out.stdout, out.stderr);
        out
    }
}

pub struct RunOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout.contains(needle), "stdout unexpectedly has {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap()
    }
}

/// The running engine version as the string stamped into files.
pub fn engine_version() -> String {
    ENGINE_VERSION.to_string()
}
