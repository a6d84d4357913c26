// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compatibility between a dependent module's build target and the running
//! engine. Advisory only: nothing here touches the filesystem.

use crate::version::Version;
use serde::Serialize;
use thiserror::Error;

/// Outcome of comparing a declared build-target version with the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Compatibility {
    /// Same major and minor
    Compatible,
    /// Same major, different minor: usable, but worth a warning
    Warning { declared: Version, running: Version },
    /// Different major: must not load
    Incompatible { declared: Version, running: Version, remediation: String },
}

/// Fatal compatibility mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("module built for engine {declared} cannot run on engine {running}: {remediation}")]
pub struct CompatibilityError {
    pub declared: Version,
    pub running: Version,
    pub remediation: String,
}

/// Compare a module's declared build version with the running engine version.
pub fn check_compatibility(declared: &Version, running: &Version) -> Compatibility {
    if declared.same_minor(running) {
        return Compatibility::Compatible;
    }
    if declared.same_major(running) {
        return Compatibility::Warning { declared: *declared, running: *running };
    }

    let remediation = if declared.major < running.major {
        format!(
            "rebuild the module against engine {}.x or update it to a release that targets it",
            running.major
        )
    } else {
        format!(
            "update the engine to {}.x or install a module release built for {}.x",
            declared.major, running.major
        )
    };
    Compatibility::Incompatible { declared: *declared, running: *running, remediation }
}

impl Compatibility {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Compatibility::Incompatible { .. })
    }

    /// Turn a fatal mismatch into an error; warnings and full compatibility pass.
    pub fn into_result(self) -> Result<Compatibility, CompatibilityError> {
        match self {
            Compatibility::Incompatible { declared, running, remediation } => {
                Err(CompatibilityError { declared, running, remediation })
            }
            other => Ok(other),
        }
    }
}
