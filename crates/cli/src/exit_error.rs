// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` owns process termination.

use std::fmt;

/// Generic failure
pub const EXIT_FAILURE: i32 = 1;
/// The check ran and rejected its input (verifier failure, incompatible module)
pub const EXIT_REJECTED: i32 = 2;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(EXIT_REJECTED, message)
    }

    /// Exit code for any error surfaced from a command.
    pub fn code_of(err: &anyhow::Error) -> i32 {
        err.downcast_ref::<ExitError>().map_or(EXIT_FAILURE, |e| e.code)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_of_reads_exit_error() {
        let err = anyhow::Error::new(ExitError::rejected("verification failed"));
        assert_eq!(ExitError::code_of(&err), EXIT_REJECTED);
        assert_eq!(err.to_string(), "verification failed");
    }

    #[yare::parameterized(
        failure = { EXIT_FAILURE },
        rejected = { EXIT_REJECTED },
    )]
    fn code_of_survives_context(code: i32) {
        let err = anyhow::Error::new(ExitError::new(code, "boom")).context("running cm");
        assert_eq!(ExitError::code_of(&err), code);
    }

    #[test]
    fn code_of_defaults_to_failure() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(ExitError::code_of(&err), EXIT_FAILURE);
    }
}
