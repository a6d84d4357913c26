// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cm-verify: build-time guard that refuses breaking schema changes shipped
//! without a migration.
//!
//! The committed shape artifact records every config kind's shape and hash
//! plus the manifest of shipped migrations. CI compares the artifact at the
//! base branch (which the change under review cannot alter) against shapes
//! regenerated from the change.

mod artifact;
mod baseline;
mod verifier;

pub use artifact::{ArtifactError, KindShape, ShapeArtifact, ARTIFACT_FORMAT, ARTIFACT_PATH};
pub use baseline::{Baseline, BaselineError, FixedBaseline, GitBaseline};
pub use verifier::{Finding, KindOutcome, KindReport, VerifyError, VerifyReport, Verifier};
