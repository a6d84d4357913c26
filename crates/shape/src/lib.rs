// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Schema shapes: definitions, structural validation, canonical shape
//! extraction, and breaking-change detection.
//!
//! Nothing in this crate touches the filesystem or the running engine; it
//! operates on structural descriptions only.

pub mod diff;
pub mod schema;
pub mod shape;

pub use diff::{detect_breaking_changes, format_changes, BreakingChange};
pub use schema::{validate, FieldDef, FieldType, ObjectDef, ValidationReport, Violation};
pub use shape::{generate_shape, shape_hash, FieldShape, Shape};
