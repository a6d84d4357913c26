// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cm-core: versions, config kinds, and the migration registry shared by
//! every crate of the config migration engine.

pub mod macros;

pub mod clock;
pub mod compat;
pub mod kind;
pub mod migration;
pub mod version;

pub use clock::{Clock, FakeClock, SystemClock};
pub use compat::{check_compatibility, Compatibility, CompatibilityError};
pub use kind::{ConfigKind, UnknownKind};
pub use migration::{
    ManifestEntry, Migration, MigrationRegistry, RegistryError, Transform, TransformError,
};
pub use version::{Version, VersionError, ENGINE_VERSION, ENGINE_VERSION_STR};
