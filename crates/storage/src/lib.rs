// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for the config migration engine: atomic writes, backups,
//! the migration lock, and the on-disk run bookkeeping.

mod atomic;
mod backup;
mod lock;
mod marker;
mod status;

pub use atomic::{write_atomic, write_json_atomic};
pub use backup::{BackupError, BackupId, BackupManager, RestoreTarget, DEFAULT_RETENTION};
pub use lock::{LockConfig, LockError, LockToken, MigrationLock, LOCK_FILE_NAME};
pub use marker::{BootstrapMarker, MarkerError, MARKER_FILE_NAME};
pub use status::{RunState, StatusError, StatusRecord, StatusStore, STATUS_FILE_NAME};
