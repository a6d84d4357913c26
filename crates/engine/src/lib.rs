// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cm-engine: brings the config files in a state directory up to the running
//! engine version, and checks dependent modules against it.

pub mod compat;
pub mod config;
pub mod env;
pub mod executor;
pub mod file;
pub mod layout;
pub mod migrations;
pub mod plan;
pub mod report;
pub mod schemas;

pub use compat::{check_compatibility, check_module, ModuleError, ModuleManifest, MODULE_MANIFEST_FILE};
pub use config::{ConfigError, EngineConfig, CONFIG_FILE_NAME};
pub use executor::{Executor, ExecutorError};
pub use file::{FileError, FileMigrator, FileState};
pub use layout::{ConfigFile, StateLayout};
pub use migrations::{builtin_migrations, builtin_registry};
pub use plan::{build_plan, MigrationPlan, PlannedFile};
pub use report::{FileReport, FileResult, RunReport};
pub use schemas::{current_schemas, schema_for, SchemaSet};

/// Migrate the state directory resolved from the environment.
pub fn run_migrations() -> Result<RunReport, ExecutorError> {
    let config = EngineConfig::load()?;
    Executor::new(&config)?.run()
}
