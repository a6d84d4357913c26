// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cm upgrade` - bring config files up to the running engine version

use anyhow::Result;
use cm_engine::{EngineConfig, Executor};

use crate::exit_error::{ExitError, EXIT_FAILURE};
use crate::output::{format_or_json, write_plan, write_run_report, OutputFormat};

pub fn handle(config: &EngineConfig, dry_run: bool, format: OutputFormat) -> Result<()> {
    let executor = Executor::new(config)?;

    if dry_run {
        let plan = executor.plan()?;
        return format_or_json(format, &plan, |out| write_plan(&plan, out));
    }

    let report = executor.run()?;
    format_or_json(format, &report, |out| write_run_report(&report, out))?;

    let failed = report.failures().count();
    if failed > 0 {
        return Err(ExitError::new(
            EXIT_FAILURE,
            format!("{failed} config file(s) could not be migrated"),
        )
        .into());
    }
    Ok(())
}
