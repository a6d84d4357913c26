// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cm verify` - CI gate against the base branch's shape artifact

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use cm_engine::{builtin_registry, current_schemas};
use cm_verify::{GitBaseline, Verifier, ARTIFACT_PATH};

use crate::exit_error::ExitError;
use crate::output::{format_or_json, write_verify_report, OutputFormat};

#[derive(Args)]
pub struct VerifyArgs {
    /// Base ref to read the baseline artifact from (e.g. origin/main)
    #[arg(long)]
    pub base: String,

    /// Repository root
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Artifact path relative to the repository root
    #[arg(long, default_value = ARTIFACT_PATH)]
    pub artifact: String,
}

pub fn handle(args: VerifyArgs, format: OutputFormat) -> Result<()> {
    let schemas = current_schemas();
    let registry = builtin_registry()?;
    let baseline = GitBaseline::new(&args.repo, &args.base).with_path(args.artifact.clone());
    let verifier = Verifier::new(&schemas, &registry, baseline, args.repo.join(&args.artifact));

    let report = verifier.verify()?;
    format_or_json(format, &report, |out| write_verify_report(&report, out))?;

    if !report.is_pass() {
        return Err(ExitError::rejected(format!(
            "schema verification failed with {} finding(s)",
            report.findings.len()
        ))
        .into());
    }
    Ok(())
}
