// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cm compat` - check a dependent module against the running engine

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use cm_core::{Compatibility, Version, ENGINE_VERSION};
use cm_engine::{check_compatibility, check_module, ModuleError};
use serde::Serialize;

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct CompatArgs {
    /// Engine version the module was built against
    #[arg(required_unless_present = "manifest")]
    pub version: Option<Version>,

    /// Read the version from a module manifest (file or directory)
    #[arg(long, conflicts_with = "version")]
    pub manifest: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompatOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<String>,
    engine: Version,
    #[serde(flatten)]
    result: Compatibility,
}

pub fn handle(args: CompatArgs, format: OutputFormat) -> Result<()> {
    let (module, result) = match (args.manifest, args.version) {
        (Some(path), _) => match check_module(&path) {
            Ok((manifest, compat)) => (Some(manifest.name), compat),
            Err(ModuleError::Incompatible { name, source }) => {
                return Err(ExitError::rejected(format!("module '{name}': {source}")).into())
            }
            Err(e) => return Err(e.into()),
        },
        (None, Some(declared)) => match check_compatibility(&declared) {
            Ok(compat) => (None, compat),
            Err(e) => return Err(ExitError::rejected(e.to_string()).into()),
        },
        (None, None) => anyhow::bail!("either a version or --manifest is required"),
    };

    let output = CompatOutput { module, engine: ENGINE_VERSION, result };
    format_or_json(format, &output, |out| match &output.result {
        Compatibility::Compatible => writeln!(out, "compatible with engine {}", output.engine),
        Compatibility::Warning { declared, running } => writeln!(
            out,
            "warning: built for {declared}, running {running}; minor versions differ"
        ),
        Compatibility::Incompatible { remediation, .. } => writeln!(out, "incompatible: {remediation}"),
    })
}
