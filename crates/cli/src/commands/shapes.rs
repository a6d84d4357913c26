// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cm shapes` - maintain the committed shape artifact

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use cm_core::SystemClock;
use cm_engine::{builtin_registry, current_schemas};
use cm_verify::{ShapeArtifact, ARTIFACT_PATH};
use serde::Serialize;

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct ShapesArgs {
    #[command(subcommand)]
    pub command: ShapesCommand,
}

#[derive(Subcommand)]
pub enum ShapesCommand {
    /// Regenerate the shape artifact from the current schemas
    Generate {
        /// Artifact path
        #[arg(long, default_value = ARTIFACT_PATH)]
        path: PathBuf,
    },
    /// Fail if the artifact does not match the current schemas
    Check {
        /// Artifact path
        #[arg(long, default_value = ARTIFACT_PATH)]
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct ShapesOutput<'a> {
    path: &'a PathBuf,
    written: bool,
    artifact: &'a ShapeArtifact,
}

fn regenerate() -> Result<ShapeArtifact> {
    Ok(ShapeArtifact::generate(&current_schemas(), &builtin_registry()?, &SystemClock))
}

pub fn handle(command: ShapesCommand, format: OutputFormat) -> Result<()> {
    match command {
        ShapesCommand::Generate { path } => {
            let fresh = regenerate()?;
            // Leave an up-to-date artifact alone so its timestamp does not churn
            let (artifact, written) = match ShapeArtifact::load(&path)? {
                Some(existing) if existing.same_content(&fresh) => (existing, false),
                _ => {
                    fresh.save(&path)?;
                    (fresh, true)
                }
            };
            let output = ShapesOutput { path: &path, written, artifact: &artifact };
            format_or_json(format, &output, |out| {
                if written {
                    writeln!(out, "wrote {}", path.display())
                } else {
                    writeln!(out, "{} is up to date", path.display())
                }
            })
        }
        ShapesCommand::Check { path } => {
            let fresh = regenerate()?;
            let Some(committed) = ShapeArtifact::load(&path)? else {
                return Err(ExitError::rejected(format!(
                    "{} is missing; run `cm shapes generate`",
                    path.display()
                ))
                .into());
            };
            if !committed.same_content(&fresh) {
                let kinds: Vec<&str> = committed.changed_kinds(&fresh).iter().map(|k| k.as_str()).collect();
                let detail = if kinds.is_empty() {
                    "migration manifest changed".to_string()
                } else {
                    format!("shapes changed: {}", kinds.join(", "))
                };
                return Err(ExitError::rejected(format!(
                    "{} is stale ({detail}); run `cm shapes generate`",
                    path.display()
                ))
                .into());
            }
            let output = ShapesOutput { path: &path, written: false, artifact: &committed };
            format_or_json(format, &output, |out| writeln!(out, "{} is up to date", path.display()))
        }
    }
}
