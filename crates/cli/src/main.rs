// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `cm` - config migration engine command line

mod color;
mod commands;
mod exit_error;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cm_engine::EngineConfig;
use cm_storage::RestoreTarget;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{backup, compat, shapes, upgrade, verify};
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "cm", version, about = "Versioned config migrations", styles = color::styles())]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t)]
    format: OutputFormat,

    /// State directory (default: $CM_STATE_DIR, then $XDG_STATE_HOME/cm)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Migrate every config file to the running engine version
    Upgrade {
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Replace the state directory with a backup snapshot
    RestoreBackup {
        /// Backup id, or `latest`
        #[arg(default_value = "latest")]
        target: RestoreTarget,
    },
    /// List backup snapshots, oldest first
    Backups,
    /// Check a dependent module's declared engine version
    Compat(compat::CompatArgs),
    /// Generate or check the committed shape artifact
    Shapes(shapes::ShapesArgs),
    /// Fail if a breaking schema change lacks a migration
    Verify(verify::VerifyArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn engine_config(state_dir: Option<PathBuf>) -> Result<EngineConfig> {
    let config = match state_dir {
        Some(dir) => EngineConfig::load_from(dir)?,
        None => EngineConfig::load()?,
    };
    debug!(
        state_dir = %config.state_dir.display(),
        retention = config.backup_retention,
        "resolved engine config"
    );
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Upgrade { dry_run } => upgrade::handle(&engine_config(cli.state_dir)?, dry_run, format),
        Command::RestoreBackup { target } => backup::restore(&engine_config(cli.state_dir)?, &target, format),
        Command::Backups => backup::list(&engine_config(cli.state_dir)?, format),
        Command::Compat(args) => compat::handle(args, format),
        Command::Shapes(args) => shapes::handle(args.command, format),
        Command::Verify(args) => verify::handle(args, format),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(ExitError::code_of(&err));
    }
}
