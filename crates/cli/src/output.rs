// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{self, Write};

use clap::ValueEnum;
use cm_engine::{FileResult, FileState, MigrationPlan, RunReport};
use cm_verify::{KindOutcome, VerifyReport};
use serde::Serialize;

use crate::color;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `data` as pretty JSON, or run `text_fn` against stdout.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(&mut io::StdoutLock<'_>) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(data)?)?,
        OutputFormat::Text => text_fn(&mut out)?,
    }
    Ok(())
}

fn versions(list: &[cm_core::Version]) -> String {
    list.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" -> ")
}

pub fn write_plan(plan: &MigrationPlan, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Dry run, no changes made\n")?;
    if plan.is_noop() {
        writeln!(out, "All config files are at {}", plan.to_version)?;
    } else if let Some(from) = plan.from_version {
        writeln!(out, "{} {} -> {}", color::header("Upgrade:"), from, plan.to_version)?;
        for m in &plan.migrations {
            let flag = if m.breaking { " (breaking)" } else { "" };
            writeln!(out, "  {} {}{}", m.version, m.description, color::context(flag))?;
        }
    }

    if !plan.files.is_empty() {
        writeln!(out)?;
    }
    for file in &plan.files {
        let status = match &file.state {
            FileState::Current => color::context("current"),
            FileState::Invalid { error } => color::failure(&format!("invalid: {error}")),
            FileState::Unversioned { assumed } => {
                format!("unversioned, assumed {assumed}: {}", versions(&file.pending))
            }
            FileState::Behind { version } => format!("{version}: {}", versions(&file.pending)),
        };
        writeln!(out, "  {}  {}", file.file, status)?;
    }
    Ok(())
}

pub fn write_run_report(report: &RunReport, out: &mut impl Write) -> io::Result<()> {
    if report.resumed {
        writeln!(out, "Resumed an interrupted migration")?;
    }
    if let Some(path) = &report.backup_path {
        writeln!(out, "{} {}", color::header("Backup:"), path.display())?;
    }
    for file in &report.files {
        let line = match &file.result {
            FileResult::Unchanged => color::context("unchanged"),
            FileResult::Skipped => color::context("already migrated"),
            FileResult::Migrated { from, to, .. } => color::success(&format!("{from} -> {to}")),
            FileResult::Failed { error } => color::failure(&format!("failed: {error}")),
        };
        writeln!(out, "  {}  {}", file.file, line)?;
    }

    let migrated = report.migrated().count();
    let failed = report.failures().count();
    if report.files.is_empty() || (report.is_noop() && failed == 0) {
        writeln!(out, "Config files are at {}", report.to_version)?;
    } else {
        writeln!(out, "\n{migrated} file(s) migrated to {}, {failed} failed", report.to_version)?;
    }
    if failed > 0 && report.backup_path.is_some() {
        writeln!(out, "Failed files were left untouched; `cm restore-backup` returns every file to the backup")?;
    }
    Ok(())
}

pub fn write_verify_report(report: &VerifyReport, out: &mut impl Write) -> io::Result<()> {
    match &report.baseline {
        Some(origin) => writeln!(out, "{} {}", color::header("Baseline:"), origin)?,
        None => writeln!(out, "{} none (first introduction)", color::header("Baseline:"))?,
    }
    for kind in &report.kinds {
        let text = match &kind.outcome {
            KindOutcome::Unchanged => color::context("unchanged"),
            KindOutcome::Added => "added".to_string(),
            KindOutcome::Removed => color::failure("removed"),
            KindOutcome::Changed { changes, covered_by } => {
                let breaking = changes.iter().filter(|c| c.is_breaking()).count();
                if covered_by.is_empty() {
                    format!("changed, {breaking} breaking")
                } else {
                    format!("changed, {breaking} breaking, migrated by {}", versions(covered_by))
                }
            }
        };
        writeln!(out, "  {}  {}", kind.kind, text)?;
    }
    if report.is_pass() {
        writeln!(out, "{}", color::success("ok"))?;
    }
    for finding in &report.findings {
        writeln!(out, "{} {}", color::failure("error:"), finding)?;
    }
    Ok(())
}
