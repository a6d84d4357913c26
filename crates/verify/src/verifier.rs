// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI gate: no breaking schema change without a migration.
//!
//! The baseline artifact comes from the base branch through a [`Baseline`],
//! so the change under review cannot rewrite it. Shapes are regenerated from
//! the schemas compiled into this build and compared kind by kind.

use crate::artifact::{ArtifactError, ShapeArtifact};
use crate::baseline::{Baseline, BaselineError};
use cm_core::{Clock, ConfigKind, ManifestEntry, MigrationRegistry, SystemClock, Version};
use cm_engine::SchemaSet;
use cm_shape::{detect_breaking_changes, BreakingChange};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("reading baseline: {0}")]
    Baseline(#[from] BaselineError),
}

/// A reason the build must fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "finding", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Finding {
    /// No committed artifact in the change under review
    MissingArtifact { path: PathBuf },
    /// The committed artifact does not match the regenerated one
    StaleArtifact { path: PathBuf, kinds: Vec<ConfigKind>, migrations_differ: bool },
    /// Breaking changes to `kind` with no new migration transforming it
    MissingMigration { kind: ConfigKind, changes: Vec<BreakingChange> },
    /// A migration shipped at the base was removed or edited
    RewrittenMigration { version: Version, removed: bool },
    /// A new migration sorts below one that already shipped
    MigrationBeforeBaseline { version: Version, baseline_latest: Version },
    /// A kind present at the base no longer has a schema
    KindRemoved { kind: ConfigKind },
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::MissingArtifact { path } => {
                write!(f, "{} is missing; run `cm shapes generate` and commit it", path.display())
            }
            Finding::StaleArtifact { path, kinds, migrations_differ } => {
                write!(f, "{} is stale", path.display())?;
                if !kinds.is_empty() {
                    let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
                    write!(f, " (shapes changed: {})", names.join(", "))?;
                }
                if *migrations_differ {
                    write!(f, " (migration manifest changed)")?;
                }
                write!(f, "; run `cm shapes generate` and commit the result")
            }
            Finding::MissingMigration { kind, changes } => {
                writeln!(f, "breaking change to '{kind}' without a new migration for it:")?;
                write!(f, "{}", cm_shape::format_changes(changes))
            }
            Finding::RewrittenMigration { version, removed: true } => {
                write!(f, "shipped migration {version} was removed; migrations are append-only")
            }
            Finding::RewrittenMigration { version, removed: false } => {
                write!(f, "shipped migration {version} was edited; add a new migration instead")
            }
            Finding::MigrationBeforeBaseline { version, baseline_latest } => write!(
                f,
                "new migration {version} sorts before already-shipped {baseline_latest}; use a higher version"
            ),
            Finding::KindRemoved { kind } => write!(f, "config kind '{kind}' was removed"),
        }
    }
}

/// Per-kind comparison against the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum KindOutcome {
    Unchanged,
    /// New since the baseline
    Added,
    Changed { changes: Vec<BreakingChange>, covered_by: Vec<Version> },
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub kind: ConfigKind,
    #[serde(flatten)]
    pub outcome: KindOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    /// Where the baseline came from; `None` when the base has no artifact yet
    pub baseline: Option<String>,
    pub new_migrations: Vec<Version>,
    pub kinds: Vec<KindReport>,
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    pub fn is_pass(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Compares the schemas and migrations compiled into this build against a
/// baseline and the artifact committed alongside them.
pub struct Verifier<'a, B: Baseline> {
    schemas: &'a SchemaSet,
    registry: &'a MigrationRegistry,
    baseline: B,
    committed: PathBuf,
}

impl<'a, B: Baseline> Verifier<'a, B> {
    /// `committed` is the artifact path in the change under review.
    pub fn new(
        schemas: &'a SchemaSet,
        registry: &'a MigrationRegistry,
        baseline: B,
        committed: impl Into<PathBuf>,
    ) -> Self {
        Self { schemas, registry, baseline, committed: committed.into() }
    }

    pub fn committed_path(&self) -> &Path {
        &self.committed
    }

    pub fn verify(&self) -> Result<VerifyReport, VerifyError> {
        self.verify_with_clock(&SystemClock)
    }

    pub fn verify_with_clock(&self, clock: &impl Clock) -> Result<VerifyReport, VerifyError> {
        let baseline = self.baseline.artifact()?;
        let current = ShapeArtifact::generate(self.schemas, self.registry, clock);

        let mut report = VerifyReport {
            baseline: baseline.as_ref().map(|_| self.baseline.describe()),
            new_migrations: Vec::new(),
            kinds: Vec::new(),
            findings: Vec::new(),
        };

        if let Some(finding) = self.check_committed(&current)? {
            report.findings.push(finding);
        }

        match baseline {
            Some(base) => compare(&base, &current, &mut report),
            None => {
                info!("no baseline artifact; only checking the committed artifact");
                report.kinds =
                    current.kinds.keys().map(|&kind| KindReport { kind, outcome: KindOutcome::Added }).collect();
            }
        }

        for finding in &report.findings {
            warn!(%finding, "verification failed");
        }
        Ok(report)
    }

    fn check_committed(&self, current: &ShapeArtifact) -> Result<Option<Finding>, VerifyError> {
        let Some(committed) = ShapeArtifact::load(&self.committed)? else {
            return Ok(Some(Finding::MissingArtifact { path: self.committed.clone() }));
        };
        if committed.same_content(current) {
            return Ok(None);
        }
        Ok(Some(Finding::StaleArtifact {
            path: self.committed.clone(),
            kinds: committed.changed_kinds(current),
            migrations_differ: committed.migrations != current.migrations,
        }))
    }
}

fn compare(base: &ShapeArtifact, current: &ShapeArtifact, report: &mut VerifyReport) {
    check_history(&base.migrations, &current.migrations, report);

    let new_migrations: Vec<&ManifestEntry> =
        current.migrations.iter().filter(|m| !base.migrations.iter().any(|b| b.version == m.version)).collect();
    report.new_migrations = new_migrations.iter().map(|m| m.version).collect();

    for (&kind, old) in &base.kinds {
        let Some(new) = current.kinds.get(&kind) else {
            report.findings.push(Finding::KindRemoved { kind });
            report.kinds.push(KindReport { kind, outcome: KindOutcome::Removed });
            continue;
        };
        if old.hash == new.hash {
            debug!(%kind, "shape unchanged");
            report.kinds.push(KindReport { kind, outcome: KindOutcome::Unchanged });
            continue;
        }

        let changes = detect_breaking_changes(&old.shape, &new.shape);
        let covered_by: Vec<Version> =
            new_migrations.iter().filter(|m| m.kinds.contains(&kind)).map(|m| m.version).collect();
        let breaking: Vec<BreakingChange> = changes.iter().filter(|c| c.is_breaking()).cloned().collect();
        if !breaking.is_empty() && covered_by.is_empty() {
            report.findings.push(Finding::MissingMigration { kind, changes: breaking });
        }
        report.kinds.push(KindReport { kind, outcome: KindOutcome::Changed { changes, covered_by } });
    }

    for &kind in current.kinds.keys().filter(|k| !base.kinds.contains_key(*k)) {
        report.kinds.push(KindReport { kind, outcome: KindOutcome::Added });
    }
}

/// Shipped migrations are append-only.
fn check_history(base: &[ManifestEntry], current: &[ManifestEntry], report: &mut VerifyReport) {
    for shipped in base {
        match current.iter().find(|m| m.version == shipped.version) {
            None => report.findings.push(Finding::RewrittenMigration { version: shipped.version, removed: true }),
            Some(now) if now != shipped => {
                report.findings.push(Finding::RewrittenMigration { version: shipped.version, removed: false })
            }
            Some(_) => {}
        }
    }

    let Some(baseline_latest) = base.iter().map(|m| m.version).max() else {
        return;
    };
    for added in current.iter().filter(|m| !base.iter().any(|b| b.version == m.version)) {
        if added.version < baseline_latest {
            report.findings.push(Finding::MigrationBeforeBaseline { version: added.version, baseline_latest });
        }
    }
}

#[cfg(test)]
#[path = "verifier_tests.rs"]
mod tests;
