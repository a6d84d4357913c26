//! CLI help output specs
//!
//! Verify help text displays for all commands.

use crate::prelude::*;

#[test]
fn cm_help_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn cm_without_a_command_shows_usage_and_fails() {
    cli().fails_with(2).stderr_has("Usage:");
}

#[test]
fn cm_version_prints_engine_version() {
    cli().args(&["--version"]).passes().stdout_has(&engine_version());
}

#[test]
fn cm_help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("upgrade")
        .stdout_has("restore-backup")
        .stdout_has("backups")
        .stdout_has("compat")
        .stdout_has("shapes")
        .stdout_has("verify");
}

#[test]
fn cm_upgrade_help_shows_dry_run() {
    cli().args(&["upgrade", "--help"]).passes().stdout_has("--dry-run");
}

#[test]
fn cm_shapes_help_shows_subcommands() {
    cli().args(&["shapes", "--help"]).passes().stdout_has("generate").stdout_has("check");
}
