//! Integration tests for the `macmap` binary.
//!
//! These cover argument parsing, completions, and the failure paths that
//! need no reachable switch.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// `macmap` with every `MACMAP_*` override cleared and the config
/// directory pointed somewhere empty.
fn macmap_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("macmap");
    cmd.env("HOME", "/tmp/macmap-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/macmap-cli-test-nonexistent")
        .env_remove("MACMAP_CONFIG")
        .env_remove("MACMAP_OUTPUT")
        .env_remove("MACMAP_COMMUNITY")
        .env_remove("MACMAP_TENANT")
        .env_remove("RUST_LOG");
    cmd
}

fn inventory(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    macmap_cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_commands() {
    macmap_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("scan")
            .and(predicate::str::contains("switch"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn completions_for_bash() {
    macmap_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("macmap"));
}

#[test]
fn bad_mac_is_a_usage_error() {
    macmap_cmd()
        .args(["scan", "--mac", "not-a-mac"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid MAC address"));
}

// ── Inventory failures ──────────────────────────────────────────────

#[test]
fn tenant_inventory_is_forbidden() {
    let file = inventory("tenant = \"acme\"\n[nodes.n1]\nswitch = \"192.0.2.1\"\nswitchport = 3\n");
    macmap_cmd()
        .arg("--config")
        .arg(file.path())
        .arg("scan")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("tenant"));
}

#[test]
fn invalid_inventory_is_a_usage_error() {
    let file = inventory("[scan]\nswitch_timeout_secs = 0\n");
    macmap_cmd()
        .arg("--config")
        .arg(file.path())
        .arg("scan")
        .assert()
        .code(2);
}

#[test]
fn empty_inventory_scans_nothing() {
    let file = inventory("");
    macmap_cmd()
        .args(["-o", "json-compact", "--config"])
        .arg(file.path())
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn tenant_inventory_cannot_interrogate_a_switch() {
    let file = inventory("tenant = \"acme\"\n");
    macmap_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["switch", "127.0.0.1:9"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("tenant"));
}
