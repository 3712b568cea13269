use assert_cmd::Command;
use predicates::prelude::*;

fn extsync() -> Command {
    Command::cargo_bin("extsync").unwrap()
}

#[test]
fn test_help_lists_commands() {
    extsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extensions"))
        .stdout(predicate::str::contains("settings"))
        .stdout(predicate::str::contains("auth"));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    extsync()
        .args(["extensions", "upload"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("upload"));
}

#[test]
fn test_invalid_repository_is_rejected_before_saving() {
    extsync()
        .args(["repo", "set", "not-a-coordinate"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Invalid repository"))
        .stderr(predicate::str::contains("owner/repo"));
}

#[test]
fn test_invalid_config_key_is_usage_error() {
    extsync()
        .args(["config", "get", "gemini-key"])
        .assert()
        .code(2);
}
