use assert_cmd::Command;
use predicates::prelude::*;

// Help and usage errors exit before any config or network access, so these
// are safe to run anywhere.

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("autodub")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dub"))
        .stdout(predicate::str::contains("targets"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_dub_help_documents_flags() {
    Command::cargo_bin("autodub")
        .unwrap()
        .args(["dub", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--language"))
        .stdout(predicate::str::contains("--no-upload"))
        .stdout(predicate::str::contains("--deadline"));
}

#[test]
fn test_dub_requires_asset_id() {
    Command::cargo_bin("autodub")
        .unwrap()
        .arg("dub")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ASSET_ID"));
}

#[test]
fn test_unknown_subcommand_fails() {
    Command::cargo_bin("autodub")
        .unwrap()
        .arg("transmogrify")
        .assert()
        .failure();
}
