use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../solir-core/tests/fixtures")
}

fn solir(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("solir").unwrap();
    cmd.env("SOLIR_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_ir_prints_tree_with_locations_and_effects() {
    let home = TempDir::new().unwrap();
    solir(&home)
        .arg("ir")
        .arg(fixtures().join("vault_output.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("vault.sol"))
        .stdout(predicate::str::contains("FunctionDefinition deposit 9:5-12:6"))
        .stdout(predicate::str::contains("[modifies-state|emits]"))
        .stdout(predicate::str::contains("FunctionDefinition peek 20:5-22:6\n"));
}

#[test]
fn test_ir_without_sources_falls_back_to_byte_ranges() {
    let home = TempDir::new().unwrap();
    solir(&home)
        .arg("ir")
        .arg(fixtures().join("vault_output.json"))
        .arg("--root")
        .arg(home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SourceUnit @[0, 617)"));
}

#[test]
fn test_ir_rejects_garbage() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("out.json");
    std::fs::write(&path, "solc: command not found").unwrap();
    solir(&home)
        .arg("ir")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("standard-JSON"));
}

#[test]
fn test_svm_list_empty_root() {
    let home = TempDir::new().unwrap();
    solir(&home)
        .args(["svm", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No compilers installed"));
}

#[test]
fn test_svm_lists_and_resolves_installed_binaries() {
    let home = TempDir::new().unwrap();
    let binary = home.path().join(if cfg!(windows) { "solc-0.8.10.exe" } else { "solc-0.8.10" });
    std::fs::write(&binary, "").unwrap();

    solir(&home)
        .args(["svm", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.8.10"));
    solir(&home)
        .args(["svm", "path", "0.8.10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("solc-0.8.10"));
    solir(&home)
        .args(["svm", "remove", "0.8.10"])
        .assert()
        .success();
    assert!(!binary.exists());
}

#[test]
fn test_svm_reports_version_errors_without_network() {
    let home = TempDir::new().unwrap();
    solir(&home)
        .args(["svm", "install", "0.1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported version 0.1.2"));
    solir(&home)
        .args(["svm", "path", "0.8.a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version"));
    solir(&home)
        .args(["svm", "remove", "0.8.10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"));
}
