#![cfg(unix)]

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use solir_compiler::{
    CompilerError, DriverConfig, Severity, SolcDriver, SolcInput, SourceDescriptor,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

// A forked child can inherit another test's still-open script handle and fail with ETXTBSY.
static SCRIPTS: Mutex<()> = Mutex::new(());

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../solir-core/tests/fixtures/vault_output.json")
}

fn fake_solc(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("solc");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn input() -> SolcInput {
    SolcInput::new(IndexMap::from([(
        "vault.sol".to_string(),
        SourceDescriptor::content("contract Vault {}"),
    )]))
}

#[tokio::test]
async fn test_compile_returns_parsed_response() {
    let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let echo = dir.path().join("request.json");
    let solc = fake_solc(
        &dir,
        &format!(
            "[ \"$1\" = --standard-json ] || exit 3\ncat > '{}'\ncat '{}'",
            echo.display(),
            fixture().display()
        ),
    );

    let output = SolcDriver::new(solc, DriverConfig::default())
        .compile(&input())
        .await
        .unwrap();

    assert!(!output.has_errors());
    assert_eq!(output.errors[0].severity, Severity::Warning);
    assert!(output.sources["vault.sol"].ast.is_some());

    let request: SolcInput = serde_json::from_slice(&fs::read(echo).unwrap()).unwrap();
    assert_eq!(request, input());
}

#[tokio::test]
async fn test_non_zero_exit_is_invocation_failure() {
    let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let solc = fake_solc(&dir, "cat > /dev/null\necho 'boom' >&2\nexit 2");

    let err = SolcDriver::new(solc, DriverConfig::default())
        .compile(&input())
        .await
        .unwrap_err();
    match err {
        CompilerError::Invocation { stderr, .. } => assert_eq!(stderr, "boom"),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_garbage_stdout_is_protocol_mismatch() {
    let _guard = SCRIPTS.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let solc = fake_solc(&dir, "cat > /dev/null\necho 'not json'");

    assert!(matches!(
        SolcDriver::new(solc, DriverConfig::default())
            .compile(&input())
            .await,
        Err(CompilerError::ProtocolMismatch(_))
    ));
}

#[tokio::test]
async fn test_invalid_input_never_spawns() {
    let dir = TempDir::new().unwrap();
    let driver = SolcDriver::new(dir.path().join("missing"), DriverConfig::default());

    assert!(matches!(
        driver.compile(&SolcInput::new(IndexMap::new())).await,
        Err(CompilerError::Validation(_))
    ));
}
