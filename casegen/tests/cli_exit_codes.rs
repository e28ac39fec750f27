//! CLI tests for casegen exit codes.
//!
//! Spawns the casegen binary in a temp workspace. None of these reach the
//! network: they fail on configuration before any request is made.

use std::process::Command;

use casegen::exit_codes;
use casegen::test_support::TestWorkspace;

#[test]
fn missing_api_key_exits_with_config_code_and_writes_nothing() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write("cases.yaml", "testing: Get\ncases:\n  - name: TestGet\n")
        .expect("spec");
    workspace.write("cache.go", "package cache\n").expect("source");

    let output = Command::new(env!("CARGO_BIN_EXE_casegen"))
        .current_dir(workspace.path())
        .env_remove("OPENAI_API_KEY")
        .args([
            "code",
            "--spec-file",
            "cases.yaml",
            "--code-files",
            "cache.go",
            "--output-file",
            "cache_test.go",
        ])
        .output()
        .expect("casegen code");

    assert_eq!(output.status.code(), Some(exit_codes::CONFIG));
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));
    assert!(!workspace.path().join("cache_test.go").exists());
    assert!(!workspace.path().join("casegen-debug.log").exists());
}

#[test]
fn invalid_config_exits_with_config_code() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write("casegen.toml", "model = \"\"\n")
        .expect("config");
    workspace.write("cache.go", "package cache\n").expect("source");

    let status = Command::new(env!("CARGO_BIN_EXE_casegen"))
        .current_dir(workspace.path())
        .env("OPENAI_API_KEY", "test-key")
        .args([
            "cases",
            "--spec-file",
            "cases.yaml",
            "--code-files",
            "cache.go",
            "--what",
            "Get",
        ])
        .status()
        .expect("casegen cases");

    assert_eq!(status.code(), Some(exit_codes::CONFIG));
    assert!(!workspace.path().join("cases.yaml").exists());
}
