// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Integration tests that run the compiled binary.

mod common;

use repochain::context::ExecutionContext;
use std::path::Path;
use std::process::{Command, Output};

/// Binary command isolated from the caller's config and environment.
fn isolated_command(cwd: &Path, config_home: &Path) -> Command {
    let mut cmd = common::repochain_command(cwd);
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("REPOCHAIN_MODEL")
        .env_remove("REPOCHAIN_CONFIG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_flag() {
    let temp_dir = common::create_temp_dir();
    let output = isolated_command(temp_dir.path(), temp_dir.path())
        .arg("--help")
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("repochain"));
    assert!(text.contains("--dry-run"));
    assert!(text.contains("--max-tokens"));
}

#[test]
fn test_version_flag() {
    let temp_dir = common::create_temp_dir();
    let output = isolated_command(temp_dir.path(), temp_dir.path())
        .arg("--version")
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_query_is_required() {
    let temp_dir = common::create_temp_dir();
    let output = isolated_command(temp_dir.path(), temp_dir.path())
        .output()
        .expect("Failed to run binary");

    assert!(!output.status.success());
}

#[test]
fn test_dry_run_shows_plan_without_tools() {
    let temp_dir = common::create_temp_dir();
    let project = common::create_mock_project(&temp_dir, &common::go_project_files());
    let empty_path = common::create_temp_dir();

    let output = isolated_command(&project, temp_dir.path())
        .env("PATH", empty_path.path())
        .args(["--dry-run", "explain", "the", "build"])
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Dry Run"));
    assert!(text.contains("Language: go"));
    assert!(text.contains("main.go"));
    assert!(text.contains("explain"));
}

#[test]
fn test_dry_run_with_language_override() {
    let temp_dir = common::create_temp_dir();
    let project = common::create_mock_project(&temp_dir, &common::go_project_files());

    let output = isolated_command(&project, temp_dir.path())
        .args(["--dry-run", "--language", "rust", "summarize"])
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Language: rust (override)"));
}

#[test]
fn test_unknown_language_is_rejected() {
    let temp_dir = common::create_temp_dir();
    let project = common::create_mock_project(&temp_dir, &common::go_project_files());

    let output = isolated_command(&project, temp_dir.path())
        .args(["--dry-run", "--language", "cobol", "summarize"])
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cobol"));
}

#[test]
fn test_missing_tools_fail_before_running() {
    let temp_dir = common::create_temp_dir();
    let project = common::create_mock_project(&temp_dir, &common::go_project_files());
    let empty_path = common::create_temp_dir();

    let output = isolated_command(&project, temp_dir.path())
        .env("PATH", empty_path.path())
        .arg("summarize")
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("fabric"), "stderr: {err}");
    assert!(err.contains("--skip-dependency-check"));
}

#[test]
fn test_missing_repository_path() {
    let temp_dir = common::create_temp_dir();

    let output = isolated_command(temp_dir.path(), temp_dir.path())
        .args(["--path", "no-such-dir", "--skip-dependency-check", "summarize"])
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no-such-dir"));
}

#[cfg(unix)]
#[test]
fn test_full_run_prints_generated_output() {
    let temp_dir = common::create_temp_dir();
    let project = common::create_mock_project(&temp_dir, &common::go_project_files());

    let output = isolated_command(&project, temp_dir.path())
        .env("PATH", common::path_with_fake_tools())
        .args(["--quiet", "review", "error", "handling"])
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("system: You are a careful reviewer."));
    assert!(text.contains("context for: --language go"));
}

#[cfg(unix)]
#[test]
fn test_json_output_is_execution_record() {
    let temp_dir = common::create_temp_dir();
    let project = common::create_mock_project(&temp_dir, &common::go_project_files());

    let output = isolated_command(&project, temp_dir.path())
        .env("PATH", common::path_with_fake_tools())
        .args(["--quiet", "--json", "summarize"])
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let context: ExecutionContext =
        serde_json::from_slice(&output.stdout).expect("stdout should be an execution record");
    assert!(context.success());
    assert_eq!(context.query(), "summarize");
    assert_eq!(context.steps().len(), 3);
}

#[cfg(unix)]
#[test]
fn test_config_file_selects_tools() {
    let temp_dir = common::create_temp_dir();
    let project = common::create_mock_project(&temp_dir, &common::go_project_files());
    let config = format!(
        "[tools]\ncontext = \"{}\"\n",
        common::fake_tool("context-fail")
    );
    common::create_config_file(&temp_dir, &config);

    let output = isolated_command(&project, temp_dir.path())
        .env("PATH", common::path_with_fake_tools())
        .args(["--quiet", "summarize"])
        .output()
        .expect("Failed to run binary");

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("cannot read repository"), "stderr: {err}");
    assert!(stdout(&output).is_empty());
}
