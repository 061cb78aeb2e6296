// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities and fixtures for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Creates a temporary directory for test fixtures.
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Creates a mock project structure for testing.
pub fn create_mock_project(dir: &TempDir, files: &[(&str, &str)]) -> PathBuf {
    let root = dir.path().to_path_buf();

    for (path, content) in files {
        let file_path = root.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    root
}

/// Standard Go project files for testing.
pub fn go_project_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("go.mod", "module example.com/app\n\ngo 1.22\n"),
        (
            "main.go",
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n",
        ),
        (
            "pkg/util/util.go",
            "package util\n\nfunc Add(a, b int) int { return a + b }\n",
        ),
        (
            "pkg/util/util_test.go",
            "package util\n\nimport \"testing\"\n\nfunc TestAdd(t *testing.T) {}\n",
        ),
        ("README.md", "# app\n"),
    ]
}

/// Standard Rust project files for testing.
pub fn rust_project_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Cargo.toml",
            r#"[package]
name = "test-project"
version = "0.1.0"
edition = "2021"

[dependencies]
"#,
        ),
        (
            "src/main.rs",
            r#"fn main() {
    println!("Hello, world!");
}
"#,
        ),
        (
            "src/lib.rs",
            r#"pub fn greet() -> &'static str {
    "Hello!"
}
"#,
        ),
    ]
}

/// Standard TypeScript project files for testing.
pub fn typescript_project_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "package.json",
            r#"{
  "name": "test-project",
  "version": "1.0.0",
  "scripts": {
    "build": "tsc"
  }
}
"#,
        ),
        (
            "tsconfig.json",
            r#"{
  "compilerOptions": {
    "target": "ES2020",
    "strict": true
  }
}
"#,
        ),
        (
            "src/index.ts",
            r#"export function greet(name: string): string {
    return `Hello, ${name}!`;
}
"#,
        ),
    ]
}

/// Documentation-only files; no language indicator matches.
pub fn docs_only_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("README.md", "# Notes\n"),
        ("docs/guide.md", "Some guide\n"),
        ("LICENSE", "Apache-2.0\n"),
    ]
}

/// Creates a repochain.toml config file with specified content.
pub fn create_config_file(dir: &TempDir, content: &str) -> PathBuf {
    let config_path = dir.path().join("repochain.toml");
    std::fs::write(&config_path, content).expect("Failed to write config file");
    config_path
}

/// Shell scripts standing in for the external tools.
///
/// Created once per test binary, before any test spawns a process, so no
/// script is ever open for writing while another thread forks.
#[cfg(unix)]
const FAKE_TOOLS: &[(&str, &str)] = &[
    ("fabric", "#!/bin/sh\necho \"[info] loading pattern\"\necho \"You are a careful reviewer.\"\n"),
    ("code2prompt", "#!/bin/sh\necho \"context for: $*\"\n"),
    (
        "llm",
        "#!/bin/sh\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"--system\" ]; then echo \"system: $2\"; fi\n  shift\ndone\ncat\n",
    ),
    (
        "context-fail",
        "#!/bin/sh\necho \"walking files\"\necho \"Error: cannot read repository\" >&2\nexit 2\n",
    ),
    (
        "touch-last",
        "#!/bin/sh\nfor a in \"$@\"; do last=\"$a\"; done\ntouch \"$last\"\necho done\n",
    ),
    ("slow", "#!/bin/sh\nsleep 10\n"),
];

/// Directory holding the fake tool scripts.
#[cfg(unix)]
pub fn fake_tools_dir() -> &'static Path {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::OnceLock;
    static DIR: OnceLock<PathBuf> = OnceLock::new();

    DIR.get_or_init(|| {
        let dir = tempfile::tempdir()
            .expect("Failed to create tools directory")
            .keep();
        for (name, body) in FAKE_TOOLS {
            let path = dir.join(name);
            std::fs::write(&path, body).expect("Failed to write fake tool");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("Failed to mark fake tool executable");
        }
        dir
    })
}

/// Absolute path of a fake tool.
#[cfg(unix)]
pub fn fake_tool(name: &str) -> String {
    fake_tools_dir().join(name).to_string_lossy().into_owned()
}

/// `PATH` with the fake tools directory first.
#[cfg(unix)]
pub fn path_with_fake_tools() -> std::ffi::OsString {
    let mut paths = vec![fake_tools_dir().to_path_buf()];
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).expect("Failed to build PATH")
}

/// Command for the compiled binary, run from `cwd`.
pub fn repochain_command(cwd: &Path) -> Command {
    #[cfg(unix)]
    let _ = fake_tools_dir();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_repochain"));
    cmd.current_dir(cwd);
    cmd.env_remove("RUST_LOG");
    cmd
}
