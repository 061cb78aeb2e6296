// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for repository analysis through the public API.

mod common;

use repochain::repository::{
    AnalysisOptions, FileInfo, Language, RepositoryInfo, ScanLimits, analyze_repository,
    detect_language,
};
use repochain::utils::error::RepoChainError;

fn file<'a>(info: &'a RepositoryInfo, path: &str) -> &'a FileInfo {
    info.files
        .iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| panic!("{path} missing from scan"))
}

#[test]
fn test_go_project_is_detected() {
    let temp_dir = common::create_temp_dir();
    let root = common::create_mock_project(&temp_dir, &common::go_project_files());

    let result = detect_language(&root).expect("detection should succeed");
    assert_eq!(result.language, Language::Go);
    assert!(
        result.confidence > 0.5,
        "confidence was {}",
        result.confidence
    );
    assert!(
        result
            .indicators
            .iter()
            .any(|i| i.language == Language::Go && i.value == "go.mod")
    );
}

#[test]
fn test_typescript_project_is_detected() {
    let temp_dir = common::create_temp_dir();
    let root = common::create_mock_project(&temp_dir, &common::typescript_project_files());

    let result = detect_language(&root).unwrap();
    assert_eq!(result.language, Language::TypeScript);
}

#[test]
fn test_documentation_only_is_unknown() {
    let temp_dir = common::create_temp_dir();
    let root = common::create_mock_project(&temp_dir, &common::docs_only_files());

    let result = detect_language(&root).unwrap();
    assert_eq!(result.language, Language::Unknown);
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn test_missing_root_is_an_error() {
    let temp_dir = common::create_temp_dir();
    let missing = temp_dir.path().join("does-not-exist");

    let err = analyze_repository(&missing, &AnalysisOptions::default()).unwrap_err();
    assert!(matches!(err, RepoChainError::RepositoryNotFound(_)));
}

#[test]
fn test_go_defaults_select_sources_and_skip_tests() {
    let temp_dir = common::create_temp_dir();
    let root = common::create_mock_project(&temp_dir, &common::go_project_files());

    let info = analyze_repository(&root, &AnalysisOptions::default()).unwrap();
    assert_eq!(info.language, Language::Go);
    assert!(file(&info, "main.go").included);
    assert!(file(&info, "go.mod").included);
    assert!(file(&info, "pkg/util/util.go").included);
    assert!(!file(&info, "pkg/util/util_test.go").included);
    assert!(!file(&info, "README.md").included);
    assert_eq!(info.included_count(), 3);
}

#[test]
fn test_gitignore_negation_keeps_file() {
    let temp_dir = common::create_temp_dir();
    let mut files = common::go_project_files();
    files.push((".gitignore", "*.log\n!important.log\n"));
    files.push(("debug.log", "noise\n"));
    files.push(("important.log", "keep\n"));
    let root = common::create_mock_project(&temp_dir, &files);

    let options = AnalysisOptions {
        include: vec!["*.go".to_string(), "*.log".to_string()],
        ..AnalysisOptions::default()
    };
    let info = analyze_repository(&root, &options).unwrap();

    assert!(!file(&info, "debug.log").included);
    assert!(file(&info, "important.log").included);
    assert!(info.negation_patterns.iter().any(|p| p == "important.log"));
}

#[test]
fn test_gitignore_can_be_disabled() {
    let temp_dir = common::create_temp_dir();
    let mut files = common::go_project_files();
    files.push((".gitignore", "main.go\n"));
    let root = common::create_mock_project(&temp_dir, &files);

    let respected = analyze_repository(&root, &AnalysisOptions::default()).unwrap();
    assert!(!file(&respected, "main.go").included);

    let options = AnalysisOptions {
        ignore_gitignore: true,
        ..AnalysisOptions::default()
    };
    let ignored = analyze_repository(&root, &options).unwrap();
    assert!(file(&ignored, "main.go").included);
    assert!(ignored.gitignore_rules.is_empty());
}

#[test]
fn test_exclude_beats_include() {
    let temp_dir = common::create_temp_dir();
    let root = common::create_mock_project(&temp_dir, &common::go_project_files());

    let options = AnalysisOptions {
        include: vec!["*.go".to_string()],
        exclude: vec!["pkg/*".to_string()],
        ..AnalysisOptions::default()
    };
    let info = analyze_repository(&root, &options).unwrap();

    assert!(file(&info, "main.go").included);
    assert!(
        info.files
            .iter()
            .filter(|f| f.path.starts_with("pkg/"))
            .all(|f| !f.included)
    );
}

#[test]
fn test_oversized_file_is_excluded_with_reason() {
    let temp_dir = common::create_temp_dir();
    let big = "x".repeat(4096);
    let root = common::create_mock_project(
        &temp_dir,
        &[("go.mod", "module x\n"), ("big.go", big.as_str())],
    );

    let options = AnalysisOptions {
        limits: ScanLimits {
            max_file_size: 1024,
            ..ScanLimits::default()
        },
        ..AnalysisOptions::default()
    };
    let info = analyze_repository(&root, &options).unwrap();

    let big = file(&info, "big.go");
    assert!(!big.included);
    assert!(big.reason.contains("size limit"), "reason: {}", big.reason);
    assert!(file(&info, "go.mod").included);
}

#[test]
fn test_file_limit_aborts_scan() {
    let temp_dir = common::create_temp_dir();
    let sources: Vec<(String, &str)> = (0..5)
        .map(|i| (format!("src/file{i}.rs"), "fn f() {}\n"))
        .collect();
    let mut files: Vec<(&str, &str)> = sources.iter().map(|(p, c)| (p.as_str(), *c)).collect();
    files.push(("Cargo.toml", "[package]\nname = \"x\"\n"));
    let root = common::create_mock_project(&temp_dir, &files);

    let options = AnalysisOptions {
        limits: ScanLimits {
            max_files: 3,
            ..ScanLimits::default()
        },
        ..AnalysisOptions::default()
    };
    let err = analyze_repository(&root, &options).unwrap_err();
    assert!(matches!(err, RepoChainError::FileLimitExceeded { limit: 3 }));
}

#[test]
fn test_language_override_skips_detection() {
    let temp_dir = common::create_temp_dir();
    let root = common::create_mock_project(&temp_dir, &common::go_project_files());

    let options = AnalysisOptions {
        language: Some(Language::Python),
        ..AnalysisOptions::default()
    };
    let info = analyze_repository(&root, &options).unwrap();

    assert_eq!(info.language, Language::Python);
    assert!(info.detection.is_none());
    assert!(info.include_patterns.iter().any(|p| p == "*.py"));
    assert_eq!(info.included_count(), 0);
}

#[test]
fn test_dependency_directories_never_selected() {
    let temp_dir = common::create_temp_dir();
    let mut files = common::typescript_project_files();
    files.push(("node_modules/lib/index.ts", "export {}\n"));
    let root = common::create_mock_project(&temp_dir, &files);

    let info = analyze_repository(&root, &AnalysisOptions::default()).unwrap();
    assert!(file(&info, "src/index.ts").included);
    assert!(
        info.files
            .iter()
            .filter(|f| f.path.starts_with("node_modules/"))
            .all(|f| !f.included)
    );
}
