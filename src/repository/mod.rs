// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Repository analysis: language classification plus file selection.
//!
//! [`analyze_repository`] produces the immutable [`RepositoryInfo`] that the
//! pipeline consumes to build its context-extraction command.

pub mod gitignore;
pub mod language;
pub mod matcher;
pub mod patterns;
pub mod walker;

pub use gitignore::{GitignoreRules, load_gitignore, parse_gitignore};
pub use language::{
    DetectionIndicator, IndicatorKind, Language, LanguageDetectionResult, detect_language,
};
pub use matcher::{FileMatcher, Selection};
pub use walker::{ScanLimits, scan_files};

use crate::utils::error::RepoChainError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file visited during the scan and the decision made about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// Size in bytes
    pub size: u64,
    pub included: bool,
    /// Human-readable explanation of `included`
    pub reason: String,
}

/// Result of analyzing a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub language: Language,
    /// Classifier output; `None` when the language was overridden
    pub detection: Option<LanguageDetectionResult>,
    pub root: PathBuf,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub negation_patterns: Vec<String>,
    pub files: Vec<FileInfo>,
    /// `.gitignore` lines as written
    pub gitignore_rules: Vec<String>,
}

impl RepositoryInfo {
    pub fn included_files(&self) -> impl Iterator<Item = &FileInfo> {
        self.files.iter().filter(|f| f.included)
    }

    pub fn included_count(&self) -> usize {
        self.included_files().count()
    }

    pub fn included_size(&self) -> u64 {
        self.included_files().map(|f| f.size).sum()
    }
}

/// Caller overrides for analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Skip classification and use this language
    pub language: Option<Language>,
    /// Replaces the language's default include patterns when non-empty
    pub include: Vec<String>,
    /// Replaces the language's default exclude patterns when non-empty
    pub exclude: Vec<String>,
    /// Do not read `.gitignore`
    pub ignore_gitignore: bool,
    pub limits: ScanLimits,
}

fn push_unique(target: &mut Vec<String>, patterns: impl IntoIterator<Item = String>) {
    for pattern in patterns {
        if !target.contains(&pattern) {
            target.push(pattern);
        }
    }
}

/// Classify the repository at `root` and select its relevant files.
pub fn analyze_repository(
    root: &Path,
    options: &AnalysisOptions,
) -> Result<RepositoryInfo, RepoChainError> {
    if !root.is_dir() {
        return Err(RepoChainError::RepositoryNotFound(
            root.display().to_string(),
        ));
    }

    let (language, detection) = match options.language {
        Some(language) => {
            tracing::debug!("Using language override: {}", language);
            (language, None)
        }
        None => {
            let detection = detect_language(root)?;
            (detection.language, Some(detection))
        }
    };

    let defaults = patterns::default_patterns(language);
    let include_patterns = if options.include.is_empty() {
        defaults.include_owned()
    } else {
        options.include.clone()
    };

    let mut exclude_patterns = Vec::new();
    if options.exclude.is_empty() {
        push_unique(&mut exclude_patterns, defaults.exclude_owned());
    } else {
        push_unique(&mut exclude_patterns, options.exclude.iter().cloned());
    }
    push_unique(&mut exclude_patterns, patterns::common_excludes());

    let gitignore = if options.ignore_gitignore {
        GitignoreRules::default()
    } else {
        load_gitignore(root)?
    };
    push_unique(&mut exclude_patterns, gitignore.excludes.iter().cloned());
    let negation_patterns = gitignore.negations.clone();

    let matcher = Arc::new(FileMatcher::new(
        &include_patterns,
        &exclude_patterns,
        &negation_patterns,
    ));
    let files = scan_files(root, matcher, options.limits)?;

    let info = RepositoryInfo {
        language,
        detection,
        root: root.to_path_buf(),
        include_patterns,
        exclude_patterns,
        negation_patterns,
        files,
        gitignore_rules: gitignore.raw,
    };

    tracing::info!(
        "Analyzed {}: language={}, {} of {} files selected",
        root.display(),
        info.language,
        info.included_count(),
        info.files.len()
    );
    Ok(info)
}
