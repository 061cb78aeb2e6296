// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Weighted-indicator language classification.
//!
//! The classifier walks the top of a repository tree and scores every file
//! name, extension, and directory name against a fixed indicator table.
//! Manifests (`go.mod`, `Cargo.toml`, ...) dominate, source extensions add a
//! little each, and characteristic directory names add a small bonus.
//!
//! ```no_run
//! use repochain::repository::language::detect_language;
//! use std::path::Path;
//!
//! let result = detect_language(Path::new(".")).unwrap();
//! println!("{} ({:.0}%)", result.language, result.confidence * 100.0);
//! ```

use crate::utils::error::RepoChainError;
use ignore::{DirEntry, WalkBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Entries more than this many path separators below the root are not visited.
pub const MAX_DETECTION_SEPARATORS: usize = 3;

/// Directory names that never contribute evidence and are not descended into.
const NOISE_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "bower_components",
    "venv",
    "__pycache__",
    "target",
    "dist",
];

/// Primary implementation language of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Java,
    Ruby,
    Php,
    CSharp,
    Cpp,
    Unknown,
}

impl Language {
    /// Languages the classifier can select, in tie-break order: when two
    /// languages have equal aggregate weight the earlier one wins.
    pub const DETECTABLE: [Language; 10] = [
        Language::Go,
        Language::Rust,
        Language::Python,
        Language::TypeScript,
        Language::JavaScript,
        Language::Java,
        Language::Ruby,
        Language::Php,
        Language::CSharp,
        Language::Cpp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Java => "java",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::CSharp => "csharp",
            Self::Cpp => "cpp",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = RepoChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "go" | "golang" => Ok(Self::Go),
            "rust" | "rs" => Ok(Self::Rust),
            "python" | "py" => Ok(Self::Python),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "javascript" | "js" | "node" => Ok(Self::JavaScript),
            "java" => Ok(Self::Java),
            "ruby" | "rb" => Ok(Self::Ruby),
            "php" => Ok(Self::Php),
            "csharp" | "c#" | "cs" | "dotnet" => Ok(Self::CSharp),
            "cpp" | "c++" | "cxx" => Ok(Self::Cpp),
            "unknown" => Ok(Self::Unknown),
            other => Err(RepoChainError::invalid_language(other)),
        }
    }
}

/// What kind of evidence an indicator matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// Exact file name, typically a manifest or lockfile
    FileName,
    /// File extension (without the dot)
    Extension,
    /// Directory name
    Directory,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileName => write!(f, "file"),
            Self::Extension => write!(f, "extension"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

struct IndicatorRule {
    language: Language,
    kind: IndicatorKind,
    value: &'static str,
    weight: f64,
    description: &'static str,
}

const fn rule(
    language: Language,
    kind: IndicatorKind,
    value: &'static str,
    weight: f64,
    description: &'static str,
) -> IndicatorRule {
    IndicatorRule {
        language,
        kind,
        value,
        weight,
        description,
    }
}

use IndicatorKind::{Directory, Extension, FileName};
use Language::{CSharp, Cpp, Go, Java, JavaScript, Php, Python, Ruby, Rust, TypeScript};

static INDICATORS: &[IndicatorRule] = &[
    // Go
    rule(Go, FileName, "go.mod", 10.0, "Go module definition"),
    rule(Go, FileName, "go.sum", 5.0, "Go module checksums"),
    rule(Go, Extension, "go", 1.0, "Go source file"),
    rule(Go, Directory, "cmd", 2.0, "Go command directory"),
    rule(Go, Directory, "pkg", 2.0, "Go package directory"),
    // Rust
    rule(Rust, FileName, "Cargo.toml", 10.0, "Cargo manifest"),
    rule(Rust, FileName, "Cargo.lock", 5.0, "Cargo lockfile"),
    rule(Rust, Extension, "rs", 1.0, "Rust source file"),
    rule(Rust, Directory, "crates", 2.0, "Cargo workspace crates directory"),
    // Python
    rule(Python, FileName, "pyproject.toml", 10.0, "Python project definition"),
    rule(Python, FileName, "setup.py", 8.0, "setuptools script"),
    rule(Python, FileName, "requirements.txt", 8.0, "pip requirements"),
    rule(Python, FileName, "Pipfile", 8.0, "Pipenv manifest"),
    rule(Python, FileName, "setup.cfg", 5.0, "setuptools configuration"),
    rule(Python, Extension, "py", 1.0, "Python source file"),
    // TypeScript
    rule(TypeScript, FileName, "tsconfig.json", 10.0, "TypeScript compiler configuration"),
    rule(TypeScript, Extension, "ts", 1.0, "TypeScript source file"),
    rule(TypeScript, Extension, "tsx", 1.0, "TypeScript JSX source file"),
    // JavaScript
    rule(JavaScript, FileName, "package.json", 5.0, "npm package manifest"),
    rule(JavaScript, FileName, "package-lock.json", 3.0, "npm lockfile"),
    rule(JavaScript, FileName, "yarn.lock", 3.0, "Yarn lockfile"),
    rule(JavaScript, Extension, "js", 1.0, "JavaScript source file"),
    rule(JavaScript, Extension, "jsx", 1.0, "JavaScript JSX source file"),
    rule(JavaScript, Extension, "mjs", 1.0, "JavaScript module file"),
    // Java
    rule(Java, FileName, "pom.xml", 10.0, "Maven project definition"),
    rule(Java, FileName, "build.gradle", 10.0, "Gradle build script"),
    rule(Java, FileName, "build.gradle.kts", 8.0, "Gradle Kotlin build script"),
    rule(Java, Extension, "java", 1.0, "Java source file"),
    // Ruby
    rule(Ruby, FileName, "Gemfile", 10.0, "Bundler manifest"),
    rule(Ruby, FileName, "Gemfile.lock", 5.0, "Bundler lockfile"),
    rule(Ruby, FileName, "Rakefile", 3.0, "Rake build file"),
    rule(Ruby, Extension, "rb", 1.0, "Ruby source file"),
    // PHP
    rule(Php, FileName, "composer.json", 10.0, "Composer manifest"),
    rule(Php, Extension, "php", 1.0, "PHP source file"),
    // C#
    rule(CSharp, Extension, "csproj", 10.0, "MSBuild C# project"),
    rule(CSharp, Extension, "sln", 8.0, "Visual Studio solution"),
    rule(CSharp, Extension, "cs", 1.0, "C# source file"),
    // C++
    rule(Cpp, FileName, "CMakeLists.txt", 8.0, "CMake build definition"),
    rule(Cpp, Extension, "cpp", 1.0, "C++ source file"),
    rule(Cpp, Extension, "cc", 1.0, "C++ source file"),
    rule(Cpp, Extension, "hpp", 1.0, "C++ header file"),
];

/// A single piece of evidence found during the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionIndicator {
    pub language: Language,
    pub kind: IndicatorKind,
    /// Relative path of the entry that matched
    pub value: String,
    pub weight: f64,
    pub description: String,
}

/// Outcome of classifying a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetectionResult {
    pub language: Language,
    /// Winning share of the total observed weight, in `[0, 1]`
    pub confidence: f64,
    pub indicators: Vec<DetectionIndicator>,
}

fn is_noise_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || NOISE_DIRS.contains(&name.as_ref())
}

fn match_entry(entry: &DirEntry, relative: &str, indicators: &mut Vec<DetectionIndicator>) {
    let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
    let name = entry.file_name().to_string_lossy();
    let extension = entry
        .path()
        .extension()
        .map(|ext| ext.to_string_lossy().to_string());

    for rule in INDICATORS {
        let hit = match rule.kind {
            IndicatorKind::Directory => is_dir && name == rule.value,
            IndicatorKind::FileName => !is_dir && name == rule.value,
            IndicatorKind::Extension => !is_dir && extension.as_deref() == Some(rule.value),
        };
        if hit {
            indicators.push(DetectionIndicator {
                language: rule.language,
                kind: rule.kind,
                value: relative.to_string(),
                weight: rule.weight,
                description: rule.description.to_string(),
            });
        }
    }
}

/// Pick the winning language from a list of indicators.
///
/// Iterates [`Language::DETECTABLE`] in order and only replaces the current
/// best on a strictly greater score, so ties go to the earlier language.
pub fn select_language(indicators: Vec<DetectionIndicator>) -> LanguageDetectionResult {
    let mut scores: HashMap<Language, f64> = HashMap::new();
    for indicator in &indicators {
        *scores.entry(indicator.language).or_insert(0.0) += indicator.weight;
    }
    let total: f64 = scores.values().sum();

    let mut best = Language::Unknown;
    let mut best_score = 0.0;
    for language in Language::DETECTABLE {
        let score = scores.get(&language).copied().unwrap_or(0.0);
        if score > best_score {
            best = language;
            best_score = score;
        }
    }

    let confidence = if total > 0.0 && best.is_known() {
        (best_score / total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    LanguageDetectionResult {
        language: best,
        confidence,
        indicators,
    }
}

/// Classify the primary language of the tree rooted at `root`.
///
/// Unreadable entries are skipped; a missing root is an error.
pub fn detect_language(root: &Path) -> Result<LanguageDetectionResult, RepoChainError> {
    if !root.is_dir() {
        return Err(RepoChainError::RepositoryNotFound(
            root.display().to_string(),
        ));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .max_depth(Some(MAX_DETECTION_SEPARATORS + 1))
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| !is_noise_dir(entry))
        .build();

    let mut indicators = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry during detection: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };
        match_entry(&entry, &relative, &mut indicators);
    }

    let result = select_language(indicators);
    tracing::debug!(
        "Detected language {} with confidence {:.2} from {} indicators",
        result.language,
        result.confidence,
        result.indicators.len()
    );
    Ok(result)
}
