// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Default include/exclude globs per language.

use super::language::Language;

/// Default include and exclude globs for a language.
#[derive(Debug, Clone, Copy)]
pub struct DefaultPatterns {
    pub include: &'static [&'static str],
    pub exclude: &'static [&'static str],
}

impl DefaultPatterns {
    pub fn include_owned(&self) -> Vec<String> {
        self.include.iter().map(|p| (*p).to_string()).collect()
    }

    pub fn exclude_owned(&self) -> Vec<String> {
        self.exclude.iter().map(|p| (*p).to_string()).collect()
    }
}

const COMMON_EXCLUDES: &[&str] = &[".git/*", "*.log", "*.lock", "*.min.js", "*.map"];

/// Look up the default patterns for `language`.
///
/// Unknown repositories get no include patterns, so every file not excluded
/// is selected.
pub fn default_patterns(language: Language) -> DefaultPatterns {
    match language {
        Language::Go => DefaultPatterns {
            include: &["*.go", "go.mod", "go.sum"],
            exclude: &["vendor/*", "*_test.go", "*.pb.go"],
        },
        Language::Rust => DefaultPatterns {
            include: &["*.rs", "Cargo.toml"],
            exclude: &["target/*"],
        },
        Language::Python => DefaultPatterns {
            include: &["*.py", "pyproject.toml", "requirements.txt", "setup.py", "setup.cfg"],
            exclude: &["__pycache__/*", "*.pyc", "venv/*", ".venv/*", ".tox/*"],
        },
        Language::TypeScript => DefaultPatterns {
            include: &["*.ts", "*.tsx", "package.json", "tsconfig.json"],
            exclude: &["node_modules/*", "dist/*", "build/*", "*.d.ts"],
        },
        Language::JavaScript => DefaultPatterns {
            include: &["*.js", "*.jsx", "*.mjs", "package.json"],
            exclude: &["node_modules/*", "dist/*", "build/*"],
        },
        Language::Java => DefaultPatterns {
            include: &["*.java", "pom.xml", "build.gradle", "build.gradle.kts"],
            exclude: &["target/*", "build/*", ".gradle/*"],
        },
        Language::Ruby => DefaultPatterns {
            include: &["*.rb", "Gemfile", "Rakefile", "*.gemspec"],
            exclude: &["vendor/*", ".bundle/*"],
        },
        Language::Php => DefaultPatterns {
            include: &["*.php", "composer.json"],
            exclude: &["vendor/*"],
        },
        Language::CSharp => DefaultPatterns {
            include: &["*.cs", "*.csproj", "*.sln"],
            exclude: &["bin/*", "obj/*"],
        },
        Language::Cpp => DefaultPatterns {
            include: &["*.cpp", "*.cc", "*.cxx", "*.hpp", "*.h", "CMakeLists.txt"],
            exclude: &["build/*", "cmake-build-*"],
        },
        Language::Unknown => DefaultPatterns {
            include: &[],
            exclude: &["node_modules/*", "vendor/*", "target/*"],
        },
    }
}

/// Exclude patterns applied regardless of language.
pub fn common_excludes() -> Vec<String> {
    COMMON_EXCLUDES.iter().map(|p| (*p).to_string()).collect()
}
