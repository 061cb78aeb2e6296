// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Translation of `.gitignore` text into the glob vocabulary used by
//! [`FileMatcher`](super::matcher::FileMatcher).
//!
//! Only a subset of gitignore syntax is understood: a leading `/` anchors the
//! rule to the root (the slash is dropped), a trailing `/` marks a directory
//! (rewritten to `dir/*`), and a leading `!` negates. Blank lines and `#`
//! comments are skipped.

use crate::utils::error::RepoChainError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rules read from a `.gitignore` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitignoreRules {
    /// Translated exclude globs
    pub excludes: Vec<String>,
    /// Translated negation globs (without the leading `!`)
    pub negations: Vec<String>,
    /// Non-comment, non-blank lines as written
    pub raw: Vec<String>,
}

impl GitignoreRules {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Translate a single gitignore pattern (without any `!` prefix) into a glob.
pub fn translate_pattern(pattern: &str) -> Option<String> {
    let mut glob = pattern.trim();
    if let Some(stripped) = glob.strip_prefix('/') {
        glob = stripped;
    }

    let translated = match glob.strip_suffix('/') {
        Some(dir) => {
            let dir = dir.trim_end_matches('/');
            if dir.is_empty() {
                return None;
            }
            format!("{}/*", dir)
        }
        None => glob.to_string(),
    };

    if translated.is_empty() {
        None
    } else {
        Some(translated)
    }
}

/// Parse gitignore text.
pub fn parse_gitignore(content: &str) -> GitignoreRules {
    let mut rules = GitignoreRules::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        rules.raw.push(line.to_string());

        match line.strip_prefix('!') {
            Some(negated) => {
                if let Some(glob) = translate_pattern(negated) {
                    rules.negations.push(glob);
                }
            }
            None => {
                if let Some(glob) = translate_pattern(line) {
                    rules.excludes.push(glob);
                }
            }
        }
    }

    rules
}

/// Read `.gitignore` at the repository root, if any.
pub fn load_gitignore(root: &Path) -> Result<GitignoreRules, RepoChainError> {
    let path = root.join(".gitignore");
    if !path.is_file() {
        return Ok(GitignoreRules::default());
    }
    let content = std::fs::read_to_string(&path).map_err(|e| {
        RepoChainError::FileSystem(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })?;
    let rules = parse_gitignore(&content);
    tracing::debug!(
        "Loaded {} gitignore rules ({} negations) from {}",
        rules.raw.len(),
        rules.negations.len(),
        path.display()
    );
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_rule() {
        assert_eq!(translate_pattern("build/").as_deref(), Some("build/*"));
    }

    #[test]
    fn test_root_relative_rule() {
        assert_eq!(translate_pattern("/dist").as_deref(), Some("dist"));
        assert_eq!(translate_pattern("/out/").as_deref(), Some("out/*"));
    }

    #[test]
    fn test_degenerate_rules() {
        assert_eq!(translate_pattern("/"), None);
        assert_eq!(translate_pattern(""), None);
    }

    #[test]
    fn test_parse_separates_negations() {
        let rules = parse_gitignore("# logs\n*.log\n\n!important.log\nnode_modules/\n");
        assert_eq!(rules.excludes, vec!["*.log", "node_modules/*"]);
        assert_eq!(rules.negations, vec!["important.log"]);
        assert_eq!(rules.raw, vec!["*.log", "!important.log", "node_modules/"]);
    }

    #[test]
    fn test_load_missing_gitignore() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let rules = load_gitignore(dir.path()).expect("missing file is not an error");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_load_gitignore_from_disk() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join(".gitignore"), "/target\n*.tmp\n").unwrap();
        let rules = load_gitignore(dir.path()).unwrap();
        assert_eq!(rules.excludes, vec!["target", "*.tmp"]);
    }
}
