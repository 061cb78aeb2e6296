// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Include/exclude decision rule for repository files.
//!
//! Exclusion wins over inclusion; a negation pattern reverses an exclusion
//! for the paths it matches. Patterns without a `/` are matched against the
//! file name only, patterns with a `/` against the full relative path and
//! each of its parent directories. A pattern that is not a valid glob is
//! matched as a plain substring.

use globset::{GlobBuilder, GlobMatcher};

#[derive(Debug, Clone)]
struct PatternRule {
    raw: String,
    glob: Option<GlobMatcher>,
    has_separator: bool,
}

impl PatternRule {
    fn new(raw: &str) -> Self {
        let glob = match GlobBuilder::new(raw).literal_separator(true).build() {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                tracing::debug!(
                    "Pattern '{}' is not a valid glob, using substring match: {}",
                    raw,
                    e
                );
                None
            }
        };
        Self {
            raw: raw.to_string(),
            glob,
            has_separator: raw.contains('/'),
        }
    }

    /// Whether matching `dir` implies matching every path beneath it.
    ///
    /// Holds for separator patterns (parent-prefix matching) and substring
    /// fallbacks, never for basename patterns.
    fn covers_descendants(&self, dir: &str) -> bool {
        (self.glob.is_none() || self.has_separator) && self.matches(dir)
    }

    fn matches(&self, path: &str) -> bool {
        let Some(glob) = &self.glob else {
            return path.contains(self.raw.as_str());
        };

        if !self.has_separator {
            let name = path.rsplit('/').next().unwrap_or(path);
            return glob.is_match(name);
        }

        if glob.is_match(path) {
            return true;
        }
        path.match_indices('/')
            .any(|(idx, _)| glob.is_match(&path[..idx]))
    }
}

/// Why a path was or was not selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub included: bool,
    pub reason: String,
}

impl Selection {
    fn include(reason: String) -> Self {
        Self {
            included: true,
            reason,
        }
    }

    fn exclude(reason: String) -> Self {
        Self {
            included: false,
            reason,
        }
    }
}

/// Compiled include, exclude and negation patterns.
#[derive(Debug, Clone, Default)]
pub struct FileMatcher {
    include: Vec<PatternRule>,
    exclude: Vec<PatternRule>,
    negations: Vec<PatternRule>,
}

impl FileMatcher {
    pub fn new(include: &[String], exclude: &[String], negations: &[String]) -> Self {
        let compile = |patterns: &[String]| -> Vec<PatternRule> {
            patterns.iter().map(|p| PatternRule::new(p)).collect()
        };
        Self {
            include: compile(include),
            exclude: compile(exclude),
            negations: compile(negations),
        }
    }

    pub fn has_negations(&self) -> bool {
        !self.negations.is_empty()
    }

    fn first_match<'a>(rules: &'a [PatternRule], path: &str) -> Option<&'a PatternRule> {
        rules.iter().find(|rule| rule.matches(path))
    }

    /// Decide whether a `/`-separated relative path is selected.
    pub fn select(&self, path: &str) -> Selection {
        if let Some(excluded_by) = Self::first_match(&self.exclude, path) {
            return match Self::first_match(&self.negations, path) {
                Some(negation) => Selection::include(format!(
                    "re-included by negation pattern '{}'",
                    negation.raw
                )),
                None => Selection::exclude(format!(
                    "excluded by pattern '{}'",
                    excluded_by.raw
                )),
            };
        }

        if self.include.is_empty() {
            return Selection::include("no include patterns specified".to_string());
        }

        match Self::first_match(&self.include, path) {
            Some(rule) => Selection::include(format!("matched include pattern '{}'", rule.raw)),
            None => Selection::exclude("did not match any include pattern".to_string()),
        }
    }

    /// Whether an entire directory can be skipped without changing any
    /// [`FileMatcher::select`] outcome.
    ///
    /// Requires an exclude pattern that excludes every descendant of `dir`
    /// and no negation patterns, since a negation may re-include a file
    /// anywhere below it.
    pub fn prunes_directory(&self, dir: &str) -> bool {
        !self.has_negations() && self.exclude.iter().any(|rule| rule.covers_descendants(dir))
    }
}
