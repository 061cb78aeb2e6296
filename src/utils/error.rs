// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

use crate::pipeline::phase::ExecutionPhase;
use console::style;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Compiled regex patterns for redacting sensitive data.
/// Using LazyLock for thread-safe one-time initialization.
///
/// Note: These patterns are static compile-time constants that are validated by tests.
/// The expect() calls here are acceptable because:
/// 1. Patterns are known-valid literals, not runtime input
/// 2. Tests verify all patterns compile successfully
/// 3. Any regex error would be caught immediately at first use
static REDACTION_PATTERNS: LazyLock<[(regex::Regex, &'static str); 4]> = LazyLock::new(|| {
    [
        (
            regex::Regex::new(r"(api[_-]?key[=:\s]+)[^\s]+")
                .expect("api_key redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(token[=:\s]+)[^\s]+").expect("token redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(?i)(bearer\s+)[^\s]+")
                .expect("bearer redaction pattern is invalid"),
            "${1}[REDACTED]",
        ),
        (
            regex::Regex::new(r"(sk-[a-zA-Z0-9]{8,})")
                .expect("sk-key redaction pattern is invalid"),
            "[REDACTED]",
        ),
    ]
});

/// Boxed error type used for wrapped causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RepoChainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Repository path does not exist: {0}")]
    RepositoryNotFound(String),

    #[error("File limit exceeded: more than {limit} files selected")]
    FileLimitExceeded { limit: usize },

    #[error("Invalid execution state: {0}")]
    InvalidState(String),

    #[error("Required tools not found on PATH: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Parse error: {message}")]
    ParseError {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl RepoChainError {
    pub fn invalid_language(name: &str) -> Self {
        RepoChainError::Config(format!(
            "Unknown language '{}'. Valid languages are: {}",
            name,
            crate::repository::Language::DETECTABLE
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    pub fn invalid_timeout(phase: ExecutionPhase) -> Self {
        RepoChainError::Config(format!(
            "Timeout for {} must be greater than zero seconds",
            phase
        ))
    }
}

impl From<serde_json::Error> for RepoChainError {
    fn from(err: serde_json::Error) -> Self {
        RepoChainError::ParseError {
            message: "Failed to serialize execution record".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<config::ConfigError> for RepoChainError {
    fn from(err: config::ConfigError) -> Self {
        RepoChainError::ParseError {
            message: "Failed to load configuration".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// The constructed command was rejected before any process was spawned.
    Validation,
    /// The executable could not be started.
    Spawn,
    /// The process ran and exited with a nonzero status.
    Execution,
    /// The process exceeded its phase timeout and was killed.
    Timeout,
}

impl fmt::Display for PipelineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Spawn => write!(f, "spawn"),
            Self::Execution => write!(f, "execution"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// A failure scoped to one pipeline phase and, when known, the tool that ran in it.
#[derive(Debug, Error)]
#[error("{phase} failed{}: {}", tool_suffix(tool), redact_sensitive_data(message))]
pub struct PipelineError {
    pub phase: ExecutionPhase,
    pub tool: Option<String>,
    pub kind: PipelineErrorKind,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

fn tool_suffix(tool: &Option<String>) -> String {
    tool.as_ref()
        .map(|t| format!(" ({})", t))
        .unwrap_or_default()
}

impl PipelineError {
    pub fn new(phase: ExecutionPhase, kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            phase,
            tool: None,
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn validation(phase: ExecutionPhase, message: impl Into<String>) -> Self {
        Self::new(phase, PipelineErrorKind::Validation, message)
    }

    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Message with credentials scrubbed, suitable for storing in execution records.
    pub fn redacted_message(&self) -> String {
        redact_sensitive_data(&self.message)
    }
}

/// Redact sensitive information from error messages.
pub fn redact_sensitive_data(message: &str) -> String {
    let mut result = message.to_string();
    for (pattern, replacement) in REDACTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }
    result
}

/// Render an error for the terminal.
///
/// Pipeline failures name the phase and tool; verbose mode appends the cause chain.
pub fn format_error(error: &RepoChainError, verbose: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{} {}", style("\u{26a0} Error:").red().bold(), error));

    if let RepoChainError::Pipeline(pipeline) = error {
        out.push_str(&format!(
            "\n  phase: {}\n  kind:  {}",
            pipeline.phase, pipeline.kind
        ));
        if let Some(tool) = &pipeline.tool {
            out.push_str(&format!("\n  tool:  {}", tool));
        }
    }

    if let RepoChainError::MissingTools(_) = error {
        out.push_str("\n\nInstall the missing tools or pass --skip-dependency-check.");
    }

    if verbose {
        let mut source = std::error::Error::source(error);
        if source.is_some() {
            out.push_str("\n\nCaused by:");
        }
        while let Some(cause) = source {
            out.push_str(&format!("\n  {}", cause));
            source = cause.source();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_data_redaction() {
        let message = "Error with api_key=sk-1234567890abcdefghij and token=secret123";
        let redacted = redact_sensitive_data(message);
        assert!(!redacted.contains("sk-1234567890abcdefghij"));
        assert!(!redacted.contains("secret123"));
        assert!(redacted.contains("[REDACTED]"));
    }

    #[test]
    fn test_bearer_redaction_variants() {
        assert!(!redact_sensitive_data("Bearer abc123token").contains("abc123token"));
        assert!(!redact_sensitive_data("BEARER xyz789secret").contains("xyz789secret"));

        let msg = "Authorization: Bearer token123 and more text";
        let redacted = redact_sensitive_data(msg);
        assert!(!redacted.contains("token123"));
        assert!(redacted.contains("more text"));
    }

    #[test]
    fn test_pipeline_error_display_names_phase_and_tool() {
        let err = PipelineError::new(
            ExecutionPhase::ContextExtraction,
            PipelineErrorKind::Execution,
            "boom",
        )
        .with_tool("code2prompt");
        let msg = err.to_string();
        assert!(msg.contains("context extraction"), "got: {msg}");
        assert!(msg.contains("code2prompt"), "got: {msg}");
        assert!(msg.contains("boom"), "got: {msg}");
    }

    #[test]
    fn test_pipeline_error_redacts_tool_output() {
        let err = PipelineError::new(
            ExecutionPhase::LlmExecution,
            PipelineErrorKind::Execution,
            "Error: invalid key sk-test123456789012345678901234",
        );
        assert!(!err.to_string().contains("sk-test1234567890"));
        assert!(err.redacted_message().contains("[REDACTED]"));
    }

    #[test]
    fn test_pipeline_error_unwraps_to_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = PipelineError::new(
            ExecutionPhase::PromptRetrieval,
            PipelineErrorKind::Spawn,
            "could not start",
        )
        .with_source(io);

        let source = std::error::Error::source(&err).expect("source should be set");
        assert!(source.to_string().contains("no such file"));
    }

    #[test]
    fn test_format_error_verbose_includes_chain() {
        let io = std::io::Error::other("disk on fire");
        let err = RepoChainError::Pipeline(
            PipelineError::new(
                ExecutionPhase::PromptRetrieval,
                PipelineErrorKind::Spawn,
                "could not start",
            )
            .with_source(io),
        );
        let rendered = format_error(&err, true);
        assert!(rendered.contains("prompt retrieval"));
        assert!(rendered.contains("disk on fire"));
        assert!(!format_error(&err, false).contains("disk on fire"));
    }

    #[test]
    fn test_invalid_language_lists_choices() {
        let msg = RepoChainError::invalid_language("cobol").to_string();
        assert!(msg.contains("cobol"));
        assert!(msg.contains("go"));
        assert!(msg.contains("rust"));
    }
}
