// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Passthrough-argument sanitization and final argv validation.
//!
//! The denylist is a secondary mitigation: it is substring-based and can be
//! bypassed. The primary control is that commands are never run through a
//! shell.

use super::phase::ExecutionPhase;
use crate::utils::error::PipelineError;

/// Substrings that cause a passthrough argument to be dropped.
const DENYLIST: &[&str] = &[
    // destructive filesystem operations
    "rm -rf",
    "rm -fr",
    "mkfs",
    "dd if=",
    "shred",
    // privilege escalation
    "sudo",
    "doas",
    "chmod",
    "chown",
    // network fetch
    "curl",
    "wget",
    "netcat",
    // script evaluation
    "--eval",
    "--exec",
    "eval(",
    "exec(",
    "$(",
    "`",
    "&&",
    "||",
];

/// Sequences that indicate an attempt to escape the working tree.
const TRAVERSAL_SEQUENCES: &[&str] = &["../", "..\\"];

/// Whether an argument contains any denylisted substring (case-insensitive).
pub fn is_denied(arg: &str) -> bool {
    let lowered = arg.to_lowercase();
    DENYLIST.iter().any(|needle| lowered.contains(needle))
}

/// Drop every argument that contains a denylisted substring.
pub fn sanitize_args(args: Vec<String>) -> Vec<String> {
    args.into_iter()
        .filter(|arg| {
            let denied = is_denied(arg);
            if denied {
                tracing::warn!("Dropping disallowed passthrough argument: {}", arg);
            }
            !denied
        })
        .collect()
}

/// Reject empty commands and any argument containing a path-traversal sequence.
pub fn validate_command(phase: ExecutionPhase, argv: &[String]) -> Result<(), PipelineError> {
    let Some(program) = argv.first() else {
        return Err(PipelineError::validation(phase, "command is empty"));
    };
    if program.trim().is_empty() {
        return Err(PipelineError::validation(phase, "executable name is empty"));
    }

    if let Some((index, _)) = argv
        .iter()
        .enumerate()
        .find(|(_, arg)| TRAVERSAL_SEQUENCES.iter().any(|seq| arg.contains(seq)))
    {
        return Err(PipelineError::validation(
            phase,
            format!("argument {} contains a path traversal sequence", index),
        )
        .with_tool(program.clone()));
    }

    Ok(())
}
