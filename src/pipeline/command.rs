// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! argv construction for the three pipeline phases.
//!
//! Commands are always built as argument vectors and executed without a
//! shell, so user text is never interpreted by one.

use crate::repository::RepositoryInfo;

/// At this many selected files the context tool is pointed at `.` instead of
/// receiving each path, keeping the argument list bounded.
pub const FILE_ARGUMENT_THRESHOLD: usize = 100;

/// Directory token passed to the context tool instead of explicit paths.
pub const WHOLE_REPOSITORY: &str = ".";

/// Split a free-text query into whitespace-separated terms.
pub fn split_query(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

/// Split a configured passthrough argument string.
pub fn split_extra_args(args: &str) -> Vec<String> {
    args.split_whitespace().map(str::to_string).collect()
}

/// `<prompt-tool> [extra-args...] <query terms...>`
pub fn prompt_command(tool: &str, extra_args: &[String], query: &str) -> Vec<String> {
    let mut argv = vec![tool.to_string()];
    argv.extend(extra_args.iter().cloned());
    argv.extend(split_query(query));
    argv
}

/// `<context-tool> [--language L] [--include P]* [--exclude P]* [extra-args...] <file...|.>`
pub fn context_command(
    tool: &str,
    repository: &RepositoryInfo,
    extra_args: &[String],
) -> Vec<String> {
    let mut argv = vec![tool.to_string()];

    if repository.language.is_known() {
        argv.push("--language".to_string());
        argv.push(repository.language.as_str().to_string());
    }
    for pattern in &repository.include_patterns {
        argv.push("--include".to_string());
        argv.push(pattern.clone());
    }
    for pattern in &repository.exclude_patterns {
        argv.push("--exclude".to_string());
        argv.push(pattern.clone());
    }
    argv.extend(extra_args.iter().cloned());

    let included: Vec<&str> = repository
        .included_files()
        .map(|f| f.path.as_str())
        .collect();
    if included.is_empty() || included.len() >= FILE_ARGUMENT_THRESHOLD {
        argv.push(WHOLE_REPOSITORY.to_string());
    } else {
        argv.extend(included.into_iter().map(str::to_string));
    }

    argv
}

/// `<generation-tool> [-m model] [--system <prompt>] [extra-args...]`
///
/// The extracted context is supplied on standard input only. It is left off
/// the argument list on purpose: a large context would exceed the
/// platform's argument-length limit, and tools of this kind read the
/// prompt body from stdin when no positional prompt is given.
pub fn generation_command(
    tool: &str,
    model: Option<&str>,
    system_prompt: &str,
    extra_args: &[String],
) -> Vec<String> {
    let mut argv = vec![tool.to_string()];
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        argv.push("-m".to_string());
        argv.push(model.to_string());
    }
    if !system_prompt.trim().is_empty() {
        argv.push("--system".to_string());
        argv.push(system_prompt.to_string());
    }
    argv.extend(extra_args.iter().cloned());
    argv
}
