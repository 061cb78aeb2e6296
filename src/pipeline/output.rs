// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Post-processing of captured tool output.

/// Line prefixes that mark tool diagnostics rather than payload.
const LOG_PREFIXES: &[&str] = &[
    "[debug]", "[info]", "[warn]", "[warning]", "debug:", "info:", "warn:", "warning:", "debug ",
    "info ", "warn ",
];

const ERROR_MARKERS: &[&str] = &["error", "fail", "exception"];

fn is_log_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    LOG_PREFIXES.iter().any(|prefix| {
        trimmed
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Remove blank lines and debug/info/warn diagnostics.
pub fn clean_output(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim().is_empty() && !is_log_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pick the line that best describes a failure: the first line mentioning an
/// error, failure or exception, else the first non-blank line.
pub fn extract_error_message(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .find(|line| {
            let lowered = line.to_lowercase();
            ERROR_MARKERS.iter().any(|marker| lowered.contains(marker))
        })
        .or_else(|| lines.first())
        .map(|line| (*line).to_string())
}
