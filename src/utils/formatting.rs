// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared formatting utilities.

use std::time::Duration;

/// Format a count with thousand separators (e.g., "48,234").
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = Vec::with_capacity(digits.len() / 3 + 1);
    let mut end = digits.len();
    while end > 3 {
        grouped.push(&digits[end - 3..end]);
        end -= 3;
    }
    grouped.push(&digits[..end]);
    grouped.reverse();
    grouped.join(",")
}

/// Format a byte count for display (e.g., "3.2 KB").
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a duration for display: "850ms", "12.3s" or "5m 0.0s".
///
/// Step durations are usually sub-second while phase timeouts run to
/// minutes, so the unit follows the magnitude.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        return format!("{}ms", millis);
    }
    let secs = duration.as_secs();
    if secs < 60 {
        return format!("{:.1}s", duration.as_secs_f64());
    }
    let tenths = duration.subsec_millis() / 100;
    format!("{}m {}.{}s", secs / 60, secs % 60, tenths)
}

/// Quote an argv for display, wrapping arguments that contain whitespace.
pub fn format_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                format!("'{}'", arg.replace('\'', "'\\''"))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(48234), "48,234");
        assert_eq!(format_number(100_000), "100,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(3276), "3.2 KB");
        assert_eq!(format_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_300)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(30)), "30.0s");
        assert_eq!(format_duration(Duration::from_secs(300)), "5m 0.0s");
        assert_eq!(format_duration(Duration::from_millis(83_500)), "1m 23.5s");
    }

    #[test]
    fn test_format_command_quotes_whitespace() {
        let argv = vec![
            "llm".to_string(),
            "--system".to_string(),
            "be brief".to_string(),
            "it's".to_string(),
        ];
        assert_eq!(format_command(&argv), "llm --system 'be brief' it's");
    }
}
