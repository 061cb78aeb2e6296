// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Dry-run display: what the pipeline would select and run, without spawning
//! any external tool.

use crate::pipeline::PlannedCommand;
use crate::repository::RepositoryInfo;
use crate::utils::formatting::{format_command, format_duration, format_number, format_size};
use anyhow::Result;
use console::{Term, style};
use std::io::Write;

/// Maximum number of files listed before summarizing the rest.
const MAX_FILES_SHOWN: usize = 20;

/// Display the analysis result and the planned commands.
///
/// # Errors
///
/// Returns an error if writing to the terminal fails.
pub fn display_dry_run_summary(repository: &RepositoryInfo, plan: &[PlannedCommand]) -> Result<()> {
    let mut term = Term::stdout();

    writeln!(term)?;
    writeln!(
        term,
        "{} - No external tools will be run",
        style("Dry Run").yellow().bold()
    )?;

    writeln!(term)?;
    writeln!(term, "{}:", style("Repository").bold())?;
    writeln!(
        term,
        "{} Path: {}",
        style("\u{251c}\u{2500}").dim(),
        repository.root.display()
    )?;
    match &repository.detection {
        Some(detection) => writeln!(
            term,
            "{} Language: {} ({:.0}% confidence, {} indicators)",
            style("\u{251c}\u{2500}").dim(),
            repository.language,
            detection.confidence * 100.0,
            detection.indicators.len()
        )?,
        None => writeln!(
            term,
            "{} Language: {} (override)",
            style("\u{251c}\u{2500}").dim(),
            repository.language
        )?,
    }
    writeln!(
        term,
        "{} Include: {}",
        style("\u{251c}\u{2500}").dim(),
        join_or_none(&repository.include_patterns)
    )?;
    writeln!(
        term,
        "{} Exclude: {}",
        style("\u{2514}\u{2500}").dim(),
        join_or_none(&repository.exclude_patterns)
    )?;

    let included: Vec<_> = repository.included_files().collect();
    writeln!(term)?;
    writeln!(
        term,
        "{}: {} of {} scanned ({})",
        style("Selected files").bold(),
        format_number(included.len()),
        format_number(repository.files.len()),
        format_size(repository.included_size())
    )?;
    let shown = included.len().min(MAX_FILES_SHOWN);
    for (i, file) in included.iter().take(shown).enumerate() {
        let is_last = i == shown - 1 && included.len() <= MAX_FILES_SHOWN;
        let prefix = if is_last {
            "\u{2514}\u{2500}"
        } else {
            "\u{251c}\u{2500}"
        };
        writeln!(
            term,
            "{} {} ({})",
            style(prefix).dim(),
            file.path,
            format_size(file.size)
        )?;
    }
    if included.len() > MAX_FILES_SHOWN {
        writeln!(
            term,
            "\u{2514}\u{2500} ... ({} more files)",
            included.len() - MAX_FILES_SHOWN
        )?;
    }

    writeln!(term)?;
    writeln!(term, "{}:", style("Commands").bold())?;
    for command in plan {
        let validity = if command.valid {
            style("ok").green()
        } else {
            style("rejected").red()
        };
        writeln!(
            term,
            "{} [{}, timeout {}] {}",
            style(command.phase.to_string()).cyan(),
            validity,
            format_duration(command.timeout),
            format_command(&command.argv)
        )?;
    }
    writeln!(term)?;

    Ok(())
}

fn join_or_none(patterns: &[String]) -> String {
    if patterns.is_empty() {
        "none".to_string()
    } else {
        patterns.join(", ")
    }
}
