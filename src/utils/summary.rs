// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Post-run summary written to stderr, keeping stdout for the generated result.

use crate::context::ExecutionContext;
use crate::repository::RepositoryInfo;
use crate::utils::formatting::{format_duration, format_number, format_size};
use anyhow::Result;
use console::{Term, style};
use std::io::Write;
use std::time::Duration;

/// Display a summary of a finished run, successful or not.
///
/// # Errors
///
/// Returns an error if writing to the terminal fails.
pub fn display_run_summary(
    context: &ExecutionContext,
    repository: &RepositoryInfo,
    quiet: bool,
) -> Result<()> {
    if quiet {
        return Ok(());
    }
    let mut term = Term::stderr();

    writeln!(term)?;
    if context.success() {
        writeln!(
            term,
            "{} {}",
            style("\u{2713}").green().bold(),
            style("Pipeline completed").bold()
        )?;
    } else {
        writeln!(
            term,
            "{} {}",
            style("\u{2717}").red().bold(),
            style("Pipeline failed").bold()
        )?;
    }

    writeln!(term)?;
    writeln!(term, "{}:", style("Steps").bold())?;
    for (i, step) in context.steps().iter().enumerate() {
        let prefix = if i == context.steps().len() - 1 {
            "\u{2514}\u{2500}"
        } else {
            "\u{251c}\u{2500}"
        };
        let marker = if step.success {
            style("ok").green()
        } else {
            style("failed").red()
        };
        writeln!(
            term,
            "{} {} ({}): {} in {}",
            style(prefix).dim(),
            step.phase,
            step.tool,
            marker,
            format_duration(Duration::from_millis(step.duration_ms))
        )?;
    }

    writeln!(term)?;
    writeln!(term, "{}:", style("Statistics").bold())?;
    writeln!(
        term,
        "{} Language: {}",
        style("\u{251c}\u{2500}").dim(),
        repository.language
    )?;
    writeln!(
        term,
        "{} Files selected: {} ({})",
        style("\u{251c}\u{2500}").dim(),
        format_number(repository.included_count()),
        format_size(repository.included_size())
    )?;
    writeln!(
        term,
        "{} Execution: {}",
        style("\u{251c}\u{2500}").dim(),
        context.id()
    )?;
    writeln!(
        term,
        "{} Time: {}",
        style("\u{2514}\u{2500}").dim(),
        format_duration(Duration::from_millis(context.duration_ms()))
    )?;
    writeln!(term)?;

    Ok(())
}
