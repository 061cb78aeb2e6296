// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use repochain::utils::error::{RepoChainError, format_error};
use repochain::{cli, run};

#[tokio::main]
async fn main() {
    // Determined before config is parsed so early errors format consistently
    let verbose = std::env::args()
        .any(|arg| arg == "-v" || arg == "--verbose" || arg.starts_with("-vv"));

    if let Err(e) = run_main().await {
        display_error(&e, verbose);
        std::process::exit(1);
    }
}

/// Display an error with contextual formatting.
///
/// Tries to downcast to `RepoChainError` for rich formatting, falls back to
/// anyhow's error chain display for other errors.
fn display_error(error: &anyhow::Error, verbose: bool) {
    if let Some(repochain_error) = error.downcast_ref::<RepoChainError>() {
        eprintln!("{}", format_error(repochain_error, verbose));
    } else {
        eprintln!("\n\u{26a0} Error: {}", error);

        let causes: Vec<_> = error.chain().skip(1).collect();
        if !causes.is_empty() {
            eprintln!("\nCaused by:");
            for (i, cause) in causes.iter().enumerate() {
                let prefix = if i == causes.len() - 1 {
                    "\u{2514}\u{2500}"
                } else {
                    "\u{251c}\u{2500}"
                };
                eprintln!("{} {}", prefix, cause);
            }
        }

        if verbose {
            let backtrace = error.backtrace();
            if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
                eprintln!("\nBacktrace:\n{}", backtrace);
            }
        }
    }
    eprintln!();
}

async fn run_main() -> Result<()> {
    let args = cli::args::parse();
    repochain::init_logging(args.verbose, args.quiet);

    // Config files + environment, then CLI flags on top
    let config = cli::config::load(&args)?;
    let merged_config = cli::config::merge_config(&args, config)?;

    run(merged_config).await
}
