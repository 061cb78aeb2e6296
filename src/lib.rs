// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! # repochain
//!
//! repochain classifies a repository's primary language, selects the files
//! relevant to it, and chains three external tools over the result:
//!
//! 1. **Prompt retrieval** - a prompt tool turns the query into a system prompt
//! 2. **Context extraction** - a context tool renders the selected files
//! 3. **LLM execution** - a generation tool answers, reading the context on stdin
//!
//! ## Architecture
//!
//! - [`repository`] produces an immutable [`repository::RepositoryInfo`]
//!   (language detection, gitignore translation, include/exclude selection).
//! - [`pipeline::Orchestrator`] runs the phases in order with per-phase
//!   timeouts, recording one [`context::StepResult`] per attempted phase.
//! - [`context::ExecutionContext`] is the record handed to an
//!   [`context::ExecutionSink`] once the run finishes.
//!
//! Configuration follows hierarchical precedence:
//! 1. User config (~/.config/repochain/config.toml)
//! 2. Git root (repochain.toml)
//! 3. Current directory (repochain.toml)
//! 4. Explicit --config path
//! 5. Environment variables (REPOCHAIN_*)
//! 6. CLI flags (highest precedence)

pub mod cli;
pub mod context;
pub mod pipeline;
pub mod repository;
pub mod utils;

use anyhow::{Context, Result};
use console::Term;
use context::{ExecutionSink, TracingSink};
use pipeline::{ExecutionPhase, Orchestrator, PipelineConfig};
use repository::{AnalysisOptions, analyze_repository};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use utils::error::RepoChainError;
use utils::progress::{PhaseProgress, ProgressManager, stages};

/// Final resolved configuration after merging all sources (CLI, env, config files).
#[derive(Debug, Clone)]
pub struct MergedConfig {
    /// Query text passed to the prompt tool
    pub query: String,
    /// Repository path to analyze
    pub path: PathBuf,
    pub analysis: AnalysisOptions,
    pub pipeline: PipelineConfig,
    /// Do not verify the tools are on PATH
    pub skip_dependency_check: bool,
    /// Show the plan without running any tool
    pub dry_run: bool,
    /// Print the execution record as JSON
    pub json: bool,
    /// Verbosity level (0-3)
    pub verbose: u8,
    /// Quiet mode (suppress non-essential output)
    pub quiet: bool,
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence when set; otherwise quiet selects `error`
/// and each `-v` raises the level from `warn` up to `trace`.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("repochain={level}")));

    // A subscriber may already be installed (tests, embedding applications)
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
    {
        tracing::debug!("Keeping the existing tracing subscriber: {}", e);
    }
}

pub async fn run(config: MergedConfig) -> Result<()> {
    tracing::info!("repochain v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Configuration: path={}, tools={:?}, model={:?}, max_tokens={}, language={:?}",
        config.path.display(),
        config.pipeline.tools,
        config.pipeline.model,
        config.pipeline.max_tokens,
        config.analysis.language
    );

    if !config.path.is_dir() {
        return Err(RepoChainError::RepositoryNotFound(
            config.path.display().to_string(),
        ))
        .context("Failed to validate repository path");
    }

    if !config.skip_dependency_check && !config.dry_run {
        let tools = ExecutionPhase::ALL.map(|phase| config.pipeline.tools.get(phase).as_str());
        utils::tools::check_tools(tools)?;
    }

    let mut progress = ProgressManager::new(config.quiet);
    let scanning = progress.add_stage(stages::SCANNING);
    scanning.set_message(config.path.display().to_string());

    let root = config.path.clone();
    let options = config.analysis.clone();
    let analysis = tokio::task::spawn_blocking(move || analyze_repository(&root, &options))
        .await
        .context("Repository analysis task failed")?;
    let repository = match analysis {
        Ok(repository) => repository,
        Err(e) => {
            progress.abandon(stages::SCANNING, "Repository analysis failed");
            return Err(e).context("Failed to analyze repository");
        }
    };
    progress.finish(
        stages::SCANNING,
        &format!(
            "Detected {}, selected {} of {} files",
            repository.language,
            repository.included_count(),
            repository.files.len()
        ),
    );

    let observer = Arc::new(PhaseProgress::new(progress));
    let orchestrator = Orchestrator::new(config.pipeline.clone()).with_observer(observer);

    if config.dry_run {
        let plan = orchestrator.plan(&config.query, &repository);
        utils::dry_run::display_dry_run_summary(&repository, &plan)?;
        return Ok(());
    }

    let (context, error) = match orchestrator.execute(&config.query, &repository).await {
        Ok(context) => (context, None),
        Err(failure) => {
            let failure = *failure;
            (failure.context, Some(failure.error))
        }
    };

    if let Err(e) = TracingSink.record(&context) {
        tracing::warn!("Failed to record execution {}: {}", context.id(), e);
    }

    let stdout = Term::stdout();
    if config.json {
        let json = serde_json::to_string_pretty(&context).map_err(RepoChainError::from)?;
        stdout.write_line(&json)?;
    } else if context.success() {
        stdout.write_line(context.output())?;
    }

    utils::summary::display_run_summary(&context, &repository, config.quiet)?;

    match error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
