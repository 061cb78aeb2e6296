// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use std::path::PathBuf;

/// CLI argument parsing.
///
/// Options left unset fall back to configuration files and `REPOCHAIN_*`
/// environment variables; see [`crate::cli::config`].
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "repochain")]
#[command(about = "Select a repository's relevant files and chain prompt, context and LLM tools")]
#[command(version)]
pub struct Args {
    /// What to ask about the repository
    #[arg(required = true, value_name = "QUERY")]
    pub query: Vec<String>,

    /// Repository to analyze
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Model passed to the generation tool
    #[arg(short, long, env = "REPOCHAIN_MODEL")]
    pub model: Option<String>,

    /// Skip detection and treat the repository as this language
    #[arg(short, long)]
    pub language: Option<String>,

    /// Include only matching files (repeatable; replaces language defaults)
    #[arg(long)]
    pub include: Vec<String>,

    /// Exclude matching files (repeatable; replaces language defaults)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Do not read the repository's .gitignore
    #[arg(long)]
    pub no_gitignore: bool,

    /// Extra arguments for the prompt tool
    #[arg(long, allow_hyphen_values = true)]
    pub prompt_args: Option<String>,

    /// Extra arguments for the context tool
    #[arg(long, allow_hyphen_values = true)]
    pub context_args: Option<String>,

    /// Extra arguments for the generation tool
    #[arg(long, allow_hyphen_values = true)]
    pub generation_args: Option<String>,

    /// Token budget for generation input (0 disables truncation)
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Prompt retrieval timeout in seconds
    #[arg(long)]
    pub prompt_timeout: Option<u64>,

    /// Context extraction timeout in seconds
    #[arg(long)]
    pub context_timeout: Option<u64>,

    /// LLM execution timeout in seconds
    #[arg(long)]
    pub generation_timeout: Option<u64>,

    /// Maximum number of selected files
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Maximum size of a selected file in bytes
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Do not check that the tools are on PATH before running
    #[arg(long)]
    pub skip_dependency_check: bool,

    /// Config file path
    #[arg(short, long, env = "REPOCHAIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show the selection and the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the execution record as JSON instead of the result text
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// The query terms joined back into one string.
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}

pub fn parse() -> Args {
    Args::parse()
}
