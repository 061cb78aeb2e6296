// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management using the `config` crate for hierarchical discovery and merging.
//!
//! ## Configuration Sources (in precedence order, highest to lowest):
//! 1. **CLI flags** - applied by [`merge_config`]
//! 2. **Environment variables** - `REPOCHAIN_<SECTION>__<KEY>`,
//!    e.g. `REPOCHAIN_SCAN__MAX_FILES=500`
//! 3. **Config files**
//!
//! ## Config File Discovery (in merge order, later overrides earlier):
//! 1. `~/.config/repochain/config.toml`
//! 2. `repochain.toml` in the git repository root (walking up from the current directory)
//! 3. `./repochain.toml`
//! 4. Explicit `--config` path (must exist)
//!
//! ## Usage:
//! ```no_run
//! use repochain::cli::{args, config};
//!
//! let args = args::parse();
//! let file_config = config::load(&args)?;
//! let merged = config::merge_config(&args, file_config)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::MergedConfig;
use crate::cli::args::Args;
use crate::pipeline::{ExecutionPhase, PerPhase, PipelineConfig};
use crate::repository::walker::{DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES};
use crate::repository::{AnalysisOptions, Language, ScanLimits};
use crate::utils::error::RepoChainError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "repochain.toml";

/// Root configuration structure loaded from config files and the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default)]
    pub ignore_gitignore: bool,
    #[serde(default)]
    pub skip_dependency_check: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: default_max_tokens(),
            ignore_gitignore: false,
            skip_dependency_check: false,
        }
    }
}

fn default_max_tokens() -> usize {
    crate::pipeline::DEFAULT_MAX_TOKENS
}

/// External tool names and their passthrough arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_prompt_tool")]
    pub prompt: String,
    #[serde(default = "default_context_tool")]
    pub context: String,
    #[serde(default = "default_generation_tool")]
    pub generation: String,
    #[serde(default)]
    pub prompt_args: String,
    #[serde(default)]
    pub context_args: String,
    #[serde(default)]
    pub generation_args: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt_tool(),
            context: default_context_tool(),
            generation: default_generation_tool(),
            prompt_args: String::new(),
            context_args: String::new(),
            generation_args: String::new(),
        }
    }
}

fn default_prompt_tool() -> String {
    "fabric".to_string()
}

fn default_context_tool() -> String {
    "code2prompt".to_string()
}

fn default_generation_tool() -> String {
    "llm".to_string()
}

/// Per-phase timeouts in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_prompt_timeout")]
    pub prompt: u64,
    #[serde(default = "default_context_timeout")]
    pub context: u64,
    #[serde(default = "default_generation_timeout")]
    pub generation: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt_timeout(),
            context: default_context_timeout(),
            generation: default_generation_timeout(),
        }
    }
}

fn default_prompt_timeout() -> u64 {
    ExecutionPhase::PromptRetrieval.default_timeout().as_secs()
}

fn default_context_timeout() -> u64 {
    ExecutionPhase::ContextExtraction.default_timeout().as_secs()
}

fn default_generation_timeout() -> u64 {
    ExecutionPhase::LlmExecution.default_timeout().as_secs()
}

/// Repository scan settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub language: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            language: None,
            include: Vec::new(),
            exclude: Vec::new(),
            max_files: default_max_files(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn discover_config_paths(explicit_path: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(user_config) = get_user_config_path() {
        paths.push(user_config);
    }

    let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);

    if let Some(git_root) = find_git_root() {
        let git_config = git_root.join(CONFIG_FILE_NAME);
        // Skip when the git root is the current directory; it is added below
        let is_current = std::env::current_dir().is_ok_and(|cwd| cwd == git_root);
        if git_config.exists() && !is_current {
            paths.push(git_config);
        }
    }

    if current_dir_config.exists() {
        paths.push(current_dir_config);
    }

    if let Some(explicit) = explicit_path {
        paths.push(explicit.to_path_buf());
    }

    paths
}

fn find_git_root() -> Option<PathBuf> {
    git2::Repository::discover(".")
        .ok()
        .and_then(|repo| repo.workdir().map(|p| p.to_path_buf()))
}

fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|config_dir| config_dir.join("repochain").join("config.toml"))
        .filter(|path| path.exists())
}

fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Config> {
    let settings = builder
        .add_source(
            config::Environment::with_prefix("REPOCHAIN")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("scan.include")
                .with_list_parse_key("scan.exclude")
                .try_parsing(true),
        )
        .build()
        .map_err(RepoChainError::from)
        .context("Failed to build configuration")?;

    settings
        .try_deserialize()
        .map_err(RepoChainError::from)
        .context("Failed to deserialize configuration")
}

/// Load configuration from discovered config files and environment variables.
pub fn load(args: &Args) -> Result<Config> {
    if let Some(explicit) = &args.config
        && !explicit.exists()
    {
        return Err(RepoChainError::Config(format!(
            "Config file not found: {}",
            explicit.display()
        ))
        .into());
    }

    let mut builder = config::Config::builder();
    for config_path in discover_config_paths(args.config.as_deref()) {
        tracing::debug!("Loading config file {}", config_path.display());
        builder = builder.add_source(config::File::from(config_path));
    }
    build(builder)
}

/// Load configuration from a TOML string layered under the environment.
pub fn load_from_str(toml: &str) -> Result<Config> {
    build(config::Config::builder().add_source(config::File::from_str(
        toml,
        config::FileFormat::Toml,
    )))
}

fn timeout(seconds: u64, phase: ExecutionPhase) -> Result<Duration, RepoChainError> {
    if seconds == 0 {
        return Err(RepoChainError::invalid_timeout(phase));
    }
    Ok(Duration::from_secs(seconds))
}

fn non_empty_or(cli: &[String], fallback: &[String]) -> Vec<String> {
    if cli.is_empty() {
        fallback.to_vec()
    } else {
        cli.to_vec()
    }
}

/// Merge CLI arguments over loaded configuration and validate the result.
///
/// CLI values override config values only when they were given.
pub fn merge_config(args: &Args, config: Config) -> Result<MergedConfig, RepoChainError> {
    let language = args
        .language
        .as_deref()
        .or(config.scan.language.as_deref())
        .map(str::parse::<Language>)
        .transpose()?;

    let timeouts = PerPhase {
        prompt: timeout(
            args.prompt_timeout.unwrap_or(config.timeouts.prompt),
            ExecutionPhase::PromptRetrieval,
        )?,
        context: timeout(
            args.context_timeout.unwrap_or(config.timeouts.context),
            ExecutionPhase::ContextExtraction,
        )?,
        generation: timeout(
            args.generation_timeout.unwrap_or(config.timeouts.generation),
            ExecutionPhase::LlmExecution,
        )?,
    };

    let max_files = args.max_files.unwrap_or(config.scan.max_files);
    if max_files == 0 {
        return Err(RepoChainError::Config(
            "max_files must be greater than zero".to_string(),
        ));
    }
    let max_file_size = args.max_file_size.unwrap_or(config.scan.max_file_size);

    let pipeline = PipelineConfig {
        tools: PerPhase {
            prompt: config.tools.prompt,
            context: config.tools.context,
            generation: config.tools.generation,
        },
        extra_args: PerPhase {
            prompt: args.prompt_args.clone().unwrap_or(config.tools.prompt_args),
            context: args
                .context_args
                .clone()
                .unwrap_or(config.tools.context_args),
            generation: args
                .generation_args
                .clone()
                .unwrap_or(config.tools.generation_args),
        },
        timeouts,
        model: args.model.clone().or(config.general.model),
        max_tokens: args.max_tokens.unwrap_or(config.general.max_tokens),
    };

    for phase in ExecutionPhase::ALL {
        if pipeline.tools.get(phase).trim().is_empty() {
            return Err(RepoChainError::Config(format!(
                "No tool configured for {}",
                phase
            )));
        }
    }

    let analysis = AnalysisOptions {
        language,
        include: non_empty_or(&args.include, &config.scan.include),
        exclude: non_empty_or(&args.exclude, &config.scan.exclude),
        ignore_gitignore: args.no_gitignore || config.general.ignore_gitignore,
        limits: ScanLimits {
            max_files,
            max_file_size,
        },
    };

    Ok(MergedConfig {
        query: args.query_text(),
        path: args.path.clone(),
        analysis,
        pipeline,
        skip_dependency_check: args.skip_dependency_check || config.general.skip_dependency_check,
        dry_run: args.dry_run,
        json: args.json,
        verbose: args.verbose,
        quiet: args.quiet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(query: &str) -> Args {
        Args {
            query: vec![query.to_string()],
            path: PathBuf::from("."),
            ..Args::default()
        }
    }

    #[test]
    fn test_defaults() {
        let merged = merge_config(&args("q"), Config::default()).unwrap();
        assert_eq!(merged.pipeline, PipelineConfig::default());
        assert_eq!(merged.analysis.limits.max_files, 1000);
        assert_eq!(merged.analysis.limits.max_file_size, 1024 * 1024);
        assert!(merged.analysis.language.is_none());
        assert!(!merged.analysis.ignore_gitignore);
    }

    #[test]
    fn test_load_from_str_sections() {
        let config = load_from_str(
            r#"
            [general]
            model = "claude-3"
            max_tokens = 5000

            [tools]
            context = "repomix"
            context_args = "--style markdown"

            [timeouts]
            generation = 600

            [scan]
            language = "python"
            exclude = ["tests/*"]
            "#,
        )
        .unwrap();

        assert_eq!(config.general.model.as_deref(), Some("claude-3"));
        assert_eq!(config.general.max_tokens, 5000);
        assert_eq!(config.tools.prompt, "fabric");
        assert_eq!(config.tools.context, "repomix");
        assert_eq!(config.timeouts.generation, 600);
        assert_eq!(config.timeouts.prompt, 30);
        assert_eq!(config.scan.exclude, vec!["tests/*"]);

        let merged = merge_config(&args("q"), config).unwrap();
        assert_eq!(merged.analysis.language, Some(Language::Python));
        assert_eq!(merged.pipeline.tools.context, "repomix");
        assert_eq!(merged.pipeline.extra_args.context, "--style markdown");
        assert_eq!(
            merged.pipeline.timeouts.generation,
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = Config::default();
        config.general.model = Some("from-file".to_string());
        config.scan.include = vec!["*.py".to_string()];
        config.timeouts.prompt = 10;

        let mut cli = args("q");
        cli.model = Some("from-cli".to_string());
        cli.include = vec!["*.rs".to_string()];
        cli.prompt_timeout = Some(5);
        cli.language = Some("rust".to_string());

        let merged = merge_config(&cli, config).unwrap();
        assert_eq!(merged.pipeline.model.as_deref(), Some("from-cli"));
        assert_eq!(merged.analysis.include, vec!["*.rs"]);
        assert_eq!(merged.pipeline.timeouts.prompt, Duration::from_secs(5));
        assert_eq!(merged.analysis.language, Some(Language::Rust));
    }

    #[test]
    fn test_invalid_language_is_config_error() {
        let mut cli = args("q");
        cli.language = Some("cobol".to_string());
        let err = merge_config(&cli, Config::default()).unwrap_err();
        assert!(matches!(err, RepoChainError::Config(_)));
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut cli = args("q");
        cli.context_timeout = Some(0);
        let err = merge_config(&cli, Config::default()).unwrap_err();
        assert!(err.to_string().contains("context extraction"));
    }

    #[test]
    fn test_zero_max_files_rejected() {
        let mut cli = args("q");
        cli.max_files = Some(0);
        assert!(merge_config(&cli, Config::default()).is_err());
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let mut cli = args("q");
        cli.config = Some(PathBuf::from("/nonexistent/repochain.toml"));
        assert!(load(&cli).is_err());
    }
}
