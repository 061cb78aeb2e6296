// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! The three-phase external tool pipeline.
//!
//! Each run is strictly sequential: prompt retrieval, context extraction,
//! then LLM execution. Every attempted phase is recorded in the
//! [`ExecutionContext`] before the next one starts, and the first failure
//! ends the run.

pub mod command;
pub mod output;
pub mod phase;
pub mod runner;
pub mod sanitize;
pub mod truncate;

pub use phase::{ExecutionPhase, PerPhase};
pub use runner::{
    CommandOutput, CommandRunner, CommandSpec, ExitStatusError, ProcessRunner, TimeoutError,
};

use crate::context::{ExecutionContext, StepResult};
use crate::repository::RepositoryInfo;
use crate::utils::error::{PipelineError, PipelineErrorKind, RepoChainError};
use chrono::Utc;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Default token budget for generation input.
pub const DEFAULT_MAX_TOKENS: usize = 100_000;

/// Stand-in for the prompt text when previewing commands without running them.
const PROMPT_PLACEHOLDER: &str = "<prompt retrieval output>";

/// Tools and limits for one orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Executable for each phase, resolved via `PATH`
    pub tools: PerPhase<String>,
    /// Whitespace-separated passthrough arguments for each phase
    pub extra_args: PerPhase<String>,
    pub timeouts: PerPhase<Duration>,
    /// Model passed to the generation tool with `-m`
    pub model: Option<String>,
    /// Token budget for generation input; 0 disables truncation
    pub max_tokens: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tools: PerPhase {
                prompt: "fabric".to_string(),
                context: "code2prompt".to_string(),
                generation: "llm".to_string(),
            },
            extra_args: PerPhase::default(),
            timeouts: PerPhase {
                prompt: ExecutionPhase::PromptRetrieval.default_timeout(),
                context: ExecutionPhase::ContextExtraction.default_timeout(),
                generation: ExecutionPhase::LlmExecution.default_timeout(),
            },
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Hooks for following a run as it progresses. All methods default to no-ops.
pub trait ExecutionObserver: Send + Sync {
    /// Called before a phase's command is validated and run.
    fn phase_started(&self, _phase: ExecutionPhase, _argv: &[String]) {}

    /// Called after each step is appended to the context.
    fn step_recorded(&self, _context: &ExecutionContext) {}
}

/// A failed run together with everything recorded before it stopped.
#[derive(Debug)]
pub struct PipelineFailure {
    pub error: RepoChainError,
    /// Failed and finished context; holds every step attempted
    pub context: ExecutionContext,
}

impl PipelineFailure {
    fn new(error: RepoChainError, mut context: ExecutionContext) -> Box<Self> {
        if let Err(e) = context.fail(error.to_string()) {
            tracing::debug!("Execution context was already closed: {}", e);
        }
        Box::new(Self { error, context })
    }

    /// The phase-scoped error, when the failure came from a phase.
    pub fn pipeline_error(&self) -> Option<&PipelineError> {
        match &self.error {
            RepoChainError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

/// A command the pipeline would run, for previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    pub phase: ExecutionPhase,
    pub argv: Vec<String>,
    pub timeout: Duration,
    /// Whether the argv would pass validation
    pub valid: bool,
}

/// Drives the pipeline for a repository.
///
/// [`Orchestrator::execute`] takes the repository explicitly and shares no
/// mutable state between runs. The snapshot API (`set_repository` /
/// `execute_with_repository`) keeps the most recent analysis behind a
/// reader/writer lock; each run clones the `Arc` and works on that snapshot.
pub struct Orchestrator {
    config: PipelineConfig,
    runner: Arc<dyn CommandRunner>,
    observer: Option<Arc<dyn ExecutionObserver>>,
    repository: RwLock<Option<Arc<RepositoryInfo>>>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Orchestrator that runs real processes.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner))
    }

    pub fn with_runner(config: PipelineConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            observer: None,
            repository: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Replace the stored analysis used by [`Orchestrator::execute_with_repository`].
    pub fn set_repository(&self, repository: RepositoryInfo) {
        let mut guard = self
            .repository
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(repository));
    }

    /// Snapshot of the stored analysis.
    pub fn repository(&self) -> Option<Arc<RepositoryInfo>> {
        self.repository
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the pipeline against the stored analysis.
    pub async fn execute_with_repository(
        &self,
        query: &str,
    ) -> Result<ExecutionContext, Box<PipelineFailure>> {
        let Some(repository) = self.repository() else {
            return Err(PipelineFailure::new(
                RepoChainError::InvalidState("no repository has been analyzed".to_string()),
                ExecutionContext::new(query),
            ));
        };
        self.execute(query, &repository).await
    }

    /// Run all three phases for `query` against `repository`.
    ///
    /// On success the returned context is complete and holds the final
    /// output. On failure the context inside [`PipelineFailure`] holds one
    /// step per attempted phase, the failing one last.
    pub async fn execute(
        &self,
        query: &str,
        repository: &RepositoryInfo,
    ) -> Result<ExecutionContext, Box<PipelineFailure>> {
        let mut context = ExecutionContext::new(query);
        tracing::info!(
            "Starting execution {} ({} files selected)",
            context.id(),
            repository.included_count()
        );

        match self.run_phases(&mut context, query, repository).await {
            Ok(output) => match context.complete(output) {
                Ok(()) => {
                    tracing::info!(
                        "Execution {} completed in {}ms",
                        context.id(),
                        context.duration_ms()
                    );
                    Ok(context)
                }
                Err(error) => Err(PipelineFailure::new(error, context)),
            },
            Err(error) => {
                tracing::warn!("Execution {} failed: {}", context.id(), error);
                Err(PipelineFailure::new(error, context))
            }
        }
    }

    /// The commands a run would execute, without running anything.
    pub fn plan(&self, query: &str, repository: &RepositoryInfo) -> Vec<PlannedCommand> {
        ExecutionPhase::ALL
            .into_iter()
            .map(|phase| {
                let argv = self.build_command(phase, query, repository, PROMPT_PLACEHOLDER);
                PlannedCommand {
                    phase,
                    valid: sanitize::validate_command(phase, &argv).is_ok(),
                    argv,
                    timeout: *self.config.timeouts.get(phase),
                }
            })
            .collect()
    }

    fn extra_args(&self, phase: ExecutionPhase) -> Vec<String> {
        sanitize::sanitize_args(command::split_extra_args(self.config.extra_args.get(phase)))
    }

    fn build_command(
        &self,
        phase: ExecutionPhase,
        query: &str,
        repository: &RepositoryInfo,
        prompt: &str,
    ) -> Vec<String> {
        let tool = self.config.tools.get(phase);
        let extra = self.extra_args(phase);
        match phase {
            ExecutionPhase::PromptRetrieval => command::prompt_command(tool, &extra, query),
            ExecutionPhase::ContextExtraction => {
                command::context_command(tool, repository, &extra)
            }
            ExecutionPhase::LlmExecution => {
                command::generation_command(tool, self.config.model.as_deref(), prompt, &extra)
            }
        }
    }

    async fn run_phases(
        &self,
        context: &mut ExecutionContext,
        query: &str,
        repository: &RepositoryInfo,
    ) -> Result<String, RepoChainError> {
        let argv = self.build_command(ExecutionPhase::PromptRetrieval, query, repository, "");
        let prompt = self
            .run_phase(context, ExecutionPhase::PromptRetrieval, argv, None, &repository.root)
            .await?;

        let argv = self.build_command(ExecutionPhase::ContextExtraction, query, repository, "");
        let extracted = self
            .run_phase(context, ExecutionPhase::ContextExtraction, argv, None, &repository.root)
            .await?;

        let input = truncate::truncate_to_budget(&extracted, self.config.max_tokens).into_owned();
        let argv = self.build_command(ExecutionPhase::LlmExecution, query, repository, &prompt);
        self.run_phase(
            context,
            ExecutionPhase::LlmExecution,
            argv,
            Some(input),
            &repository.root,
        )
        .await
    }

    fn record(
        &self,
        context: &mut ExecutionContext,
        step: StepResult,
    ) -> Result<(), RepoChainError> {
        context.record_step(step)?;
        if let Some(observer) = &self.observer {
            observer.step_recorded(context);
        }
        Ok(())
    }

    async fn run_phase(
        &self,
        context: &mut ExecutionContext,
        phase: ExecutionPhase,
        argv: Vec<String>,
        stdin: Option<String>,
        working_dir: &Path,
    ) -> Result<String, RepoChainError> {
        let tool = argv.first().cloned().unwrap_or_default();
        let start = Utc::now();
        if let Some(observer) = &self.observer {
            observer.phase_started(phase, &argv);
        }
        tracing::info!("Running {} with '{}'", phase, tool);
        tracing::debug!("{} argv: {:?}", phase, argv);

        if let Err(error) = sanitize::validate_command(phase, &argv) {
            let step = StepResult::failed(
                phase,
                tool,
                argv,
                String::new(),
                error.redacted_message(),
                start,
            );
            self.record(context, step)?;
            return Err(error.into());
        }

        let spec = CommandSpec {
            phase,
            argv: argv.clone(),
            stdin,
            working_dir: Some(working_dir.to_path_buf()),
            timeout: *self.config.timeouts.get(phase),
        };

        match self.runner.run(&spec).await {
            Ok(result) if result.success => {
                let cleaned = output::clean_output(&result.output);
                let step = StepResult::succeeded(phase, tool, argv, cleaned.clone(), start);
                tracing::debug!(
                    "{} finished in {}ms ({} bytes of output)",
                    phase,
                    step.duration_ms,
                    cleaned.len()
                );
                self.record(context, step)?;
                Ok(cleaned)
            }
            Ok(result) => {
                let error = if result.timed_out {
                    let cause = TimeoutError {
                        after: spec.timeout,
                    };
                    let message = output::extract_error_message(&result.output)
                        .unwrap_or_else(|| cause.to_string());
                    PipelineError::new(phase, PipelineErrorKind::Timeout, message)
                        .with_tool(tool.clone())
                        .with_source(cause)
                } else {
                    let cause = ExitStatusError {
                        code: result.exit_code,
                    };
                    let message = output::extract_error_message(&result.output)
                        .unwrap_or_else(|| cause.to_string());
                    PipelineError::new(phase, PipelineErrorKind::Execution, message)
                        .with_tool(tool.clone())
                        .with_source(cause)
                };
                let step = StepResult::failed(
                    phase,
                    tool,
                    argv,
                    output::clean_output(&result.output),
                    error.redacted_message(),
                    start,
                );
                self.record(context, step)?;
                Err(error.into())
            }
            Err(error) => {
                let error = if error.tool.is_some() {
                    error
                } else {
                    error.with_tool(tool.clone())
                };
                let step = StepResult::failed(
                    phase,
                    tool,
                    argv,
                    String::new(),
                    error.redacted_message(),
                    start,
                );
                self.record(context, step)?;
                Err(error.into())
            }
        }
    }
}
