// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Execution records shared between the orchestrator and external logging.
//!
//! An [`ExecutionContext`] is created once per pipeline run, accumulates one
//! [`StepResult`] per attempted phase in pipeline order, and is frozen by
//! [`ExecutionContext::complete`] or [`ExecutionContext::fail`].
//! [`ExecutionState`] is derived from it on demand for progress display.

use crate::pipeline::phase::ExecutionPhase;
use crate::utils::error::RepoChainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Total progress units: the three phases plus completion.
pub const TOTAL_PROGRESS_STEPS: usize = 4;

fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_milliseconds()).unwrap_or(0)
}

/// One recorded attempt to run a single phase's tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub phase: ExecutionPhase,
    pub tool: String,
    /// Full argv, executable first
    pub args: Vec<String>,
    /// Cleaned output
    pub output: String,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
}

impl StepResult {
    pub fn succeeded(
        phase: ExecutionPhase,
        tool: impl Into<String>,
        args: Vec<String>,
        output: String,
        start_time: DateTime<Utc>,
    ) -> Self {
        let end_time = Utc::now();
        Self {
            phase,
            tool: tool.into(),
            args,
            output,
            error: None,
            start_time,
            end_time,
            duration_ms: millis_between(start_time, end_time),
            success: true,
        }
    }

    pub fn failed(
        phase: ExecutionPhase,
        tool: impl Into<String>,
        args: Vec<String>,
        output: String,
        error: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        let end_time = Utc::now();
        Self {
            phase,
            tool: tool.into(),
            args,
            output,
            error: Some(error.into()),
            start_time,
            end_time,
            duration_ms: millis_between(start_time, end_time),
            success: false,
        }
    }
}

/// Record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    query: String,
    steps: Vec<StepResult>,
    success: bool,
    error: Option<String>,
    output: String,
}

impl ExecutionContext {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time: Utc::now(),
            end_time: None,
            query: query.into(),
            steps: Vec::new(),
            success: false,
            error: None,
            output: String::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Wall-clock duration in milliseconds; measured up to now while running.
    pub fn duration_ms(&self) -> u64 {
        millis_between(self.start_time, self.end_time.unwrap_or_else(Utc::now))
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    /// Phase the next recorded step must belong to, if any remain.
    pub fn next_phase(&self) -> Option<ExecutionPhase> {
        ExecutionPhase::ALL.get(self.steps.len()).copied()
    }

    fn ensure_open(&self) -> Result<(), RepoChainError> {
        if self.is_complete() {
            return Err(RepoChainError::InvalidState(format!(
                "execution {} is already complete",
                self.id
            )));
        }
        Ok(())
    }

    /// Append a step. Steps must arrive in pipeline order and nothing may
    /// follow a failed step.
    pub fn record_step(&mut self, step: StepResult) -> Result<(), RepoChainError> {
        self.ensure_open()?;
        if self.steps.last().is_some_and(|s| !s.success) {
            return Err(RepoChainError::InvalidState(
                "cannot record a step after a failed step".to_string(),
            ));
        }
        match self.next_phase() {
            Some(expected) if expected == step.phase => {
                self.steps.push(step);
                Ok(())
            }
            Some(expected) => Err(RepoChainError::InvalidState(format!(
                "expected a {} step, got {}",
                expected, step.phase
            ))),
            None => Err(RepoChainError::InvalidState(
                "all phases have already been recorded".to_string(),
            )),
        }
    }

    /// Mark the run successful with its final output.
    pub fn complete(&mut self, output: impl Into<String>) -> Result<(), RepoChainError> {
        self.ensure_open()?;
        self.output = output.into();
        self.success = true;
        self.error = None;
        self.end_time = Some(Utc::now());
        Ok(())
    }

    /// Mark the run failed.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), RepoChainError> {
        self.ensure_open()?;
        self.success = false;
        self.error = Some(error.into());
        self.end_time = Some(Utc::now());
        Ok(())
    }
}

/// Coarse progress position derived from an [`ExecutionContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    Initializing,
    ExtractingContext,
    Generating,
    Complete,
    Error,
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::ExtractingContext => write!(f, "extracting context"),
            Self::Generating => write!(f, "generating"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Snapshot of where a run is; recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionState {
    pub phase: ProgressPhase,
    pub steps_completed: usize,
    pub total_steps: usize,
    pub message: String,
    /// `steps_completed / total_steps`, clamped to 1.0
    pub progress: f64,
}

impl ExecutionState {
    pub fn from_context(context: &ExecutionContext) -> Self {
        let succeeded = context.steps().iter().filter(|s| s.success).count();

        let (phase, steps_completed, message) =
            if let Some(failed) = context.steps().iter().find(|s| !s.success) {
                (
                    ProgressPhase::Error,
                    succeeded,
                    failed
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("{} failed", failed.phase)),
                )
            } else if let Some(error) = context.error() {
                (ProgressPhase::Error, succeeded, error.to_string())
            } else {
                match succeeded {
                    0 => (
                        ProgressPhase::Initializing,
                        0,
                        "Initializing: retrieving prompt".to_string(),
                    ),
                    1 => (
                        ProgressPhase::ExtractingContext,
                        1,
                        "Extracting repository context".to_string(),
                    ),
                    2 => (
                        ProgressPhase::Generating,
                        2,
                        "Generating response".to_string(),
                    ),
                    _ => (
                        ProgressPhase::Complete,
                        TOTAL_PROGRESS_STEPS,
                        "Complete".to_string(),
                    ),
                }
            };

        let progress = (steps_completed as f64 / TOTAL_PROGRESS_STEPS as f64).min(1.0);
        Self {
            phase,
            steps_completed,
            total_steps: TOTAL_PROGRESS_STEPS,
            message,
            progress,
        }
    }
}

/// Receiver for finished execution records.
pub trait ExecutionSink: Send + Sync {
    fn record(&self, context: &ExecutionContext) -> Result<(), RepoChainError>;
}

/// Sink that emits one structured log event per finished run.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ExecutionSink for TracingSink {
    fn record(&self, context: &ExecutionContext) -> Result<(), RepoChainError> {
        let tools: Vec<&str> = context.steps().iter().map(|s| s.tool.as_str()).collect();
        if context.success() {
            tracing::info!(
                execution_id = %context.id(),
                duration_ms = context.duration_ms(),
                steps = context.steps().len(),
                tools = ?tools,
                output_bytes = context.output().len(),
                "Execution succeeded"
            );
        } else {
            tracing::warn!(
                execution_id = %context.id(),
                duration_ms = context.duration_ms(),
                steps = context.steps().len(),
                tools = ?tools,
                error = context.error().unwrap_or("unknown"),
                "Execution failed"
            );
        }
        Ok(())
    }
}
