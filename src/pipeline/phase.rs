// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One of the three sequential pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    /// Stage 1: fetch the prompt text for the query
    PromptRetrieval,
    /// Stage 2: extract file context from the repository
    ContextExtraction,
    /// Stage 3: run the generation backend
    LlmExecution,
}

impl ExecutionPhase {
    /// All phases in execution order.
    pub const ALL: [ExecutionPhase; 3] = [
        ExecutionPhase::PromptRetrieval,
        ExecutionPhase::ContextExtraction,
        ExecutionPhase::LlmExecution,
    ];

    /// Zero-based position of this phase in the pipeline.
    pub fn index(self) -> usize {
        match self {
            Self::PromptRetrieval => 0,
            Self::ContextExtraction => 1,
            Self::LlmExecution => 2,
        }
    }

    pub fn default_timeout(self) -> Duration {
        match self {
            Self::PromptRetrieval => Duration::from_secs(30),
            Self::ContextExtraction => Duration::from_secs(60),
            Self::LlmExecution => Duration::from_secs(300),
        }
    }

    /// Short machine-friendly name, used for progress stage keys and config lookups.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PromptRetrieval => "prompt",
            Self::ContextExtraction => "context",
            Self::LlmExecution => "generation",
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PromptRetrieval => write!(f, "prompt retrieval"),
            Self::ContextExtraction => write!(f, "context extraction"),
            Self::LlmExecution => write!(f, "LLM execution"),
        }
    }
}

/// Per-phase values, indexed by [`ExecutionPhase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPhase<T> {
    pub prompt: T,
    pub context: T,
    pub generation: T,
}

impl<T> PerPhase<T> {
    pub fn get(&self, phase: ExecutionPhase) -> &T {
        match phase {
            ExecutionPhase::PromptRetrieval => &self.prompt,
            ExecutionPhase::ContextExtraction => &self.context,
            ExecutionPhase::LlmExecution => &self.generation,
        }
    }
}

impl<T: Default> Default for PerPhase<T> {
    fn default() -> Self {
        Self {
            prompt: T::default(),
            context: T::default(),
            generation: T::default(),
        }
    }
}
