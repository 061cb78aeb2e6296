// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use console::{Term, style};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::context::{ExecutionContext, ExecutionState};
use crate::pipeline::{ExecutionObserver, ExecutionPhase};

/// Stage name constants for consistent progress tracking.
pub mod stages {
    /// Repository classification and file selection.
    pub const SCANNING: &str = "scanning";
    /// Prompt retrieval phase.
    pub const PROMPT: &str = "prompt";
    /// Context extraction phase.
    pub const CONTEXT: &str = "context";
    /// LLM execution phase.
    pub const GENERATION: &str = "generation";
}

/// Manager for multi-stage progress spinners.
///
/// `ProgressManager` coordinates spinners displayed through indicatif's
/// `MultiProgress`. Every stage is indeterminate: external tools report no
/// progress of their own.
///
/// # Example
///
/// ```no_run
/// use repochain::utils::progress::{ProgressManager, stages};
///
/// let mut manager = ProgressManager::new(false);
/// let _scanning = manager.add_stage(stages::SCANNING);
/// manager.update(stages::SCANNING, "src/lib.rs");
/// manager.finish(stages::SCANNING, "Selected 12 files");
/// ```
///
/// # TTY Detection
///
/// When stderr is not a TTY, or the manager is quiet, spinners are hidden
/// and produce no output.
pub struct ProgressManager {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
    /// Whether spinners are drawn (cached at construction time).
    visible: bool,
}

impl ProgressManager {
    /// Creates a new progress manager; `quiet` hides all output.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let visible = !quiet && Term::stderr().is_term();
        Self {
            multi: MultiProgress::new(),
            bars: HashMap::new(),
            visible,
        }
    }

    /// Adds a spinner for a stage, replacing any previous one with the same name.
    #[must_use]
    pub fn add_stage(&mut self, name: &str) -> ProgressBar {
        let pb = if self.visible {
            let spinner = ProgressBar::new_spinner();
            spinner.enable_steady_tick(std::time::Duration::from_millis(100));
            self.multi.add(spinner)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(Self::style_for_stage(name));

        self.bars.insert(name.to_string(), pb.clone());
        pb
    }

    /// Updates the message for a stage. Unknown stages are ignored.
    pub fn update(&self, stage: &str, message: &str) {
        if let Some(pb) = self.bars.get(stage) {
            pb.set_message(message.to_string());
        }
    }

    /// Clears a stage's spinner and prints a completion line above the others.
    pub fn finish(&self, stage: &str, message: &str) {
        if let Some(pb) = self.bars.get(stage) {
            pb.finish_and_clear();
            if self.visible {
                let _ = self.multi.println(message);
            }
        }
    }

    /// Abandons a stage, leaving its last message visible.
    pub fn abandon(&self, stage: &str, message: &str) {
        if let Some(pb) = self.bars.get(stage) {
            pb.abandon_with_message(message.to_string());
        }
    }

    fn style_for_stage(name: &str) -> ProgressStyle {
        let template = match name {
            stages::SCANNING => "{spinner:.green} Scanning repository... {msg}",
            stages::PROMPT => "{spinner:.green} Retrieving prompt... {msg}",
            stages::CONTEXT => "{spinner:.green} Extracting context... {msg}",
            stages::GENERATION => "{spinner:.green} Generating... {msg}",
            _ => "{spinner:.green} {msg}",
        };

        ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to parse progress style template for stage '{}': {e}",
                    name
                );
                ProgressStyle::default_spinner()
            })
    }

    /// Returns whether spinners are drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl std::fmt::Debug for ProgressManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressManager")
            .field("stages", &self.bars.keys().collect::<Vec<_>>())
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

/// Stage name used for a pipeline phase's spinner.
pub fn stage_for_phase(phase: ExecutionPhase) -> &'static str {
    match phase {
        ExecutionPhase::PromptRetrieval => stages::PROMPT,
        ExecutionPhase::ContextExtraction => stages::CONTEXT,
        ExecutionPhase::LlmExecution => stages::GENERATION,
    }
}

/// Drives one spinner per phase from orchestrator callbacks.
#[derive(Debug)]
pub struct PhaseProgress {
    manager: Mutex<ProgressManager>,
}

impl PhaseProgress {
    pub fn new(manager: ProgressManager) -> Self {
        Self {
            manager: Mutex::new(manager),
        }
    }
}

impl ExecutionObserver for PhaseProgress {
    fn phase_started(&self, phase: ExecutionPhase, argv: &[String]) {
        let mut manager = self.manager.lock().unwrap_or_else(PoisonError::into_inner);
        let stage = stage_for_phase(phase);
        let _ = manager.add_stage(stage);
        manager.update(stage, argv.first().map(String::as_str).unwrap_or_default());
    }

    fn step_recorded(&self, context: &ExecutionContext) {
        let Some(step) = context.steps().last() else {
            return;
        };
        let manager = self.manager.lock().unwrap_or_else(PoisonError::into_inner);
        let stage = stage_for_phase(step.phase);
        let state = ExecutionState::from_context(context);

        if step.success {
            manager.finish(
                stage,
                &format!(
                    "{} {} ({}ms) [{}/{}]",
                    style("\u{2713}").green(),
                    step.phase,
                    step.duration_ms,
                    state.steps_completed,
                    state.total_steps
                ),
            );
        } else {
            manager.abandon(
                stage,
                &format!("{} {}", style("\u{2717}").red(), state.message),
            );
        }
    }
}
