// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! External process execution for pipeline phases.

use super::phase::ExecutionPhase;
use crate::utils::error::{PipelineError, PipelineErrorKind};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// A fully built invocation for one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub phase: ExecutionPhase,
    /// Executable followed by its arguments
    pub argv: Vec<String>,
    /// Text written to the process's standard input
    pub stdin: Option<String>,
    /// Directory the process runs in; inherits the current one when `None`
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

/// What a process produced before exiting or being killed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    /// The process exceeded its timeout and was killed
    pub timed_out: bool,
    /// Standard output followed by standard error, partial after a timeout
    pub output: String,
}

/// Cause attached to a phase failure when a process exits unsuccessfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("process exited with {}", describe_exit(*.code))]
pub struct ExitStatusError {
    pub code: Option<i32>,
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Cause attached to a phase failure when a process is killed on timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {}s", .after.as_secs_f64())]
pub struct TimeoutError {
    pub after: Duration,
}

/// Runs a [`CommandSpec`] to completion or until its timeout expires.
///
/// Nonzero exits and timeouts are reported through [`CommandOutput`] so the
/// output captured so far is kept; `Err` is reserved for processes that could
/// not be started or whose status could not be collected.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, PipelineError>;
}

/// Runs commands as child processes located via `PATH`, without a shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Copy a pipe into a buffer that stays readable if the task is aborted.
fn drain<R>(pipe: Option<R>, buffer: &SharedBuffer) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut pipe = pipe?;
    let buffer = Arc::clone(buffer);
    Some(tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..n]),
                Err(e) => {
                    tracing::debug!("Stopped reading child output: {}", e);
                    break;
                }
            }
        }
    }))
}

fn take(buffer: &SharedBuffer) -> Vec<u8> {
    std::mem::take(&mut *buffer.lock().unwrap_or_else(PoisonError::into_inner))
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }
    combined
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, PipelineError> {
        let Some((program, args)) = spec.argv.split_first() else {
            return Err(PipelineError::validation(spec.phase, "command is empty"));
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            let message = format!("failed to start '{}': {}", program, e);
            PipelineError::new(spec.phase, PipelineErrorKind::Spawn, message)
                .with_tool(program.clone())
                .with_source(e)
        })?;

        let writer = match (child.stdin.take(), spec.stdin.clone()) {
            (Some(mut pipe), Some(input)) => Some(tokio::spawn(async move {
                pipe.write_all(input.as_bytes()).await?;
                pipe.shutdown().await
            })),
            _ => None,
        };

        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let mut readers: Vec<JoinHandle<()>> = [
            drain(child.stdout.take(), &stdout),
            drain(child.stderr.take(), &stderr),
        ]
        .into_iter()
        .flatten()
        .collect();

        // Readers are awaited inside the deadline so a descendant holding
        // the pipes open cannot outlive the timeout.
        let finished = tokio::time::timeout(spec.timeout, async {
            let status = child.wait().await?;
            for reader in &mut readers {
                if let Err(e) = reader.await {
                    tracing::debug!("Output reader for '{}' failed: {}", program, e);
                }
            }
            Ok::<_, std::io::Error>(status)
        })
        .await;

        let status = match finished {
            Ok(result) => result.map_err(|e| {
                PipelineError::new(
                    spec.phase,
                    PipelineErrorKind::Execution,
                    format!("failed to collect output from '{}': {}", program, e),
                )
                .with_tool(program.clone())
                .with_source(e)
            })?,
            Err(_) => {
                if let Some(writer) = &writer {
                    writer.abort();
                }
                if let Err(e) = child.kill().await {
                    tracing::debug!("Killing '{}' after timeout failed: {}", program, e);
                }
                for reader in &readers {
                    reader.abort();
                }
                tracing::debug!(
                    "'{}' exceeded its {}s timeout",
                    program,
                    spec.timeout.as_secs_f64()
                );
                return Ok(CommandOutput {
                    exit_code: None,
                    success: false,
                    timed_out: true,
                    output: combine_output(&take(&stdout), &take(&stderr)),
                });
            }
        };

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!("Writing stdin to '{}' failed: {}", program, e),
                Err(e) => tracing::debug!("Stdin writer for '{}' did not finish: {}", program, e),
            }
        }

        Ok(CommandOutput {
            exit_code: status.code(),
            success: status.success(),
            timed_out: false,
            output: combine_output(&take(&stdout), &take(&stderr)),
        })
    }
}
