//! Stage executors

use super::Invocation;
use crate::error::StageError;
use async_trait::async_trait;

/// Runs one resolved stage invocation to completion
#[async_trait]
pub trait StageExecutor: Send + Sync {
    async fn execute(&self, invocation: &Invocation) -> Result<(), StageError>;
}

/// Spawns each invocation as a child process and waits for it
///
/// Children inherit stdout/stderr. A child whose future is dropped (another
/// invocation of the same sub-stage failed) is killed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StageExecutor for CommandExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<(), StageError> {
        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| StageError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }

        match status.code() {
            Some(code) => Err(StageError::Exited {
                program: invocation.program.clone(),
                code,
            }),
            None => Err(StageError::Signaled {
                program: invocation.program.clone(),
            }),
        }
    }
}

/// Logs each invocation instead of running it
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl StageExecutor for DryRunExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<(), StageError> {
        tracing::info!(
            stage = %invocation.stage,
            collection_id = invocation.collection_id.as_deref().unwrap_or("-"),
            "[dry run] {} {}",
            invocation.program,
            invocation.args_lossy().join(" ")
        );
        Ok(())
    }
}
