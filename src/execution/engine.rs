//! Execution engine: owns the lifecycle of automation runs.
//!
//! `start` allocates a pending execution and returns immediately; the run
//! itself proceeds on a spawned task, advancing through the progress source
//! one step at a time. Cancellation is cooperative: the loop re-reads the
//! registry between steps and short-circuits when the record has been
//! cancelled from outside, without invoking the completion hook. The
//! registry refuses to overwrite terminal records, so a cancellation that
//! lands between the loop's re-read and its write still wins.

use crate::execution::domain::{
    Execution, ExecutionDomainError, ExecutionId, ExecutionStatus, LogEntry, RunReport,
};
use crate::execution::ports::{
    CompletionHook, ExecutionRegistry, ExecutionRegistryError, ProgressSource,
};
use crate::realtime::{Broadcaster, RealtimeEvent, Topic};
use crate::tracker::domain::IssueId;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default bound on a run's total wall-clock duration.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(600);

/// Parameter object for starting an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartExecutionRequest {
    issue_id: IssueId,
    prompt: String,
    auto_started: bool,
}

impl StartExecutionRequest {
    /// Creates a start request for an issue.
    #[must_use]
    pub fn new(issue_id: IssueId, prompt: impl Into<String>) -> Self {
        Self {
            issue_id,
            prompt: prompt.into(),
            auto_started: false,
        }
    }

    /// Marks the run as started by automation rather than a direct call.
    #[must_use]
    pub const fn auto_started(mut self) -> Self {
        self.auto_started = true;
        self
    }
}

/// Errors returned by engine operations.
#[derive(Debug, Clone, Error)]
pub enum ExecutionEngineError {
    /// The execution was not found.
    #[error("execution not found: {0}")]
    NotFound(ExecutionId),

    /// Domain validation rejected the operation.
    #[error(transparent)]
    Domain(#[from] ExecutionDomainError),

    /// The registry rejected the operation.
    #[error(transparent)]
    Registry(#[from] ExecutionRegistryError),
}

/// Result type for engine operations.
pub type ExecutionEngineResult<T> = Result<T, ExecutionEngineError>;

/// Drives executions from allocation to a terminal state.
pub struct ExecutionEngine<R, C>
where
    R: ExecutionRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    registry: Arc<R>,
    source: Arc<dyn ProgressSource>,
    hook: Arc<dyn CompletionHook>,
    broadcaster: Arc<Broadcaster>,
    clock: Arc<C>,
    run_timeout: Duration,
}

impl<R, C> Clone for ExecutionEngine<R, C>
where
    R: ExecutionRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            source: Arc::clone(&self.source),
            hook: Arc::clone(&self.hook),
            broadcaster: Arc::clone(&self.broadcaster),
            clock: Arc::clone(&self.clock),
            run_timeout: self.run_timeout,
        }
    }
}

impl<R, C> ExecutionEngine<R, C>
where
    R: ExecutionRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an engine with the default run timeout.
    #[must_use]
    pub fn new(
        registry: Arc<R>,
        source: Arc<dyn ProgressSource>,
        hook: Arc<dyn CompletionHook>,
        broadcaster: Arc<Broadcaster>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            registry,
            source,
            hook,
            broadcaster,
            clock,
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    /// Overrides the bound on a run's total duration.
    #[must_use]
    pub const fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    /// Allocates a pending execution and spawns its run.
    ///
    /// Returns a snapshot of the freshly stored record; the run proceeds
    /// asynchronously.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionEngineError::Domain`] when the request is invalid
    /// or [`ExecutionEngineError::Registry`] when the registry rejects the
    /// record.
    pub async fn start(
        &self,
        request: StartExecutionRequest,
    ) -> ExecutionEngineResult<Execution> {
        let execution = Execution::new(
            request.issue_id,
            request.prompt,
            request.auto_started,
            &*self.clock,
        )?;
        self.registry.store(&execution).await?;

        let engine = self.clone();
        let execution_id = execution.id();
        tokio::spawn(async move {
            if let Err(err) = engine.run(execution_id).await {
                warn!(%execution_id, error = %err, "execution run aborted");
            }
        });

        Ok(execution)
    }

    /// Cancels a running execution.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionEngineError::NotFound`] for an unknown id and
    /// [`ExecutionEngineError::Domain`] when the execution is not running;
    /// terminal executions stay untouched.
    pub async fn cancel(&self, id: ExecutionId) -> ExecutionEngineResult<Execution> {
        let Some(mut execution) = self.registry.find_by_id(id).await? else {
            return Err(ExecutionEngineError::NotFound(id));
        };
        execution.cancel(&*self.clock)?;
        self.registry.update(&execution).await?;
        self.broadcaster
            .publish(
                Topic::Execution(id),
                &RealtimeEvent::ExecutionCancelled { execution_id: id },
            )
            .await;
        Ok(execution)
    }

    /// Starts a brand-new execution for the same issue as a prior one.
    ///
    /// The original record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionEngineError::NotFound`] when the prior execution
    /// does not exist.
    pub async fn retry(&self, id: ExecutionId) -> ExecutionEngineResult<Execution> {
        let Some(original) = self.registry.find_by_id(id).await? else {
            return Err(ExecutionEngineError::NotFound(id));
        };
        self.start(StartExecutionRequest::new(
            original.issue_id(),
            original.prompt(),
        ))
        .await
    }

    /// Returns an execution snapshot, or `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionEngineError::Registry`] on lookup failure.
    pub async fn get(&self, id: ExecutionId) -> ExecutionEngineResult<Option<Execution>> {
        Ok(self.registry.find_by_id(id).await?)
    }

    /// Returns an execution's log lines, or an empty list for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionEngineError::Registry`] on lookup failure.
    pub async fn logs(&self, id: ExecutionId) -> ExecutionEngineResult<Vec<LogEntry>> {
        let execution = self.registry.find_by_id(id).await?;
        Ok(execution.map(|record| record.logs().to_vec()).unwrap_or_default())
    }

    /// Returns an execution's result payload, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionEngineError::Registry`] on lookup failure.
    pub async fn result(&self, id: ExecutionId) -> ExecutionEngineResult<Option<RunReport>> {
        let execution = self.registry.find_by_id(id).await?;
        Ok(execution.and_then(|record| record.result().cloned()))
    }

    /// Returns all executions bound to an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionEngineError::Registry`] on lookup failure.
    pub async fn list_by_issue(
        &self,
        issue_id: IssueId,
    ) -> ExecutionEngineResult<Vec<Execution>> {
        Ok(self.registry.find_by_issue(issue_id).await?)
    }

    /// Drives one run from pending to a terminal state.
    async fn run(&self, execution_id: ExecutionId) -> ExecutionEngineResult<()> {
        let Some(mut execution) = self.registry.find_by_id(execution_id).await? else {
            return Ok(());
        };
        execution.begin()?;
        self.registry.update(&execution).await?;
        self.publish_progress(&execution, None).await;

        let total = self.source.total_steps();
        let deadline = tokio::time::Instant::now() + self.run_timeout;

        for step in 1..=total {
            if !self.is_still_running(execution_id).await? {
                return Ok(());
            }

            let step_result =
                tokio::time::timeout_at(deadline, self.source.await_step(step)).await;
            match step_result {
                Err(_elapsed) => {
                    return self.finish_failed(execution_id, "execution timed out").await;
                }
                Ok(Err(failure)) => {
                    return self.finish_failed(execution_id, failure.to_string()).await;
                }
                Ok(Ok(report)) => {
                    if step < total {
                        self.advance(execution_id, report.progress, report.log).await?;
                    } else {
                        return self.finish_completed(execution_id, report.log).await;
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether the record still exists and is running.
    async fn is_still_running(&self, execution_id: ExecutionId) -> ExecutionEngineResult<bool> {
        let current = self.registry.find_by_id(execution_id).await?;
        Ok(current.is_some_and(|record| record.status() == ExecutionStatus::Running))
    }

    /// Persists a run-loop mutation, yielding to a concurrent terminal write.
    ///
    /// The registry rejects updates once the stored record is terminal; a
    /// cancellation landing between the loop's re-read and its write wins,
    /// and the loop stops without publishing or firing the hook.
    async fn persist_if_live(&self, current: &Execution) -> ExecutionEngineResult<bool> {
        match self.registry.update(current).await {
            Ok(()) => Ok(true),
            Err(ExecutionRegistryError::AlreadyTerminal(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Records one intermediate progress step.
    async fn advance(
        &self,
        execution_id: ExecutionId,
        progress: u8,
        log: String,
    ) -> ExecutionEngineResult<()> {
        let Some(mut current) = self.registry.find_by_id(execution_id).await? else {
            return Ok(());
        };
        if current.status() != ExecutionStatus::Running {
            return Ok(());
        }
        current.record_progress(progress.clamp(1, 99), log.clone(), &*self.clock)?;
        if !self.persist_if_live(&current).await? {
            return Ok(());
        }
        self.publish_progress(&current, Some(log)).await;
        Ok(())
    }

    /// Closes a run as completed and fires the hook's success path.
    async fn finish_completed(
        &self,
        execution_id: ExecutionId,
        final_log: String,
    ) -> ExecutionEngineResult<()> {
        let Some(mut current) = self.registry.find_by_id(execution_id).await? else {
            return Ok(());
        };
        if current.status() != ExecutionStatus::Running {
            return Ok(());
        }
        let report = self.source.final_report();
        current.complete(report.clone(), final_log.clone(), &*self.clock)?;
        if !self.persist_if_live(&current).await? {
            return Ok(());
        }
        self.publish_progress(&current, Some(final_log)).await;
        self.broadcaster
            .publish(
                Topic::Execution(execution_id),
                &RealtimeEvent::ExecutionCompleted {
                    execution_id,
                    result: report,
                },
            )
            .await;
        self.hook.on_terminal(&current, true).await;
        Ok(())
    }

    /// Closes a run as failed and fires the hook's failure path.
    async fn finish_failed(
        &self,
        execution_id: ExecutionId,
        error: impl Into<String>,
    ) -> ExecutionEngineResult<()> {
        let Some(mut current) = self.registry.find_by_id(execution_id).await? else {
            return Ok(());
        };
        if current.status() != ExecutionStatus::Running {
            return Ok(());
        }
        let message = error.into();
        current.fail(message.clone(), &*self.clock)?;
        if !self.persist_if_live(&current).await? {
            return Ok(());
        }
        self.broadcaster
            .publish(
                Topic::Execution(execution_id),
                &RealtimeEvent::ExecutionFailed {
                    execution_id,
                    error: message,
                },
            )
            .await;
        self.hook.on_terminal(&current, false).await;
        Ok(())
    }

    /// Publishes a progress event on the execution's topic.
    async fn publish_progress(&self, execution: &Execution, log: Option<String>) {
        self.broadcaster
            .publish(
                Topic::Execution(execution.id()),
                &RealtimeEvent::ExecutionProgress {
                    execution_id: execution.id(),
                    progress: execution.progress(),
                    log,
                },
            )
            .await;
    }
}
