//! Behavioural tests for the execution engine's run loop.

use crate::execution::{
    ExecutionEngine, ExecutionEngineError, StartExecutionRequest,
    adapters::{FixedScheduleSource, InMemoryExecutionRegistry},
    domain::{Execution, ExecutionDomainError, ExecutionId, ExecutionStatus, RunReport},
    ports::{CompletionHook, ProgressSource, StepFailure, StepReport},
};
use crate::realtime::Broadcaster;
use crate::tracker::domain::IssueId;
use async_trait::async_trait;
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type TestEngine = ExecutionEngine<InMemoryExecutionRegistry, DefaultClock>;

#[derive(Debug, Default)]
struct RecordingHook {
    calls: Mutex<Vec<(ExecutionId, bool)>>,
}

impl RecordingHook {
    fn calls(&self) -> Vec<(ExecutionId, bool)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionHook for RecordingHook {
    async fn on_terminal(&self, execution: &Execution, success: bool) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((execution.id(), success));
        }
    }
}

/// Source that fails at a chosen step after succeeding on earlier ones.
struct FailingSource {
    total: u32,
    fail_at: u32,
}

#[async_trait]
impl ProgressSource for FailingSource {
    fn total_steps(&self) -> u32 {
        self.total
    }

    async fn await_step(&self, step: u32) -> Result<StepReport, StepFailure> {
        tokio::task::yield_now().await;
        if step >= self.fail_at {
            return Err(StepFailure("agent process exited with code 1".to_owned()));
        }
        Ok(StepReport {
            progress: FixedScheduleSource::progress_for(step, self.total),
            log: format!("Step {step} completed"),
        })
    }

    fn final_report(&self) -> RunReport {
        RunReport::default()
    }
}

fn engine_with(source: Arc<dyn ProgressSource>, hook: Arc<dyn CompletionHook>) -> TestEngine {
    ExecutionEngine::new(
        Arc::new(InMemoryExecutionRegistry::new()),
        source,
        hook,
        Arc::new(Broadcaster::new()),
        Arc::new(DefaultClock),
    )
}

fn request() -> StartExecutionRequest {
    StartExecutionRequest::new(IssueId::new(), "Process issue: engine test")
}

async fn wait_terminal(engine: &TestEngine, id: ExecutionId) -> eyre::Result<Execution> {
    for _ in 0..400 {
        if let Some(execution) = engine.get(id).await? {
            if execution.status().is_terminal() {
                return Ok(execution);
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    bail!("execution never reached a terminal state");
}

async fn wait_running(engine: &TestEngine, id: ExecutionId) -> eyre::Result<()> {
    for _ in 0..400 {
        if let Some(execution) = engine.get(id).await? {
            if execution.status() == ExecutionStatus::Running {
                return Ok(());
            }
            if execution.status().is_terminal() {
                bail!("execution finished before it could be observed running");
            }
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    bail!("execution never started running");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_completes_with_full_progress_and_success_hook() -> eyre::Result<()> {
    let hook = Arc::new(RecordingHook::default());
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(4, Duration::ZERO)),
        Arc::clone(&hook) as Arc<dyn CompletionHook>,
    );

    let started = engine.start(request()).await?;
    ensure!(started.status() == ExecutionStatus::Pending);
    ensure!(!started.auto_started());

    let finished = wait_terminal(&engine, started.id()).await?;
    ensure!(finished.status() == ExecutionStatus::Completed);
    ensure!(finished.progress() == 100);
    ensure!(finished.result().is_some());
    ensure!(finished.completed_at().is_some());

    let messages: Vec<&str> = finished
        .logs()
        .iter()
        .map(|entry| entry.message.as_str())
        .collect();
    ensure!(messages
        == vec![
            "Step 1 completed",
            "Step 2 completed",
            "Step 3 completed",
            "Step 4 completed",
        ]);
    let sequences: Vec<u32> = finished.logs().iter().map(|entry| entry.sequence).collect();
    ensure!(sequences == vec![1, 2, 3, 4]);

    ensure!(hook.calls() == vec![(started.id(), true)]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_step_marks_execution_failed() -> eyre::Result<()> {
    let hook = Arc::new(RecordingHook::default());
    let engine = engine_with(
        Arc::new(FailingSource {
            total: 4,
            fail_at: 3,
        }),
        Arc::clone(&hook) as Arc<dyn CompletionHook>,
    );

    let started = engine.start(request()).await?;
    let finished = wait_terminal(&engine, started.id()).await?;

    ensure!(finished.status() == ExecutionStatus::Failed);
    ensure!(finished.error() == Some("agent process exited with code 1"));
    ensure!(finished.progress() == 50);
    ensure!(finished.result().is_none());
    ensure!(hook.calls() == vec![(started.id(), false)]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_stops_run_without_firing_the_hook() -> eyre::Result<()> {
    let hook = Arc::new(RecordingHook::default());
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(10, Duration::from_millis(50))),
        Arc::clone(&hook) as Arc<dyn CompletionHook>,
    );

    let started = engine.start(request()).await?;
    wait_running(&engine, started.id()).await?;

    let cancelled = engine.cancel(started.id()).await?;
    ensure!(cancelled.status() == ExecutionStatus::Cancelled);
    ensure!(cancelled.completed_at().is_some());

    // The in-flight loop must observe the flag and stop advancing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let settled = engine
        .get(started.id())
        .await?
        .ok_or_else(|| eyre::eyre!("execution disappeared"))?;
    ensure!(settled.status() == ExecutionStatus::Cancelled);
    ensure!(settled.progress() < 100);
    ensure!(hook.calls().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_unknown_execution_returns_not_found() -> eyre::Result<()> {
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(1, Duration::ZERO)),
        Arc::new(RecordingHook::default()),
    );

    let missing = ExecutionId::new();
    let result = engine.cancel(missing).await;
    if !matches!(result, Err(ExecutionEngineError::NotFound(id)) if id == missing) {
        bail!("expected not-found rejection, got {result:?}");
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_terminal_execution_is_rejected() -> eyre::Result<()> {
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(1, Duration::ZERO)),
        Arc::new(RecordingHook::default()),
    );

    let started = engine.start(request()).await?;
    wait_terminal(&engine, started.id()).await?;

    let result = engine.cancel(started.id()).await;
    ensure!(matches!(
        result,
        Err(ExecutionEngineError::Domain(
            ExecutionDomainError::InvalidStateTransition { .. }
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retry_starts_a_fresh_execution_and_leaves_the_original_alone() -> eyre::Result<()> {
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(2, Duration::ZERO)),
        Arc::new(RecordingHook::default()),
    );

    let original = engine.start(request()).await?;
    let original_finished = wait_terminal(&engine, original.id()).await?;

    let retried = engine.retry(original.id()).await?;
    ensure!(retried.id() != original.id());
    ensure!(retried.issue_id() == original.issue_id());
    ensure!(retried.prompt() == original.prompt());
    ensure!(!retried.auto_started());

    let retried_finished = wait_terminal(&engine, retried.id()).await?;
    ensure!(retried_finished.status() == ExecutionStatus::Completed);

    let untouched = engine
        .get(original.id())
        .await?
        .ok_or_else(|| eyre::eyre!("original execution disappeared"))?;
    ensure!(untouched == original_finished);

    let both = engine.list_by_issue(original.issue_id()).await?;
    ensure!(both.len() == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retry_unknown_execution_returns_not_found() -> eyre::Result<()> {
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(1, Duration::ZERO)),
        Arc::new(RecordingHook::default()),
    );

    let missing = ExecutionId::new();
    let result = engine.retry(missing).await;
    if !matches!(result, Err(ExecutionEngineError::NotFound(id)) if id == missing) {
        bail!("expected not-found rejection, got {result:?}");
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_exceeding_the_timeout_fails() -> eyre::Result<()> {
    let hook = Arc::new(RecordingHook::default());
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(3, Duration::from_secs(5))),
        Arc::clone(&hook) as Arc<dyn CompletionHook>,
    )
    .with_run_timeout(Duration::from_millis(50));

    let started = engine.start(request()).await?;
    let finished = wait_terminal(&engine, started.id()).await?;

    ensure!(finished.status() == ExecutionStatus::Failed);
    ensure!(finished.error() == Some("execution timed out"));
    ensure!(hook.calls() == vec![(started.id(), false)]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_rejects_blank_prompt() -> eyre::Result<()> {
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(1, Duration::ZERO)),
        Arc::new(RecordingHook::default()),
    );

    let result = engine
        .start(StartExecutionRequest::new(IssueId::new(), "   "))
        .await;
    ensure!(matches!(
        result,
        Err(ExecutionEngineError::Domain(
            ExecutionDomainError::EmptyPrompt
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn logs_and_result_reads_tolerate_unknown_ids() -> eyre::Result<()> {
    let engine = engine_with(
        Arc::new(FixedScheduleSource::new(1, Duration::ZERO)),
        Arc::new(RecordingHook::default()),
    );

    let missing = ExecutionId::new();
    ensure!(engine.logs(missing).await?.is_empty());
    ensure!(engine.result(missing).await?.is_none());
    ensure!(engine.get(missing).await?.is_none());
    Ok(())
}
