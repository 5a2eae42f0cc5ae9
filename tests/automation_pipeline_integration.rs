//! Behavioural integration tests for the status-change automation pipeline.
//!
//! These tests wire the full stack together with in-memory adapters: the
//! lifecycle service, the status-transition orchestrator, the execution
//! engine with a fast fixed schedule, the completion handler, and a
//! recording webhook transport standing in for the channel endpoint.

use async_trait::async_trait;
use eyre::{OptionExt, bail, ensure};
use mockable::DefaultClock;
use niemeyer::automation::{CompletionHandler, StatusTransitionOrchestrator};
use niemeyer::execution::adapters::{FixedScheduleSource, InMemoryExecutionRegistry};
use niemeyer::execution::domain::ExecutionStatus;
use niemeyer::execution::ExecutionEngine;
use niemeyer::notify::{
    DeliveryError, DeliveryResult, NotificationGateway, WebhookMessage, WebhookTransport,
};
use niemeyer::realtime::{Broadcaster, RealtimeEvent, Subscription, Topic};
use niemeyer::tracker::adapters::memory::{InMemoryIssueRepository, InMemoryProjectRepository};
use niemeyer::tracker::domain::{
    AutomationConfig, Issue, IssueStatus, IssueType, Project, ProjectKey, WebhookUrl,
};
use niemeyer::tracker::ports::StatusChangeObserver;
use niemeyer::tracker::services::{
    CreateIssueRequest, IssueLifecycleService, IssueMutationLocks,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that records every delivered message in order.
#[derive(Debug, Default)]
struct RecordingTransport {
    sent: Mutex<Vec<WebhookMessage>>,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<WebhookMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn deliver(&self, _url: &WebhookUrl, message: &WebhookMessage) -> DeliveryResult {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

/// Transport whose endpoint always answers with a server error.
#[derive(Debug, Default)]
struct FailingTransport;

#[async_trait]
impl WebhookTransport for FailingTransport {
    async fn deliver(&self, _url: &WebhookUrl, _message: &WebhookMessage) -> DeliveryResult {
        Err(DeliveryError::Status(500))
    }
}

type TestService =
    IssueLifecycleService<InMemoryIssueRepository, InMemoryProjectRepository, DefaultClock>;
type TestEngine = ExecutionEngine<InMemoryExecutionRegistry, DefaultClock>;

struct Harness<T: WebhookTransport + 'static> {
    service: TestService,
    engine: TestEngine,
    transport: Arc<T>,
    broadcaster: Arc<Broadcaster>,
}

fn build_harness<T>(transport: T, source: FixedScheduleSource) -> Harness<T>
where
    T: WebhookTransport + 'static,
{
    let issues = Arc::new(InMemoryIssueRepository::new());
    let projects = Arc::new(InMemoryProjectRepository::new());
    let clock = Arc::new(DefaultClock);
    let broadcaster = Arc::new(Broadcaster::new());
    let shared_transport = Arc::new(transport);
    let gateway = NotificationGateway::new(Arc::clone(&shared_transport), Arc::clone(&clock));
    let locks = IssueMutationLocks::new();

    let handler = CompletionHandler::new(
        Arc::clone(&issues),
        Arc::clone(&projects),
        gateway.clone(),
        Arc::clone(&broadcaster),
        Arc::clone(&clock),
        locks.clone(),
    );
    let engine = ExecutionEngine::new(
        Arc::new(InMemoryExecutionRegistry::new()),
        Arc::new(source),
        Arc::new(handler),
        Arc::clone(&broadcaster),
        Arc::clone(&clock),
    );
    let orchestrator = StatusTransitionOrchestrator::new(
        Arc::clone(&projects),
        gateway,
        engine.clone(),
    );
    let service = IssueLifecycleService::new(issues, projects, clock, Arc::clone(&broadcaster))
        .with_locks(locks)
        .with_observer(Arc::new(orchestrator) as Arc<dyn StatusChangeObserver>);

    Harness {
        service,
        engine,
        transport: shared_transport,
        broadcaster,
    }
}

fn full_automation() -> eyre::Result<AutomationConfig> {
    let url = WebhookUrl::new("https://hooks.example.com/services/T000/B000/XXX")?;
    Ok(AutomationConfig::disabled()
        .with_auto_execute(true)
        .with_auto_move_to_review(true)
        .with_webhook(url))
}

async fn seed_bug_issue(
    service: &TestService,
    automation: AutomationConfig,
) -> eyre::Result<(Project, Issue)> {
    let key = ProjectKey::new("BUG")?;
    let project = service
        .create_project(key, "Bug squashing", automation)
        .await?;
    let issue = service
        .create_issue(
            CreateIssueRequest::new(project.id(), "Login button not responding", IssueType::Bug)
                .with_description("Clicking login does nothing on Safari"),
        )
        .await?;
    Ok((project, issue))
}

async fn wait_for_status(
    service: &TestService,
    issue: &Issue,
    expected: IssueStatus,
) -> eyre::Result<Issue> {
    for _ in 0..500 {
        if let Some(current) = service.get_issue(issue.id()).await? {
            if current.status() == expected {
                return Ok(current);
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    bail!("issue never reached {expected}");
}

async fn wait_for_message_count(
    transport: &RecordingTransport,
    expected: usize,
) -> eyre::Result<Vec<WebhookMessage>> {
    for _ in 0..500 {
        let sent = transport.sent();
        if sent.len() >= expected {
            return Ok(sent);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    bail!(
        "expected {expected} notifications, got {}",
        transport.sent().len()
    );
}

fn drain(subscription: &mut Subscription) -> Vec<RealtimeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = subscription.receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(flavor = "multi_thread")]
async fn moving_a_bug_to_in_progress_runs_the_full_pipeline() -> eyre::Result<()> {
    // A nonzero step delay keeps the start notification ahead of the
    // spawned run's terminal notifications.
    let harness = build_harness(
        RecordingTransport::default(),
        FixedScheduleSource::new(3, Duration::from_millis(20)),
    );
    let (_, issue) = seed_bug_issue(&harness.service, full_automation()?).await?;
    ensure!(issue.code().as_str() == "BUG-001");

    let mut subscription = harness.broadcaster.subscribe(Topic::Global).await;
    harness
        .service
        .update_status(issue.id(), IssueStatus::InProgress)
        .await?;

    let settled = wait_for_status(&harness.service, &issue, IssueStatus::Review).await?;
    ensure!(settled.status() == IssueStatus::Review);

    // Exactly one execution, finished successfully at full progress.
    let executions = harness.engine.list_by_issue(issue.id()).await?;
    ensure!(executions.len() == 1);
    let execution = executions.first().ok_or_eyre("missing execution")?;
    ensure!(execution.status() == ExecutionStatus::Completed);
    ensure!(execution.progress() == 100);
    ensure!(execution.auto_started());
    ensure!(execution.prompt() == "Process issue: Login button not responding");

    // Four notifications, in pipeline order.
    let expected = [
        "moved from *TODO* to *IN_PROGRESS*",
        "Agent started processing task BUG-001",
        "Agent completed successfully for task BUG-001",
        "Task BUG-001 automatically moved to REVIEW",
    ];
    let sent = wait_for_message_count(&harness.transport, expected.len()).await?;
    ensure!(sent.len() == expected.len());
    for (message, needle) in sent.iter().zip(expected) {
        ensure!(
            message.text.contains(needle),
            "unexpected notification: {}",
            message.text
        );
    }

    // Two global status-change events: the manual move and the automatic one.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let status_events: Vec<RealtimeEvent> = drain(&mut subscription)
        .into_iter()
        .filter(|event| matches!(event, RealtimeEvent::IssueStatusChanged { .. }))
        .collect();
    ensure!(
        status_events
            == vec![
                RealtimeEvent::IssueStatusChanged {
                    issue_id: issue.id(),
                    status: IssueStatus::InProgress,
                    old_status: IssueStatus::Todo,
                    auto_moved: false,
                },
                RealtimeEvent::IssueStatusChanged {
                    issue_id: issue.id(),
                    status: IssueStatus::Review,
                    old_status: IssueStatus::InProgress,
                    auto_moved: true,
                },
            ]
    );

    // The automatic move must not have started a second run.
    tokio::time::sleep(Duration::from_millis(100)).await;
    ensure!(harness.engine.list_by_issue(issue.id()).await?.len() == 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn delivery_failures_never_break_the_pipeline() -> eyre::Result<()> {
    let harness = build_harness(
        FailingTransport,
        FixedScheduleSource::new(3, Duration::ZERO),
    );
    let (_, issue) = seed_bug_issue(&harness.service, full_automation()?).await?;

    harness
        .service
        .update_status(issue.id(), IssueStatus::InProgress)
        .await?;

    let settled = wait_for_status(&harness.service, &issue, IssueStatus::Review).await?;
    ensure!(settled.status() == IssueStatus::Review);

    let executions = harness.engine.list_by_issue(issue.id()).await?;
    ensure!(executions.len() == 1);
    let execution = executions.first().ok_or_eyre("missing execution")?;
    ensure!(execution.status() == ExecutionStatus::Completed);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn auto_execute_disabled_only_notifies() -> eyre::Result<()> {
    let url = WebhookUrl::new("https://hooks.example.com/services/T000/B000/XXX")?;
    let automation = AutomationConfig::disabled()
        .with_auto_move_to_review(true)
        .with_webhook(url);
    let harness = build_harness(
        RecordingTransport::default(),
        FixedScheduleSource::new(3, Duration::ZERO),
    );
    let (_, issue) = seed_bug_issue(&harness.service, automation).await?;

    harness
        .service
        .update_status(issue.id(), IssueStatus::InProgress)
        .await?;

    let sent = wait_for_message_count(&harness.transport, 1).await?;
    let only = sent.first().ok_or_eyre("missing status notification")?;
    ensure!(only.text.contains("moved from *TODO* to *IN_PROGRESS*"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    ensure!(harness.engine.list_by_issue(issue.id()).await?.is_empty());
    let current = harness
        .service
        .get_issue(issue.id())
        .await?
        .ok_or_eyre("issue should exist")?;
    ensure!(current.status() == IssueStatus::InProgress);
    ensure!(harness.transport.sent().len() == 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn auto_move_disabled_leaves_the_issue_in_progress() -> eyre::Result<()> {
    let url = WebhookUrl::new("https://hooks.example.com/services/T000/B000/XXX")?;
    let automation = AutomationConfig::disabled()
        .with_auto_execute(true)
        .with_webhook(url);
    let harness = build_harness(
        RecordingTransport::default(),
        FixedScheduleSource::new(3, Duration::from_millis(20)),
    );
    let (_, issue) = seed_bug_issue(&harness.service, automation).await?;

    harness
        .service
        .update_status(issue.id(), IssueStatus::InProgress)
        .await?;

    let expected = [
        "moved from *TODO* to *IN_PROGRESS*",
        "Agent started processing",
        "Agent completed successfully",
    ];
    let sent = wait_for_message_count(&harness.transport, expected.len()).await?;
    for (message, needle) in sent.iter().zip(expected) {
        ensure!(
            message.text.contains(needle),
            "unexpected notification: {}",
            message.text
        );
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    let current = harness
        .service
        .get_issue(issue.id())
        .await?
        .ok_or_eyre("issue should exist")?;
    ensure!(current.status() == IssueStatus::InProgress);
    ensure!(harness.transport.sent().len() == 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn issue_moved_away_during_the_run_is_not_auto_moved() -> eyre::Result<()> {
    let harness = build_harness(
        RecordingTransport::default(),
        FixedScheduleSource::new(4, Duration::from_millis(50)),
    );
    let (_, issue) = seed_bug_issue(&harness.service, full_automation()?).await?;

    harness
        .service
        .update_status(issue.id(), IssueStatus::InProgress)
        .await?;

    // Wait for the run to be in flight, then pull the issue off the board.
    for _ in 0..500 {
        let executions = harness.engine.list_by_issue(issue.id()).await?;
        if executions
            .first()
            .is_some_and(|execution| execution.status() == ExecutionStatus::Running)
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    harness
        .service
        .update_status(issue.id(), IssueStatus::Blocked)
        .await?;

    // Let the run finish.
    for _ in 0..500 {
        let executions = harness.engine.list_by_issue(issue.id()).await?;
        if executions
            .first()
            .is_some_and(|execution| execution.status().is_terminal())
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let current = harness
        .service
        .get_issue(issue.id())
        .await?
        .ok_or_eyre("issue should exist")?;
    ensure!(current.status() == IssueStatus::Blocked);

    let auto_move_messages: Vec<WebhookMessage> = harness
        .transport
        .sent()
        .into_iter()
        .filter(|message| message.text.contains("automatically moved to REVIEW"))
        .collect();
    ensure!(auto_move_messages.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn project_without_webhook_runs_automation_silently() -> eyre::Result<()> {
    let automation = AutomationConfig::disabled()
        .with_auto_execute(true)
        .with_auto_move_to_review(true);
    let harness = build_harness(
        RecordingTransport::default(),
        FixedScheduleSource::new(3, Duration::ZERO),
    );
    let (_, issue) = seed_bug_issue(&harness.service, automation).await?;

    harness
        .service
        .update_status(issue.id(), IssueStatus::InProgress)
        .await?;

    let settled = wait_for_status(&harness.service, &issue, IssueStatus::Review).await?;
    ensure!(settled.status() == IssueStatus::Review);
    ensure!(harness.transport.sent().is_empty());
    Ok(())
}
