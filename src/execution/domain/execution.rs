//! Execution aggregate root and its lifecycle state machine.

use super::{ExecutionDomainError, ExecutionId, JobId, ParseExecutionStatusError};
use crate::tracker::domain::IssueId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution lifecycle state.
///
/// The lifecycle is `pending -> running -> {completed, failed, cancelled}`.
/// All three terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Allocated but not yet running.
    Pending,
    /// Work in flight.
    Running,
    /// Finished successfully.
    Completed,
    /// Stopped by an internal error.
    Failed,
    /// Stopped by an explicit caller request.
    Cancelled,
}

impl ExecutionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this state permits a transition to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }

    /// Whether this state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl TryFrom<&str> for ExecutionStatus {
    type Error = ParseExecutionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseExecutionStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only execution log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position of the entry in emission order, starting at 1.
    pub sequence: u32,
    /// Log line text.
    pub message: String,
    /// Emission timestamp.
    pub logged_at: DateTime<Utc>,
}

/// Result payload attached to a completed execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Paths the run modified.
    pub files_modified: Vec<String>,
    /// Number of tests the run executed.
    pub tests_run: u32,
    /// Test coverage percentage, when measured.
    pub coverage: Option<u8>,
}

/// Execution aggregate root.
///
/// Invariants upheld by the mutators:
///
/// - `progress` is monotonically non-decreasing and equals 100 iff the
///   status is [`ExecutionStatus::Completed`]
/// - `completed_at` is set iff the status is terminal
/// - logs are append-only, ordered by emission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    id: ExecutionId,
    job_id: JobId,
    issue_id: IssueId,
    prompt: String,
    auto_started: bool,
    status: ExecutionStatus,
    progress: u8,
    logs: Vec<LogEntry>,
    result: Option<RunReport>,
    error: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Execution {
    /// Allocates a new pending execution for an issue.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::EmptyPrompt`] when the prompt is
    /// empty after trimming.
    pub fn new(
        issue_id: IssueId,
        prompt: impl Into<String>,
        auto_started: bool,
        clock: &impl Clock,
    ) -> Result<Self, ExecutionDomainError> {
        let normalized_prompt = prompt.into().trim().to_owned();
        if normalized_prompt.is_empty() {
            return Err(ExecutionDomainError::EmptyPrompt);
        }

        Ok(Self {
            id: ExecutionId::new(),
            job_id: JobId::new(),
            issue_id,
            prompt: normalized_prompt,
            auto_started,
            status: ExecutionStatus::Pending,
            progress: 0,
            logs: Vec::new(),
            result: None,
            error: None,
            started_at: clock.utc(),
            completed_at: None,
        })
    }

    /// Returns the execution identifier.
    #[must_use]
    pub const fn id(&self) -> ExecutionId {
        self.id
    }

    /// Returns the correlated job identifier.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Returns the owning issue identifier.
    #[must_use]
    pub const fn issue_id(&self) -> IssueId {
        self.issue_id
    }

    /// Returns the prompt the run was started with.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Whether the run was started by automation rather than a direct call.
    #[must_use]
    pub const fn auto_started(&self) -> bool {
        self.auto_started
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Returns the recorded progress percentage.
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    /// Returns the log entries in emission order.
    #[must_use]
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Returns the result payload, present only once completed.
    #[must_use]
    pub const fn result(&self) -> Option<&RunReport> {
        self.result.as_ref()
    }

    /// Returns the failure message, present only once failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the completion timestamp, set once terminal.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Transitions `pending -> running`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::InvalidStateTransition`] from any
    /// other state.
    pub fn begin(&mut self) -> Result<(), ExecutionDomainError> {
        self.transition_to(ExecutionStatus::Running)
    }

    /// Records an intermediate progress step with one log line.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::InvalidStateTransition`] unless
    /// running, [`ExecutionDomainError::ProgressOutOfRange`] for values
    /// outside 1-99, and [`ExecutionDomainError::ProgressNotMonotonic`] when
    /// the value would move backwards.
    pub fn record_progress(
        &mut self,
        progress: u8,
        log: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ExecutionDomainError> {
        if self.status != ExecutionStatus::Running {
            return Err(ExecutionDomainError::InvalidStateTransition {
                execution_id: self.id,
                from: self.status,
                to: ExecutionStatus::Running,
            });
        }
        if progress == 0 || progress >= 100 {
            return Err(ExecutionDomainError::ProgressOutOfRange(progress));
        }
        if progress < self.progress {
            return Err(ExecutionDomainError::ProgressNotMonotonic {
                execution_id: self.id,
                from: self.progress,
                to: progress,
            });
        }

        self.progress = progress;
        self.append_log(log, clock);
        Ok(())
    }

    /// Transitions `running -> completed`, attaching the result payload and
    /// a final log line, and raising progress to 100.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::InvalidStateTransition`] from any
    /// state other than running.
    pub fn complete(
        &mut self,
        report: RunReport,
        final_log: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ExecutionDomainError> {
        self.transition_to(ExecutionStatus::Completed)?;
        self.progress = 100;
        self.append_log(final_log, clock);
        self.result = Some(report);
        self.completed_at = Some(clock.utc());
        Ok(())
    }

    /// Transitions `running -> failed`, recording the failure message.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::InvalidStateTransition`] from any
    /// state other than running.
    pub fn fail(
        &mut self,
        error: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ExecutionDomainError> {
        self.transition_to(ExecutionStatus::Failed)?;
        self.error = Some(error.into());
        self.completed_at = Some(clock.utc());
        Ok(())
    }

    /// Transitions `running -> cancelled`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionDomainError::InvalidStateTransition`] from any
    /// state other than running; terminal states stay untouched.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), ExecutionDomainError> {
        self.transition_to(ExecutionStatus::Cancelled)?;
        self.completed_at = Some(clock.utc());
        Ok(())
    }

    /// Validated lifecycle transition.
    fn transition_to(&mut self, target: ExecutionStatus) -> Result<(), ExecutionDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(ExecutionDomainError::InvalidStateTransition {
                execution_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    /// Appends one log line with the next sequence number.
    fn append_log(&mut self, message: impl Into<String>, clock: &impl Clock) {
        let sequence = u32::try_from(self.logs.len()).unwrap_or(u32::MAX).saturating_add(1);
        self.logs.push(LogEntry {
            sequence,
            message: message.into(),
            logged_at: clock.utc(),
        });
    }
}
