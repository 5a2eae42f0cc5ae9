//! Webhook message model and per-event composers.
//!
//! The wire shape matches the Slack incoming-webhook payload: a top-level
//! `text` plus colour-coded attachments carrying short field grids.

use crate::execution::domain::Execution;
use crate::tracker::domain::{Issue, IssuePriority, IssueStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Maximum characters of a failure message forwarded to the channel.
const ERROR_EXCERPT_LEN: usize = 200;

/// One short field rendered inside an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    /// Field label.
    pub title: String,
    /// Field value.
    pub value: String,
    /// Whether the field may share a row with another.
    pub short: bool,
}

impl AttachmentField {
    fn short(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: true,
        }
    }

    fn wide(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: false,
        }
    }
}

/// Colour-coded attachment block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Sidebar colour as `#RRGGBB`.
    pub color: String,
    /// Attachment title.
    pub title: String,
    /// Optional body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Field grid.
    pub fields: Vec<AttachmentField>,
    /// Footer label.
    pub footer: String,
    /// Unix timestamp in seconds.
    pub ts: i64,
}

/// Outbound webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    /// Headline text.
    pub text: String,
    /// Attachment blocks.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Sidebar colour for a board column.
#[must_use]
pub const fn status_color(status: IssueStatus) -> &'static str {
    match status {
        IssueStatus::Todo => "#9E9E9E",
        IssueStatus::InProgress => "#2196F3",
        IssueStatus::Review => "#FF9800",
        IssueStatus::Testing => "#9C27B0",
        IssueStatus::Done => "#4CAF50",
        IssueStatus::Blocked => "#F44336",
    }
}

/// Sidebar colour for an issue priority.
#[must_use]
pub const fn priority_color(priority: IssuePriority) -> &'static str {
    match priority {
        IssuePriority::Critical => "#F44336",
        IssuePriority::High => "#FF9800",
        IssuePriority::Medium => "#FFC107",
        IssuePriority::Low => "#4CAF50",
        IssuePriority::Trivial => "#9E9E9E",
    }
}

/// Renders a duration between two timestamps as `12s` or `1m 23s`.
#[must_use]
pub fn format_duration(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> String {
    let total_seconds = completed_at
        .signed_duration_since(started_at)
        .num_seconds()
        .max(0);
    let minutes = total_seconds.div_euclid(60);
    let seconds = total_seconds.rem_euclid(60);
    if minutes == 0 {
        format!("{seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

fn unix_ts(clock: &impl Clock) -> i64 {
    clock.utc().timestamp()
}

impl WebhookMessage {
    /// Composes the status-change notification.
    #[must_use]
    pub fn status_changed(
        issue: &Issue,
        old_status: IssueStatus,
        new_status: IssueStatus,
        clock: &impl Clock,
    ) -> Self {
        Self {
            text: format!(
                "Task {} moved from *{old_status}* to *{new_status}*",
                issue.code()
            ),
            attachments: vec![Attachment {
                color: status_color(new_status).to_owned(),
                title: issue.title().to_owned(),
                text: issue.description().map(str::to_owned),
                fields: vec![
                    AttachmentField::short("Priority", issue.priority().as_str()),
                    AttachmentField::short("Type", issue.issue_type().as_str()),
                    AttachmentField::short("Status", new_status.as_str()),
                    AttachmentField::short("Previous Status", old_status.as_str()),
                ],
                footer: "Niemeyer".to_owned(),
                ts: unix_ts(clock),
            }],
        }
    }

    /// Composes the execution-started notification.
    #[must_use]
    pub fn execution_started(issue: &Issue, execution: &Execution, clock: &impl Clock) -> Self {
        Self {
            text: format!("🤖 Agent started processing task {}", issue.code()),
            attachments: vec![Attachment {
                color: status_color(IssueStatus::InProgress).to_owned(),
                title: issue.title().to_owned(),
                text: issue.description().map(str::to_owned),
                fields: vec![
                    AttachmentField::short("Execution ID", execution.id().to_string()),
                    AttachmentField::short("Priority", issue.priority().as_str()),
                    AttachmentField::short("Type", issue.issue_type().as_str()),
                ],
                footer: "Niemeyer - Agent Execution".to_owned(),
                ts: unix_ts(clock),
            }],
        }
    }

    /// Composes the execution-finished notification.
    ///
    /// On success the field grid carries the duration plus files-modified
    /// and tests-run counts; on failure it carries the duration and a
    /// truncated error excerpt.
    #[must_use]
    pub fn execution_finished(
        issue: &Issue,
        execution: &Execution,
        success: bool,
        clock: &impl Clock,
    ) -> Self {
        let (emoji, verdict, color) = if success {
            ("✅", "completed successfully", "#4CAF50")
        } else {
            ("❌", "failed", "#F44336")
        };

        let duration = execution
            .completed_at()
            .map_or_else(String::new, |end| format_duration(execution.started_at(), end));
        let mut fields = vec![
            AttachmentField::short("Execution ID", execution.id().to_string()),
            AttachmentField::short("Duration", duration),
        ];

        if success {
            if let Some(report) = execution.result() {
                fields.push(AttachmentField::short(
                    "Files Modified",
                    report.files_modified.len().to_string(),
                ));
                fields.push(AttachmentField::short(
                    "Tests Run",
                    report.tests_run.to_string(),
                ));
            }
        } else if let Some(error) = execution.error() {
            let excerpt: String = error.chars().take(ERROR_EXCERPT_LEN).collect();
            fields.push(AttachmentField::wide("Error", excerpt));
        }

        Self {
            text: format!("{emoji} Agent {verdict} for task {}", issue.code()),
            attachments: vec![Attachment {
                color: color.to_owned(),
                title: issue.title().to_owned(),
                text: None,
                fields,
                footer: "Niemeyer - Agent Execution".to_owned(),
                ts: unix_ts(clock),
            }],
        }
    }

    /// Composes the auto-moved-to-review notification.
    #[must_use]
    pub fn auto_moved_to_review(issue: &Issue, clock: &impl Clock) -> Self {
        Self {
            text: format!("🔄 Task {} automatically moved to REVIEW", issue.code()),
            attachments: vec![Attachment {
                color: status_color(IssueStatus::Review).to_owned(),
                title: issue.title().to_owned(),
                text: None,
                fields: vec![
                    AttachmentField::short("Status", IssueStatus::Review.as_str()),
                    AttachmentField::short("Previous Status", IssueStatus::InProgress.as_str()),
                ],
                footer: "Niemeyer - Agent Execution".to_owned(),
                ts: unix_ts(clock),
            }],
        }
    }
}
