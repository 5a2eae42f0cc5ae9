//! Topic-based realtime event broadcasting.
//!
//! The broadcaster fans state-change events out to currently-subscribed
//! observers. Delivery is best-effort and at-most-once: there is no
//! persistence or replay, so an observer that subscribes after an event was
//! published never sees it. Per topic, events arrive in publication order.

use crate::execution::domain::{ExecutionId, RunReport};
use crate::tracker::domain::{IssueCode, IssueId, IssueStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Broadcast topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Issue-level events visible to every connected client.
    Global,
    /// Progress and terminal events for one execution.
    Execution(ExecutionId),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Execution(id) => write!(f, "execution:{id}"),
        }
    }
}

/// Event payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RealtimeEvent {
    /// A new issue was created.
    #[serde(rename = "issue:created")]
    IssueCreated {
        /// Created issue.
        issue_id: IssueId,
        /// Human-readable code of the created issue.
        code: IssueCode,
    },
    /// An issue's fields changed.
    #[serde(rename = "issue:updated")]
    IssueUpdated {
        /// Updated issue.
        issue_id: IssueId,
    },
    /// An issue was removed.
    #[serde(rename = "issue:deleted")]
    IssueDeleted {
        /// Removed issue.
        issue_id: IssueId,
    },
    /// An issue moved to another board column.
    #[serde(rename = "issue:statusChanged")]
    IssueStatusChanged {
        /// Issue that moved.
        issue_id: IssueId,
        /// New column.
        status: IssueStatus,
        /// Previous column.
        old_status: IssueStatus,
        /// Whether automation moved the issue rather than a user.
        auto_moved: bool,
    },
    /// An issue was assigned.
    #[serde(rename = "issue:assigned")]
    IssueAssigned {
        /// Assigned issue.
        issue_id: IssueId,
        /// New assignee, if any.
        assignee: Option<String>,
    },
    /// An execution advanced.
    #[serde(rename = "execution:progress")]
    ExecutionProgress {
        /// Advancing execution.
        execution_id: ExecutionId,
        /// Progress percentage after the step.
        progress: u8,
        /// Log line emitted by the step, when one was produced.
        log: Option<String>,
    },
    /// An execution finished successfully.
    #[serde(rename = "execution:completed")]
    ExecutionCompleted {
        /// Finished execution.
        execution_id: ExecutionId,
        /// Result payload.
        result: RunReport,
    },
    /// An execution stopped on an internal error.
    #[serde(rename = "execution:failed")]
    ExecutionFailed {
        /// Failed execution.
        execution_id: ExecutionId,
        /// Failure message.
        error: String,
    },
    /// An execution was cancelled by a caller.
    #[serde(rename = "execution:cancelled")]
    ExecutionCancelled {
        /// Cancelled execution.
        execution_id: ExecutionId,
    },
}

/// Handle identifying one subscription on a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An active subscription: the handle for unsubscribing plus the event
/// receiver.
#[derive(Debug)]
pub struct Subscription {
    /// Handle used to unsubscribe.
    pub id: SubscriberId,
    /// Receiving end of the event stream.
    pub receiver: UnboundedReceiver<RealtimeEvent>,
}

#[derive(Debug, Default)]
struct BroadcasterState {
    topics: HashMap<Topic, Vec<(SubscriberId, UnboundedSender<RealtimeEvent>)>>,
    next_id: u64,
}

/// Fan-out hub for realtime events.
#[derive(Debug, Default)]
pub struct Broadcaster {
    state: Mutex<BroadcasterState>,
}

impl Broadcaster {
    /// Creates a broadcaster with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a topic, returning the subscription handle and stream.
    pub async fn subscribe(&self, topic: Topic) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = SubscriberId(state.next_id);
        state.topics.entry(topic).or_default().push((id, sender));
        Subscription { id, receiver }
    }

    /// Removes a subscription from a topic.
    ///
    /// Unknown topic or subscriber handles are ignored.
    pub async fn unsubscribe(&self, topic: Topic, id: SubscriberId) {
        let mut state = self.state.lock().await;
        if let Some(subscribers) = state.topics.get_mut(&topic) {
            subscribers.retain(|(subscriber_id, _)| *subscriber_id != id);
            if subscribers.is_empty() {
                state.topics.remove(&topic);
            }
        }
    }

    /// Publishes an event to every current subscriber of a topic.
    ///
    /// Subscribers whose receivers have been dropped are pruned. Returns the
    /// number of subscribers the event was delivered to.
    pub async fn publish(&self, topic: Topic, event: &RealtimeEvent) -> usize {
        let mut state = self.state.lock().await;
        let Some(subscribers) = state.topics.get_mut(&topic) else {
            return 0;
        };

        subscribers.retain(|(_, sender)| sender.send(event.clone()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            state.topics.remove(&topic);
        }
        delivered
    }
}
