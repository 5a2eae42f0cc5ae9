//! Notification gateway: composes event messages and hands them to a
//! webhook transport.

use crate::execution::domain::Execution;
use crate::notify::message::WebhookMessage;
use crate::tracker::domain::{Issue, IssueStatus, WebhookUrl};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Result type for delivery operations.
pub type DeliveryResult = Result<(), DeliveryError>;

/// Errors returned by webhook transports.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// The endpoint could not be reached.
    #[error("webhook endpoint unreachable: {0}")]
    Unreachable(Arc<dyn std::error::Error + Send + Sync>),

    /// The endpoint answered with a non-success status.
    #[error("webhook endpoint answered {0}")]
    Status(u16),
}

impl DeliveryError {
    /// Wraps a transport error.
    pub fn unreachable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unreachable(Arc::new(err))
    }
}

/// Outbound webhook delivery contract.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Posts a message to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the endpoint is unreachable or
    /// answers with a non-success status.
    async fn deliver(&self, url: &WebhookUrl, message: &WebhookMessage) -> DeliveryResult;
}

/// Formats and delivers notification events.
///
/// Every notify method takes the destination as `Option<&WebhookUrl>`: a
/// project without a configured endpoint skips delivery silently. Delivery
/// failures surface to the caller, which decides whether to swallow them.
pub struct NotificationGateway<T, C>
where
    T: WebhookTransport,
    C: Clock + Send + Sync,
{
    transport: Arc<T>,
    clock: Arc<C>,
}

impl<T, C> Clone for NotificationGateway<T, C>
where
    T: WebhookTransport,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T, C> NotificationGateway<T, C>
where
    T: WebhookTransport,
    C: Clock + Send + Sync,
{
    /// Creates a new gateway.
    #[must_use]
    pub const fn new(transport: Arc<T>, clock: Arc<C>) -> Self {
        Self { transport, clock }
    }

    /// Notifies that an issue moved to another board column.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when delivery to a configured endpoint
    /// fails.
    pub async fn notify_status_changed(
        &self,
        webhook: Option<&WebhookUrl>,
        issue: &Issue,
        old_status: IssueStatus,
        new_status: IssueStatus,
    ) -> DeliveryResult {
        let Some(url) = webhook else {
            debug!(issue = %issue.code(), "no webhook configured, skipping status notification");
            return Ok(());
        };
        let message = WebhookMessage::status_changed(issue, old_status, new_status, &*self.clock);
        self.transport.deliver(url, &message).await
    }

    /// Notifies that an execution started for an issue.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when delivery to a configured endpoint
    /// fails.
    pub async fn notify_execution_started(
        &self,
        webhook: Option<&WebhookUrl>,
        issue: &Issue,
        execution: &Execution,
    ) -> DeliveryResult {
        let Some(url) = webhook else {
            debug!(issue = %issue.code(), "no webhook configured, skipping start notification");
            return Ok(());
        };
        let message = WebhookMessage::execution_started(issue, execution, &*self.clock);
        self.transport.deliver(url, &message).await
    }

    /// Notifies that an execution reached a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when delivery to a configured endpoint
    /// fails.
    pub async fn notify_execution_finished(
        &self,
        webhook: Option<&WebhookUrl>,
        issue: &Issue,
        execution: &Execution,
        success: bool,
    ) -> DeliveryResult {
        let Some(url) = webhook else {
            debug!(issue = %issue.code(), "no webhook configured, skipping finish notification");
            return Ok(());
        };
        let message = WebhookMessage::execution_finished(issue, execution, success, &*self.clock);
        self.transport.deliver(url, &message).await
    }

    /// Notifies that automation moved an issue to review.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when delivery to a configured endpoint
    /// fails.
    pub async fn notify_auto_moved(
        &self,
        webhook: Option<&WebhookUrl>,
        issue: &Issue,
    ) -> DeliveryResult {
        let Some(url) = webhook else {
            debug!(issue = %issue.code(), "no webhook configured, skipping auto-move notification");
            return Ok(());
        };
        let message = WebhookMessage::auto_moved_to_review(issue, &*self.clock);
        self.transport.deliver(url, &message).await
    }
}
