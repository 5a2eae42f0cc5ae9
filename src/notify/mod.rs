//! Webhook notification gateway.
//!
//! Turns status-change and execution-lifecycle events into channel messages
//! and posts them to a per-project webhook endpoint. Delivery is
//! fire-and-forget from the automation layer's perspective: the
//! orchestrator logs and swallows failures so they never fail the
//! triggering operation.

mod gateway;
mod http;
mod message;

pub use gateway::{DeliveryError, DeliveryResult, NotificationGateway, WebhookTransport};
pub use http::HttpWebhookTransport;
pub use message::{
    Attachment, AttachmentField, WebhookMessage, format_duration, priority_color, status_color,
};

#[cfg(test)]
mod tests;
