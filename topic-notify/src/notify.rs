//! Notification payloads and the sink they are delivered to.

use crate::config::NotificationConfig;
use async_trait::async_trait;
use pushover_http_client::{Message, Priority};
use std::time::Duration;

/// Title of the startup self-test notification.
pub const TEST_TITLE: &str = "IRC Monitor Test";
/// Body of the startup self-test notification.
pub const TEST_MESSAGE: &str = "✅ Test notification - Pushover is working!";

/// One notification, independent of how it is delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationPayload {
    /// Title line.
    pub title: String,
    /// Body.
    pub message: String,
    /// Optional link shown with the notification.
    pub url: Option<String>,
    /// Label for `url`.
    pub url_title: String,
    /// Delivery priority.
    pub priority: Priority,
    /// Sound name.
    pub sound: String,
}

impl NotificationPayload {
    /// The alert sent when the trigger phrase appears: high priority, persistent sound.
    pub fn alert(config: &NotificationConfig) -> Self {
        Self {
            title: config.title.clone(),
            message: config.message.clone(),
            url: config.url.clone(),
            url_title: config.url_title.clone(),
            priority: Priority::High,
            sound: "persistent".into(),
        }
    }

    /// The self-test notification used to check delivery: normal priority, default sound.
    pub fn test(config: &NotificationConfig) -> Self {
        Self {
            title: TEST_TITLE.into(),
            message: TEST_MESSAGE.into(),
            url: config.url.clone(),
            url_title: config.url_title.clone(),
            priority: Priority::Normal,
            sound: "pushover".into(),
        }
    }

    fn to_message(&self) -> Message {
        Message {
            title: self.title.clone(),
            message: self.message.clone(),
            url_title: self.url.as_ref().map(|_| self.url_title.clone()),
            url: self.url.clone(),
            priority: self.priority,
            sound: self.sound.clone(),
        }
    }
}

/// Delivery failed. The message is for logging only.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

impl From<pushover_http_client::Error> for NotifyError {
    fn from(src: pushover_http_client::Error) -> Self {
        Self(src.to_string())
    }
}

/// Somewhere notifications can be sent.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver `payload`, giving up after `timeout`. Failures are returned, never panicked.
    async fn send(&self, payload: &NotificationPayload, timeout: Duration) -> Result<(), NotifyError>;
}

#[async_trait]
impl NotificationSink for pushover_http_client::Client {
    async fn send(&self, payload: &NotificationPayload, timeout: Duration) -> Result<(), NotifyError> {
        Ok(pushover_http_client::Client::send(self, &payload.to_message(), timeout).await?)
    }
}
