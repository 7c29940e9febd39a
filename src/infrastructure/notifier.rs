use std::time::Duration;

use crate::domain::errors::DomainError;
use crate::domain::notification::{Notification, NotificationTarget};
use crate::domain::ports::NotificationSink;

/// Writes notifications to the application log. Used when no push gateway
/// is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        let target = match &notification.target {
            NotificationTarget::Topic(topic) => format!("topic:{topic}"),
            NotificationTarget::Device(_) => "device".to_string(),
        };
        log::info!(
            "Notification to {}: {} - {} {:?}",
            target,
            notification.title,
            notification.body,
            notification.data
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a push gateway.
#[derive(Debug, Clone)]
pub struct WebhookNotificationSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotificationSink {
    pub fn new(url: impl Into<String>) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DomainError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl NotificationSink for WebhookNotificationSink {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        self.client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| DomainError::Internal(format!("notification webhook: {e}")))?;
        Ok(())
    }
}

/// Sink chosen at startup from configuration.
#[derive(Debug, Clone)]
pub enum Notifier {
    Log(LogNotificationSink),
    Webhook(WebhookNotificationSink),
}

impl Notifier {
    pub fn from_webhook_url(url: Option<&str>) -> Result<Self, DomainError> {
        match url {
            Some(url) => Ok(Notifier::Webhook(WebhookNotificationSink::new(url)?)),
            None => Ok(Notifier::Log(LogNotificationSink)),
        }
    }
}

impl NotificationSink for Notifier {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        match self {
            Notifier::Log(sink) => sink.send(notification).await,
            Notifier::Webhook(sink) => sink.send(notification).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        let sink = Notifier::from_webhook_url(None).expect("sink");
        assert!(matches!(sink, Notifier::Log(_)));
        let note = Notification::to_topic("admin_notifications", "New order", "body")
            .with("order_id", "42");
        assert!(sink.send(&note).await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_webhook_is_an_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let sink = Notifier::from_webhook_url(Some("http://127.0.0.1:9/push")).expect("sink");
        let note = Notification::to_device("token", "Order update", "body");
        let err = sink.send(&note).await.expect_err("connection refused");
        assert!(matches!(err, DomainError::Internal(_)));
    }
}
