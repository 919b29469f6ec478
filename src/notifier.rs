//! Fire-and-forget student notifications.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(to = %to, subject = %subject, body_len = body.len(), "notification");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Hands notifications to an external mail relay over HTTP.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(&WebhookMessage { to, subject, body })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Sends and swallows any delivery failure; callers have already committed.
pub async fn notify(notifier: &dyn Notifier, to: &str, subject: &str, body: &str) {
    if let Err(err) = notifier.send(to, subject, body).await {
        tracing::warn!(error = %err, to = %to, "notification failed");
    }
}

/// Delivers on a detached task so the caller's response never waits on the
/// relay.
pub fn notify_in_background(
    notifier: Arc<dyn Notifier>,
    to: String,
    subject: String,
    body: String,
) {
    tokio::spawn(async move {
        notify(notifier.as_ref(), &to, &subject, &body).await;
    });
}
