use crate::error::NotifyError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Best-effort delivery of a short message to the operator
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message. Failures are logged here and never reach the caller.
    async fn send(&self, title: &str, body: &str, tag: &str);
}

/// Publishes to an ntfy topic
#[derive(Clone)]
pub struct NtfyNotifier {
    server: String,
    topic: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct NtfyMessage<'a> {
    topic: &'a str,
    title: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<&'a str>,
}

impl NtfyNotifier {
    pub fn new(server: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            server: server.into().trim_end_matches('/').to_string(),
            topic: topic.into(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Publish once, reporting the outcome
    pub async fn try_send(&self, title: &str, body: &str, tag: &str) -> Result<(), NotifyError> {
        let payload = NtfyMessage {
            topic: &self.topic,
            title,
            message: body,
            tags: if tag.is_empty() { Vec::new() } else { vec![tag] },
        };

        let response = self
            .client
            .post(&self.server)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, title: &str, body: &str, tag: &str) {
        match self.try_send(title, body, tag).await {
            Ok(()) => debug!("Notification sent: {}", title),
            Err(e) => warn!("Error sending notification {:?}: {}", title, e),
        }
    }
}
