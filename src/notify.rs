// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Out-of-band notifications (registration codes, security alerts).
//!
//! Delivery is best effort everywhere: a failed send is logged and never
//! changes the outcome of the operation that triggered it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notification")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl Notification {
    pub fn registration_code(contact: &str, code: &str) -> Self {
        Self {
            to: contact.to_string(),
            subject: "Your verification code".to_string(),
            body: format!(
                "Your verification code is {code}. It expires in a few minutes. \
                 If you did not request it, ignore this message."
            ),
        }
    }

    pub fn origin_mismatch(contact: &str, issued_to: &str, presented_from: &str) -> Self {
        Self {
            to: contact.to_string(),
            subject: "New sign-in location".to_string(),
            body: format!(
                "Your session issued to {issued_to} was renewed from {presented_from}. \
                 If this was not you, change your password."
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Development sender: logs recipient and subject, drops the body.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            "Notification send stub"
        );
        Ok(())
    }
}

/// Posts `{to, subject, body}` as JSON to a mail relay.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: Url,
    http: Client,
}

impl WebhookNotifier {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Delivery(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { url, http })
    }
}

#[async_trait]
impl NotificationSender for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.url.clone())
            .json(notification)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "relay returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Send without waiting for the result.
///
/// The spawned task logs a failure and exits; the caller continues at once.
pub fn dispatch_detached(sender: Arc<dyn NotificationSender>, notification: Notification) {
    tokio::spawn(async move {
        if let Err(e) = sender.send(&notification).await {
            warn!(
                to = %notification.to,
                subject = %notification.subject,
                error = %e,
                "Notification delivery failed"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingNotifier;

    #[test]
    fn registration_code_body_carries_code() {
        let n = Notification::registration_code("a@x.com", "042917");
        assert_eq!(n.to, "a@x.com");
        assert!(n.body.contains("042917"));
        assert!(!format!("{n:?}").contains("042917"));
    }

    #[test]
    fn origin_mismatch_names_both_addresses() {
        let n = Notification::origin_mismatch("a@x.com", "10.0.0.1", "192.0.2.9");
        assert!(n.body.contains("10.0.0.1"));
        assert!(n.body.contains("192.0.2.9"));
    }

    #[test]
    fn webhook_payload_shape() {
        let json = serde_json::to_value(Notification::registration_code("a@x.com", "1")).unwrap();
        assert_eq!(json["to"], "a@x.com");
        assert!(json["subject"].is_string());
        assert!(json["body"].is_string());
    }

    #[tokio::test]
    async fn detached_dispatch_delivers() {
        let (notifier, mut rx) = RecordingNotifier::new();
        dispatch_detached(Arc::new(notifier), Notification::registration_code("a@x.com", "1"));
        let delivered = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered.to, "a@x.com");
    }

    #[tokio::test]
    async fn detached_dispatch_swallows_failures() {
        let notifier = RecordingNotifier::failing();
        dispatch_detached(Arc::new(notifier), Notification::registration_code("a@x.com", "1"));
        tokio::task::yield_now().await;
    }
}
