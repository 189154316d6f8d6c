//! "Notify Me" Alexa skill notifications.

use super::Notifier;
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.notifymyecho.com";
const NAME: &str = "notify_me";

/// Webhook that announces messages on an Echo device.
pub struct NotifyMeNotifier {
    client: reqwest::Client,
    access_code: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Notification<'a> {
    notification: &'a str,
    access_code: &'a str,
}

impl NotifyMeNotifier {
    pub fn new(access_code: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(access_code, timeout, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(
        access_code: String,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self> {
        Ok(Self {
            client: crate::http::client(timeout)?,
            access_code,
            base_url,
        })
    }
}

#[async_trait]
impl Notifier for NotifyMeNotifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/v1/NotifyMe", self.base_url))
            .json(&Notification {
                notification: message,
                access_code: &self.access_code,
            })
            .send()
            .await
            .map_err(|e| DdnsError::notification(NAME, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DdnsError::notification(NAME, format!("HTTP {}", status)))
        }
    }
}
