//! Pushover notifications.

use super::Notifier;
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.pushover.net";
const NAME: &str = "pushover";

/// Sends form-encoded messages to a Pushover user.
pub struct PushoverNotifier {
    client: reqwest::Client,
    token: String,
    user_key: String,
    title: String,
    base_url: String,
}

impl PushoverNotifier {
    pub fn new(
        token: String,
        user_key: String,
        title: String,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_base_url(token, user_key, title, timeout, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(
        token: String,
        user_key: String,
        title: String,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self> {
        Ok(Self {
            client: crate::http::client(timeout)?,
            token,
            user_key,
            title,
            base_url,
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/1/messages.json", self.base_url))
            .form(&[
                ("token", self.token.as_str()),
                ("user", self.user_key.as_str()),
                ("title", self.title.as_str()),
                ("message", message),
            ])
            .send()
            .await
            .map_err(|e| DdnsError::notification(NAME, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(DdnsError::notification(
                NAME,
                format!("HTTP {}: {}", status, text.trim()),
            ))
        }
    }
}
