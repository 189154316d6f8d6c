//! Pushbullet notifications.

use super::Notifier;
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.pushbullet.com";
const NAME: &str = "pushbullet";

/// Pushes a note to every device on a Pushbullet account.
pub struct PushbulletNotifier {
    client: reqwest::Client,
    api_key: String,
    title: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct Push<'a> {
    #[serde(rename = "type")]
    push_type: &'a str,
    title: &'a str,
    body: &'a str,
}

impl PushbulletNotifier {
    pub fn new(api_key: String, title: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, title, timeout, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(
        api_key: String,
        title: String,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self> {
        Ok(Self {
            client: crate::http::client(timeout)?,
            api_key,
            title,
            base_url,
        })
    }
}

#[async_trait]
impl Notifier for PushbulletNotifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/v2/pushes", self.base_url))
            .header("Access-Token", &self.api_key)
            .json(&Push {
                push_type: "note",
                title: &self.title,
                body: message,
            })
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
