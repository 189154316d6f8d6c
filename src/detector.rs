//! Public IP detection.

use crate::error::{DdnsError, Result};
use std::net::IpAddr;
use std::time::Duration;

/// Fetches the caller's public IP from a single plain-text echo endpoint.
pub struct IpDetector {
    client: reqwest::Client,
    source: String,
}

impl IpDetector {
    /// Create a detector for `source` with a bounded request timeout.
    pub fn new(source: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: crate::http::client(timeout)?,
            source: source.into(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fetch the current public IP.
    ///
    /// Trailing whitespace is stripped, otherwise the body is returned
    /// verbatim. A body that is not an IP literal is rejected.
    pub async fn fetch(&self) -> Result<String> {
        let response = self.client.get(&self.source).send().await?;

        if !response.status().is_success() {
            return Err(DdnsError::IpDetection(format!(
                "HTTP {} from {}",
                response.status(),
                self.source
            )));
        }

        let text = response.text().await?;
        let ip = text.trim_end();

        if ip.parse::<IpAddr>().is_err() {
            return Err(DdnsError::IpDetection(format!(
                "Invalid IP response from {}: {:?}",
                self.source, ip
            )));
        }

        tracing::debug!("Detected IP {} from {}", ip, self.source);
        Ok(ip.to_string())
    }
}
