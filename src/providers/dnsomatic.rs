//! DNS-O-Matic provider (dyndns2 update protocol).

use super::{DnsProvider, Record, UpdateOutcome};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://updates.dnsomatic.com";
const NAME: &str = "dnsomatic";

/// Optional dyndns2 flags sent with every update. `NOCHG` leaves them alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsOMaticFlags {
    pub wildcard: String,
    pub mx: String,
    pub backup_mx: String,
}

impl Default for DnsOMaticFlags {
    fn default() -> Self {
        Self {
            wildcard: "NOCHG".to_string(),
            mx: "NOCHG".to_string(),
            backup_mx: "NOCHG".to_string(),
        }
    }
}

/// DNS-O-Matic provider. Records are addressed by hostname, so nothing needs
/// resolving up front.
pub struct DnsOMaticProvider {
    client: reqwest::Client,
    username: String,
    password: String,
    flags: DnsOMaticFlags,
    base_url: String,
}

impl DnsOMaticProvider {
    /// Create a new DNS-O-Matic provider.
    pub fn new(
        username: String,
        password: String,
        flags: DnsOMaticFlags,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_base_url(
            username,
            password,
            flags,
            timeout,
            DEFAULT_BASE_URL.to_string(),
        )
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(
        username: String,
        password: String,
        flags: DnsOMaticFlags,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self> {
        Ok(Self {
            client: crate::http::client(timeout)?,
            username,
            password,
            flags,
            base_url,
        })
    }
}

/// `good <ip>` and `nochg <ip>` are the only success answers.
fn is_success_answer(body: &str) -> bool {
    matches!(
        body.split_whitespace().next(),
        Some("good") | Some("nochg")
    )
}

#[async_trait]
impl DnsProvider for DnsOMaticProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn resolve_domain(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn resolve_record(&self, name: &str, _domain: &str) -> Result<String> {
        Ok(name.to_string())
    }

    async fn apply_update(&self, record: &Record, ip: &str) -> Result<UpdateOutcome> {
        let hostname = record.id.as_deref().unwrap_or(&record.name);

        let response = self
            .client
            .get(format!("{}/nic/update", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .query(&[
                ("hostname", hostname),
                ("myip", ip),
                ("wildcard", self.flags.wildcard.as_str()),
                ("mx", self.flags.mx.as_str()),
                ("backmx", self.flags.backup_mx.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DdnsError::update_failed(NAME, &record.name, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DdnsError::update_failed(NAME, &record.name, e))?;
        let answer = text.trim();

        tracing::info!("DNS-O-Matic response for {}: {}", hostname, answer);

        if status.is_success() && is_success_answer(answer) {
            Ok(UpdateOutcome::new(NAME, record, ip, answer))
        } else {
            Err(DdnsError::update_failed(
                NAME,
                &record.name,
                format!("HTTP {}: {}", status, answer),
            ))
        }
    }
}
