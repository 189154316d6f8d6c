//! Cloudflare DNS provider.

use super::{qualify, record_type, DnsProvider, Record, UpdateOutcome};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com";
const NAME: &str = "cloudflare";

/// Cloudflare provider, authenticated with a static API token.
pub struct CloudflareProvider {
    client: reqwest::Client,
    api_token: String,
    zone_id: String,
    ttl: u32,
    proxied: bool,
    base_url: String,
    /// Zone name, known once `resolve_domain` has run.
    domain: OnceLock<String>,
}

#[derive(Debug, Deserialize)]
struct CloudflareResponse<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CloudflareError>,
}

#[derive(Debug, Deserialize)]
struct CloudflareError {
    message: String,
}

impl<T> CloudflareResponse<T> {
    fn error_message(&self) -> String {
        self.errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Zone {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider.
    pub fn new(
        api_token: String,
        zone_id: String,
        ttl: u32,
        proxied: bool,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_base_url(
            api_token,
            zone_id,
            ttl,
            proxied,
            timeout,
            DEFAULT_BASE_URL.to_string(),
        )
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(
        api_token: String,
        zone_id: String,
        ttl: u32,
        proxied: bool,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self> {
        Ok(Self {
            client: crate::http::client(timeout)?,
            api_token,
            zone_id,
            ttl,
            proxied,
            base_url,
            domain: OnceLock::new(),
        })
    }

    fn zone_url(&self) -> String {
        format!("{}/client/v4/zones/{}", self.base_url, self.zone_id)
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<CloudflareResponse<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| DdnsError::resolution(NAME, e.to_string()))?;
        let status = response.status();

        let body: CloudflareResponse<T> = response.json().await.map_err(|e| {
            DdnsError::resolution(NAME, format!("Unreadable response (HTTP {}): {}", status, e))
        })?;

        if !status.is_success() || !body.success {
            return Err(DdnsError::resolution(
                NAME,
                format!("HTTP {}: {}", status, body.error_message()),
            ));
        }
        Ok(body)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn resolve_domain(&self) -> Result<Option<String>> {
        let response: CloudflareResponse<Zone> =
            self.lookup(self.client.get(self.zone_url())).await?;

        let name = response
            .result
            .and_then(|zone| zone.name)
            .ok_or_else(|| {
                DdnsError::resolution(NAME, format!("Zone {} has no name", self.zone_id))
            })?;

        tracing::debug!("Cloudflare zone {} is {}", self.zone_id, name);
        let _ = self.domain.set(name.clone());
        Ok(Some(name))
    }

    async fn resolve_record(&self, name: &str, domain: &str) -> Result<String> {
        let fqdn = qualify(name, Some(domain));
        let request = self
            .client
            .get(format!("{}/dns_records", self.zone_url()))
            .query(&[("name", fqdn.as_str())]);

        let response: CloudflareResponse<Vec<DnsRecord>> = self.lookup(request).await?;

        // Prefer an address record when the name also carries TXT, MX, etc.
        let records = response.result.unwrap_or_default();
        records
            .iter()
            .find(|r| matches!(r.record_type.as_deref(), Some("A") | Some("AAAA")))
            .or_else(|| records.first())
            .map(|r| r.id.clone())
            .ok_or_else(|| DdnsError::resolution(NAME, format!("DNS record {} not found", fqdn)))
    }

    async fn apply_update(&self, record: &Record, ip: &str) -> Result<UpdateOutcome> {
        let record_id = record
            .id
            .as_deref()
            .ok_or_else(|| DdnsError::update_failed(NAME, &record.name, "record is unresolved"))?;

        let url = format!("{}/dns_records/{}", self.zone_url(), record_id);
        let name = qualify(&record.name, self.domain.get().map(String::as_str));
        let request = UpdateRequest {
            record_type: record_type(ip),
            name: &name,
            content: ip,
            ttl: self.ttl,
            proxied: self.proxied,
        };

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| DdnsError::update_failed(NAME, &record.name, e))?;
        let status = response.status();

        let body: CloudflareResponse<serde_json::Value> = response.json().await.map_err(|e| {
            DdnsError::update_failed(
                NAME,
                &record.name,
                format!("Unreadable response (HTTP {}): {}", status, e),
            )
        })?;

        if status.is_success() && body.success {
            Ok(UpdateOutcome::new(
                NAME,
                record,
                ip,
                format!("record {} updated", record_id),
            ))
        } else {
            Err(DdnsError::update_failed(
                NAME,
                &record.name,
                format!("HTTP {}: {}", status, body.error_message()),
            ))
        }
    }
}
