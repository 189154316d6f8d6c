//! DNS Made Easy provider.
//!
//! Requests are authenticated with three headers: the API key, the request
//! date, and an HMAC-SHA1 of that date keyed by the secret.

use super::{record_type, DnsProvider, Record, UpdateOutcome};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.dnsmadeeasy.com";
const NAME: &str = "dnsmadeeasy";

/// `Thu, 01 Jan 2026 00:00:00 GMT`
const REQUEST_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

type HmacSha1 = Hmac<Sha1>;

/// DNS Made Easy provider.
pub struct DnsMadeEasyProvider {
    client: reqwest::Client,
    api_key: String,
    secret_key: String,
    zone_id: String,
    ttl: u32,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ManagedDomain {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    data: Vec<DnsRecord>,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: u64,
    #[serde(rename = "type", default)]
    record_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    value: &'a str,
    id: u64,
    gtd_location: &'a str,
    ttl: u32,
}

/// Hex HMAC-SHA1 of `message` keyed by `secret`.
pub(crate) fn sign(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub(crate) fn request_date(now: DateTime<Utc>) -> String {
    now.format(REQUEST_DATE_FORMAT).to_string()
}

impl DnsMadeEasyProvider {
    /// Create a new DNS Made Easy provider.
    pub fn new(
        api_key: String,
        secret_key: String,
        zone_id: String,
        ttl: u32,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_base_url(
            api_key,
            secret_key,
            zone_id,
            ttl,
            timeout,
            DEFAULT_BASE_URL.to_string(),
        )
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(
        api_key: String,
        secret_key: String,
        zone_id: String,
        ttl: u32,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self> {
        Ok(Self {
            client: crate::http::client(timeout)?,
            api_key,
            secret_key,
            zone_id,
            ttl,
            base_url,
        })
    }

    fn zone_url(&self) -> String {
        format!("{}/V2.0/dns/managed/{}", self.base_url, self.zone_id)
    }

    /// Attach the authentication headers, signed for the current time.
    fn signed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let date = request_date(Utc::now());
        request
            .header("x-dnsme-apiKey", &self.api_key)
            .header("x-dnsme-hmac", sign(&self.secret_key, &date))
            .header("x-dnsme-requestDate", date)
    }

    async fn lookup(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = self
            .signed(request)
            .send()
            .await
            .map_err(|e| DdnsError::resolution(NAME, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DdnsError::resolution(
                NAME,
                format!("HTTP {}: {}", status, text.trim()),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl DnsProvider for DnsMadeEasyProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn resolve_domain(&self) -> Result<Option<String>> {
        let domain: ManagedDomain = self
            .lookup(self.client.get(self.zone_url()))
            .await?
            .json()
            .await
            .map_err(|e| DdnsError::resolution(NAME, e.to_string()))?;

        let name = domain.name.ok_or_else(|| {
            DdnsError::resolution(NAME, format!("Managed domain {} has no name", self.zone_id))
        })?;

        tracing::debug!("DNS Made Easy domain {} is {}", self.zone_id, name);
        Ok(Some(name))
    }

    async fn resolve_record(&self, name: &str, _domain: &str) -> Result<String> {
        let request = self
            .client
            .get(format!("{}/records", self.zone_url()))
            .query(&[("recordName", name)]);

        let records: RecordList = self
            .lookup(request)
            .await?
            .json()
            .await
            .map_err(|e| DdnsError::resolution(NAME, e.to_string()))?;

        // Prefer an address record when the name also carries TXT, MX, etc.
        records
            .data
            .iter()
            .find(|r| matches!(r.record_type.as_deref(), Some("A") | Some("AAAA")))
            .or_else(|| records.data.first())
            .map(|r| r.id.to_string())
            .ok_or_else(|| DdnsError::resolution(NAME, format!("DNS record {} not found", name)))
    }

    async fn apply_update(&self, record: &Record, ip: &str) -> Result<UpdateOutcome> {
        let record_id = record
            .id
            .as_deref()
            .ok_or_else(|| DdnsError::update_failed(NAME, &record.name, "record is unresolved"))?;
        let numeric_id: u64 = record_id.parse().map_err(|_| {
            DdnsError::update_failed(
                NAME,
                &record.name,
                format!("record id {} is not numeric", record_id),
            )
        })?;

        let body = UpdateRequest {
            name: &record.name,
            record_type: record_type(ip),
            value: ip,
            id: numeric_id,
            gtd_location: "DEFAULT",
            ttl: self.ttl,
        };

        let url = format!("{}/records/{}", self.zone_url(), record_id);
        let response = self
            .signed(self.client.put(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| DdnsError::update_failed(NAME, &record.name, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(UpdateOutcome::new(NAME, record, ip, format!("HTTP {}", status)))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(DdnsError::update_failed(
                NAME,
                &record.name,
                format!("HTTP {}: {}", status, text.trim()),
            ))
        }
    }
}
