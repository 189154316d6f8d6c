//! DNS provider implementations.

mod cloudflare;
mod dnsmadeeasy;
mod dnsomatic;

#[cfg(test)]
mod tests;

pub use cloudflare::CloudflareProvider;
pub use dnsmadeeasy::DnsMadeEasyProvider;
pub use dnsomatic::{DnsOMaticFlags, DnsOMaticProvider};

use crate::config::{Config, ProviderConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::net::IpAddr;

/// A record kept pointed at the current IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Name as written in the configuration.
    pub name: String,
    /// Provider-side identifier, `None` until resolved.
    pub id: Option<String>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    pub fn resolved(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Some(id.into()),
        }
    }

    /// Fully qualified name of this record inside `domain`.
    pub fn qualified(&self, domain: Option<&str>) -> String {
        qualify(&self.name, domain)
    }
}

/// Join a record name with its zone's domain.
///
/// `@` is the zone apex, and names already ending in the domain are left alone.
pub fn qualify(name: &str, domain: Option<&str>) -> String {
    match domain {
        None => name.to_string(),
        Some(domain) if name == "@" || name == domain => domain.to_string(),
        Some(domain) if name.ends_with(&format!(".{}", domain)) => name.to_string(),
        Some(domain) => format!("{}.{}", name, domain),
    }
}

/// `A` for IPv4 literals, `AAAA` for IPv6 literals.
pub fn record_type(ip: &str) -> &'static str {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => "AAAA",
        _ => "A",
    }
}

/// Result of a DNS update operation.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// Provider name.
    pub provider: String,
    /// Record that was updated.
    pub record: String,
    /// IP the record now points at.
    pub ip: String,
    /// What the provider said about it.
    pub detail: String,
}

impl UpdateOutcome {
    pub(crate) fn new(provider: &str, record: &Record, ip: &str, detail: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            record: record.name.clone(),
            ip: ip.to_string(),
            detail: detail.into(),
        }
    }
}

/// Trait for DNS providers.
///
/// The zone a provider manages is part of its own configuration, so none of
/// the calls take it as an argument.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// Look up the domain name of the configured zone.
    ///
    /// `None` for providers that address records by hostname alone.
    async fn resolve_domain(&self) -> Result<Option<String>>;

    /// Look up the provider-side identifier of record `name` in `domain`.
    async fn resolve_record(&self, name: &str, domain: &str) -> Result<String>;

    /// Point `record` at `ip`. Exactly one request, never retried.
    async fn apply_update(&self, record: &Record, ip: &str) -> Result<UpdateOutcome>;
}

/// Create a provider from configuration.
pub fn create_provider(config: &Config) -> Result<Box<dyn DnsProvider>> {
    let timeout = config.http_timeout();
    let provider: Box<dyn DnsProvider> = match &config.provider {
        ProviderConfig::Cloudflare {
            api_token,
            zone_id,
            ttl,
            proxied,
        } => Box::new(CloudflareProvider::new(
            api_token.clone(),
            zone_id.clone(),
            *ttl,
            *proxied,
            timeout,
        )?),
        ProviderConfig::DnsMadeEasy {
            api_key,
            secret_key,
            zone_id,
            ttl,
        } => Box::new(DnsMadeEasyProvider::new(
            api_key.clone(),
            secret_key.clone(),
            zone_id.clone(),
            *ttl,
            timeout,
        )?),
        ProviderConfig::DnsOMatic {
            username,
            password,
            wildcard,
            mx,
            backup_mx,
        } => Box::new(DnsOMaticProvider::new(
            username.clone(),
            password.clone(),
            DnsOMaticFlags {
                wildcard: wildcard.clone(),
                mx: mx.clone(),
                backup_mx: backup_mx.clone(),
            },
            timeout,
        )?),
    };

    tracing::debug!("Using {} provider", provider.name());
    Ok(provider)
}
