//! One-time mapping of configured record names to provider identifiers.

use crate::error::{DdnsError, Result};
use crate::providers::{DnsProvider, Record};

/// Records ready for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecords {
    /// Domain of the provider's zone, if it has one.
    pub domain: Option<String>,
    /// Every configured record, each with its identifier set.
    pub records: Vec<Record>,
}

impl ResolvedRecords {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolve every name in `names` against `provider`.
///
/// Providers without a zone (`resolve_domain` yields `None`) address records
/// by hostname, so each identifier is the name itself and no lookups are made.
/// Any failure is returned as a fatal [`DdnsError::Resolution`].
pub async fn resolve_records(
    provider: &dyn DnsProvider,
    names: &[String],
) -> Result<ResolvedRecords> {
    let domain = provider
        .resolve_domain()
        .await
        .map_err(|e| as_resolution(provider, e))?;

    let mut records = Vec::with_capacity(names.len());
    for name in names {
        let id = match domain.as_deref() {
            Some(domain) => provider
                .resolve_record(name, domain)
                .await
                .map_err(|e| as_resolution(provider, e))?,
            None => name.clone(),
        };
        tracing::info!("Resolved record {} to {}", name, id);
        records.push(Record::resolved(name.clone(), id));
    }

    Ok(ResolvedRecords { domain, records })
}

fn as_resolution(provider: &dyn DnsProvider, error: DdnsError) -> DdnsError {
    match error {
        e @ DdnsError::Resolution { .. } => e,
        other => DdnsError::resolution(provider.name(), other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockDnsProvider;
    use mockall::predicate::eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_hostname_provider_needs_no_lookups() {
        let mut provider = MockDnsProvider::new();
        provider.expect_name().return_const("legacy");
        provider
            .expect_resolve_domain()
            .times(1)
            .returning(|| Ok(None));
        provider.expect_resolve_record().times(0);

        let resolved = resolve_records(&provider, &names(&["host1", "host2"]))
            .await
            .unwrap();

        assert_eq!(resolved.domain, None);
        assert_eq!(
            resolved.records,
            vec![
                Record::resolved("host1", "host1"),
                Record::resolved("host2", "host2")
            ]
        );
    }

    #[tokio::test]
    async fn test_every_name_resolved_once() {
        let mut provider = MockDnsProvider::new();
        provider.expect_name().return_const("rest");
        provider
            .expect_resolve_domain()
            .times(1)
            .returning(|| Ok(Some("example.com".to_string())));
        provider
            .expect_resolve_record()
            .with(eq("vpn"), eq("example.com"))
            .times(1)
            .returning(|_, _| Ok("id-vpn".to_string()));
        provider
            .expect_resolve_record()
            .with(eq("nas"), eq("example.com"))
            .times(1)
            .returning(|_, _| Ok("id-nas".to_string()));

        let resolved = resolve_records(&provider, &names(&["vpn", "nas"]))
            .await
            .unwrap();

        assert_eq!(resolved.domain.as_deref(), Some("example.com"));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.records[0], Record::resolved("vpn", "id-vpn"));
        assert_eq!(resolved.records[1], Record::resolved("nas", "id-nas"));
    }

    #[tokio::test]
    async fn test_missing_record_is_fatal() {
        let mut provider = MockDnsProvider::new();
        provider.expect_name().return_const("rest");
        provider
            .expect_resolve_domain()
            .returning(|| Ok(Some("example.com".to_string())));
        provider
            .expect_resolve_record()
            .returning(|name, _| {
                Err(DdnsError::resolution("rest", format!("{} not found", name)))
            });

        let err = resolve_records(&provider, &names(&["ghost"]))
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("ghost not found"));
    }

    #[tokio::test]
    async fn test_network_failure_becomes_resolution_error() {
        let mut provider = MockDnsProvider::new();
        provider.expect_name().return_const("rest");
        provider
            .expect_resolve_domain()
            .returning(|| Err(DdnsError::Network("connection refused".to_string())));
        provider.expect_resolve_record().times(0);

        let err = resolve_records(&provider, &names(&["vpn"]))
            .await
            .unwrap_err();

        assert!(matches!(err, DdnsError::Resolution { .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
