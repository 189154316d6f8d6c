//! Provider tests with HTTP mocking.

#[cfg(test)]
mod cloudflare_tests {
    use crate::error::DdnsError;
    use crate::providers::{CloudflareProvider, DnsProvider, Record};
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> CloudflareProvider {
        CloudflareProvider::with_base_url(
            "test-token".to_string(),
            "zone-123".to_string(),
            1,
            false,
            Duration::from_secs(5),
            server.uri(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_cloudflare_resolve_domain() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/client/v4/zones/zone-123"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"result":{"id":"zone-123","name":"example.com"},"errors":[]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let domain = provider(&mock_server).resolve_domain().await.unwrap();
        assert_eq!(domain.as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn test_cloudflare_zone_without_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/client/v4/zones/zone-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"result":{"id":"zone-123"},"errors":[]}"#,
            ))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server).resolve_domain().await.unwrap_err();
        assert!(matches!(err, DdnsError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_cloudflare_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/client/v4/zones/zone-123"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"success":false,"result":null,"errors":[{"code":9109,"message":"Invalid access token"}]}"#,
            ))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server).resolve_domain().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Invalid access token"));
    }

    #[tokio::test]
    async fn test_cloudflare_resolve_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/client/v4/zones/zone-123/dns_records"))
            .and(query_param("name", "vpn.example.com"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"result":[{"id":"record-123","content":"1.1.1.1"}],"errors":[]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let id = provider(&mock_server)
            .resolve_record("vpn", "example.com")
            .await
            .unwrap();
        assert_eq!(id, "record-123");
    }

    #[tokio::test]
    async fn test_cloudflare_record_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/client/v4/zones/zone-123/dns_records"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success":true,"result":[],"errors":[]}"#),
            )
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .resolve_record("nonexistent", "example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, DdnsError::Resolution { .. }));
        assert!(err.to_string().contains("nonexistent.example.com"));
    }

    #[tokio::test]
    async fn test_cloudflare_resolve_record_prefers_address_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/client/v4/zones/zone-123/dns_records"))
            .and(query_param("name", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"result":[
                    {"id":"txt-spf","type":"TXT"},
                    {"id":"mx-1","type":"MX"},
                    {"id":"a-apex","type":"A"}
                ],"errors":[]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let id = provider(&mock_server)
            .resolve_record("@", "example.com")
            .await
            .unwrap();

        assert_eq!(id, "a-apex");
    }

    #[tokio::test]
    async fn test_cloudflare_update_sends_qualified_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/client/v4/zones/zone-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"result":{"id":"zone-123","name":"example.com"},"errors":[]}"#,
            ))
            .mount(&mock_server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/client/v4/zones/zone-123/dns_records/record-123"))
            .and(body_json(serde_json::json!({
                "type": "A",
                "name": "vpn.example.com",
                "content": "2.2.2.2",
                "ttl": 1,
                "proxied": false
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success":true,"result":{},"errors":[]}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        provider.resolve_domain().await.unwrap();
        provider
            .apply_update(&Record::resolved("vpn", "record-123"), "2.2.2.2")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cloudflare_update_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/client/v4/zones/zone-123/dns_records/record-123"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(serde_json::json!({
                "type": "A",
                "name": "vpn",
                "content": "2.2.2.2",
                "ttl": 1,
                "proxied": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success":true,"result":{"id":"record-123","content":"2.2.2.2"},"errors":[]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = Record::resolved("vpn", "record-123");
        let outcome = provider(&mock_server)
            .apply_update(&record, "2.2.2.2")
            .await
            .unwrap();

        assert_eq!(outcome.provider, "cloudflare");
        assert_eq!(outcome.record, "vpn");
        assert_eq!(outcome.ip, "2.2.2.2");
    }

    #[tokio::test]
    async fn test_cloudflare_update_ipv6_uses_aaaa() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(body_json(serde_json::json!({
                "type": "AAAA",
                "name": "vpn",
                "content": "2001:db8::1",
                "ttl": 1,
                "proxied": false
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success":true,"result":{},"errors":[]}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = Record::resolved("vpn", "record-123");
        provider(&mock_server)
            .apply_update(&record, "2001:db8::1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cloudflare_update_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"success":false,"result":null,"errors":[{"message":"Content for A record is invalid"}]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = Record::resolved("vpn", "record-123");
        let err = provider(&mock_server)
            .apply_update(&record, "2.2.2.2")
            .await
            .unwrap_err();

        assert!(matches!(err, DdnsError::UpdateFailed { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_cloudflare_update_unresolved_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .apply_update(&Record::new("vpn"), "2.2.2.2")
            .await
            .unwrap_err();
        assert!(matches!(err, DdnsError::UpdateFailed { .. }));
    }
}

#[cfg(test)]
mod dnsmadeeasy_tests {
    use crate::error::DdnsError;
    use crate::providers::dnsmadeeasy::sign;
    use crate::providers::{DnsMadeEasyProvider, DnsProvider, Record};
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn provider(server: &MockServer) -> DnsMadeEasyProvider {
        DnsMadeEasyProvider::with_base_url(
            "api-key".to_string(),
            "secret-key".to_string(),
            "123".to_string(),
            1800,
            Duration::from_secs(5),
            server.uri(),
        )
        .unwrap()
    }

    /// Matches requests whose HMAC header is a valid signature of their date header.
    fn correctly_signed(request: &Request) -> bool {
        let value = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        match (value("x-dnsme-requestDate"), value("x-dnsme-hmac")) {
            (Some(date), Some(hmac)) => hmac == sign("secret-key", &date),
            _ => false,
        }
    }

    #[tokio::test]
    async fn test_dnsmadeeasy_resolve_domain_signed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/V2.0/dns/managed/123"))
            .and(header("x-dnsme-apiKey", "api-key"))
            .and(correctly_signed)
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": 123, "name": "example.com"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let domain = provider(&mock_server).resolve_domain().await.unwrap();
        assert_eq!(domain.as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn test_dnsmadeeasy_unknown_zone() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/V2.0/dns/managed/123"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server).resolve_domain().await.unwrap_err();
        assert!(matches!(err, DdnsError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_dnsmadeeasy_resolve_record_prefers_address_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/V2.0/dns/managed/123/records"))
            .and(query_param("recordName", "home"))
            .and(correctly_signed)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"id": 7, "name": "home", "type": "TXT", "value": "\"hello\""},
                    {"id": 42, "name": "home", "type": "A", "value": "1.1.1.1"}
                ],
                "totalRecords": 2
            })))
            .mount(&mock_server)
            .await;

        let id = provider(&mock_server)
            .resolve_record("home", "example.com")
            .await
            .unwrap();
        assert_eq!(id, "42");
    }

    #[tokio::test]
    async fn test_dnsmadeeasy_record_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/V2.0/dns/managed/123/records"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})),
            )
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .resolve_record("missing", "example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, DdnsError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_dnsmadeeasy_update_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/V2.0/dns/managed/123/records/42"))
            .and(header("x-dnsme-apiKey", "api-key"))
            .and(correctly_signed)
            .and(body_json(serde_json::json!({
                "name": "home",
                "type": "A",
                "value": "3.3.3.3",
                "id": 42,
                "gtdLocation": "DEFAULT",
                "ttl": 1800
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = Record::resolved("home", "42");
        let outcome = provider(&mock_server)
            .apply_update(&record, "3.3.3.3")
            .await
            .unwrap();
        assert_eq!(outcome.provider, "dnsmadeeasy");
        assert_eq!(outcome.ip, "3.3.3.3");
    }

    #[tokio::test]
    async fn test_dnsmadeeasy_update_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":["Record with this type already exists"]}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = Record::resolved("home", "42");
        let err = provider(&mock_server)
            .apply_update(&record, "3.3.3.3")
            .await
            .unwrap_err();

        assert!(matches!(err, DdnsError::UpdateFailed { .. }));
        assert!(err.to_string().contains("already exists"));
    }
}

#[cfg(test)]
mod dnsomatic_tests {
    use crate::error::DdnsError;
    use crate::providers::{DnsOMaticFlags, DnsOMaticProvider, DnsProvider, Record};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, flags: DnsOMaticFlags) -> DnsOMaticProvider {
        DnsOMaticProvider::with_base_url(
            "user".to_string(),
            "pass".to_string(),
            flags,
            Duration::from_secs(5),
            server.uri(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_dnsomatic_update_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nic/update"))
            .and(header("Authorization", "Basic dXNlcjpwYXNz"))
            .and(query_param("hostname", "host1.example.com"))
            .and(query_param("myip", "1.2.3.4"))
            .and(query_param("wildcard", "NOCHG"))
            .and(query_param("mx", "NOCHG"))
            .and(query_param("backmx", "NOCHG"))
            .respond_with(ResponseTemplate::new(200).set_body_string("good 1.2.3.4"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = Record::resolved("host1.example.com", "host1.example.com");
        let outcome = provider(&mock_server, DnsOMaticFlags::default())
            .apply_update(&record, "1.2.3.4")
            .await
            .unwrap();

        assert_eq!(outcome.detail, "good 1.2.3.4");
    }

    #[tokio::test]
    async fn test_dnsomatic_custom_flags() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nic/update"))
            .and(query_param("wildcard", "ON"))
            .and(query_param("mx", "mail.example.com"))
            .and(query_param("backmx", "NO"))
            .respond_with(ResponseTemplate::new(200).set_body_string("nochg 1.2.3.4"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let flags = DnsOMaticFlags {
            wildcard: "ON".to_string(),
            mx: "mail.example.com".to_string(),
            backup_mx: "NO".to_string(),
        };
        let record = Record::resolved("host1", "host1");
        assert!(provider(&mock_server, flags)
            .apply_update(&record, "1.2.3.4")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_dnsomatic_bad_auth() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nic/update"))
            .respond_with(ResponseTemplate::new(200).set_body_string("badauth"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = Record::resolved("host1", "host1");
        let err = provider(&mock_server, DnsOMaticFlags::default())
            .apply_update(&record, "1.2.3.4")
            .await
            .unwrap_err();

        assert!(matches!(err, DdnsError::UpdateFailed { .. }));
        assert!(err.to_string().contains("badauth"));
    }

    #[tokio::test]
    async fn test_dnsomatic_has_nothing_to_resolve() {
        let mock_server = MockServer::start().await;
        let provider = provider(&mock_server, DnsOMaticFlags::default());

        assert_eq!(provider.resolve_domain().await.unwrap(), None);
        assert_eq!(provider.resolve_record("host1", "").await.unwrap(), "host1");
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}

#[cfg(test)]
mod factory_tests {
    use crate::config::Config;
    use crate::providers::{create_provider, qualify, record_type};

    fn config_with(provider: &str) -> Config {
        Config::from_toml(&format!(
            r#"
            records = "host1"
            [provider]
            {}
            "#,
            provider
        ))
        .unwrap()
    }

    #[test]
    fn test_create_each_provider() {
        let cases = [
            (
                r#"type = "cloudflare"
                api_token = "t"
                zone_id = "z""#,
                "cloudflare",
            ),
            (
                r#"type = "dnsmadeeasy"
                api_key = "k"
                secret_key = "s"
                zone_id = "1""#,
                "dnsmadeeasy",
            ),
            (
                r#"type = "dnsomatic"
                username = "u"
                password = "p""#,
                "dnsomatic",
            ),
        ];

        for (section, expected) in cases {
            let provider = create_provider(&config_with(section)).unwrap();
            assert_eq!(provider.name(), expected);
        }
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("vpn", Some("example.com")), "vpn.example.com");
        assert_eq!(qualify("@", Some("example.com")), "example.com");
        assert_eq!(qualify("vpn.example.com", Some("example.com")), "vpn.example.com");
        assert_eq!(qualify("host1", None), "host1");
    }

    #[test]
    fn test_record_type() {
        assert_eq!(record_type("1.2.3.4"), "A");
        assert_eq!(record_type("2001:db8::1"), "AAAA");
    }
}
