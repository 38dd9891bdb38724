//! Environment self-test: DNS, reachability and HTTPS against a reference host.

use std::net::IpAddr;

use log::{info, warn};

use crate::config::AuditConfig;
use crate::error::{AuditError, AuditResult, SelfTestFailure};
use crate::traits::{DnsResolver, HttpProbe, ReachabilityProbe};
use crate::types::{Finding, Nameserver, RecordType, SelfTestReport};

/// Run the three gated steps. Any failure is fatal for the whole audit.
pub async fn self_test(
    resolver: &dyn DnsResolver,
    http: &dyn HttpProbe,
    reachability: &dyn ReachabilityProbe,
    config: &AuditConfig,
) -> AuditResult<SelfTestReport> {
    let host = config.reference_host.as_str();
    let fail = |failure: SelfTestFailure| {
        warn!("[SelfTest] {failure}");
        AuditError::SelfTestFailed(failure)
    };
    let mut findings = Vec::new();

    let answers = resolver
        .resolve(host, RecordType::A, &Nameserver::System)
        .await
        .unwrap_or_default();
    let address = answers
        .iter()
        .find_map(|answer| answer.parse::<IpAddr>().ok())
        .ok_or_else(|| {
            fail(SelfTestFailure::DnsUnresolved {
                host: host.to_string(),
            })
        })?;
    findings.push(Finding::pass(format!("DNS resolves {host} → {address}")));

    if !reachability
        .reachable(address, config.timeouts.reachability())
        .await
    {
        return Err(fail(SelfTestFailure::Unreachable {
            address: address.to_string(),
        }));
    }
    findings.push(Finding::pass(format!("{address} reachable")));

    let url = format!("https://{host}");
    let status = http
        .probe(&url, config.timeouts.http())
        .await
        .map(|response| response.status_code)
        .ok();
    if status != Some(200) {
        return Err(fail(SelfTestFailure::HttpsStatus { url, status }));
    }
    findings.push(Finding::pass(format!("HTTPS {url} → 200")));

    info!("[SelfTest] Passed against {host}");
    Ok(SelfTestReport {
        reference_host: host.to_string(),
        resolved_address: address,
        reachable: true,
        https_status: 200,
        findings,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_config, MockDnsResolver, MockHttpProbe, MockReachability};

    fn healthy_resolver() -> MockDnsResolver {
        MockDnsResolver::new().with_answer(
            "www.google.com",
            RecordType::A,
            &Nameserver::System,
            &["142.250.72.196"],
        )
    }

    #[tokio::test]
    async fn test_self_test_passes() {
        let config = sample_config();
        let http = MockHttpProbe::new().with_status("https://www.google.com", 200);
        let report = self_test(
            &healthy_resolver(),
            &http,
            &MockReachability::new(true),
            &config,
        )
        .await
        .unwrap();

        assert_eq!(report.resolved_address.to_string(), "142.250.72.196");
        assert_eq!(report.https_status, 200);
        assert_eq!(report.findings.len(), 3);
    }

    #[tokio::test]
    async fn test_self_test_dns_empty_is_fatal() {
        let config = sample_config();
        let reach = MockReachability::new(true);
        let http = MockHttpProbe::new().with_status("https://www.google.com", 200);
        let err = self_test(&MockDnsResolver::new(), &http, &reach, &config)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AuditError::SelfTestFailed(SelfTestFailure::DnsUnresolved { .. })
        ));
        assert_eq!(reach.calls(), 0);
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn test_self_test_unreachable_is_fatal() {
        let config = sample_config();
        let http = MockHttpProbe::new().with_status("https://www.google.com", 200);
        let err = self_test(
            &healthy_resolver(),
            &http,
            &MockReachability::new(false),
            &config,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AuditError::SelfTestFailed(SelfTestFailure::Unreachable { .. })
        ));
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn test_self_test_non_200_is_fatal() {
        let config = sample_config();
        let http = MockHttpProbe::new().with_status("https://www.google.com", 503);
        let err = self_test(
            &healthy_resolver(),
            &http,
            &MockReachability::new(true),
            &config,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            AuditError::SelfTestFailed(SelfTestFailure::HttpsStatus {
                url: "https://www.google.com".to_string(),
                status: Some(503),
            })
        );
    }

    #[tokio::test]
    async fn test_self_test_https_error_is_fatal() {
        let config = sample_config();
        let err = self_test(
            &healthy_resolver(),
            &MockHttpProbe::new(),
            &MockReachability::new(true),
            &config,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AuditError::SelfTestFailed(SelfTestFailure::HttpsStatus { status: None, .. })
        ));
    }
}
