use super::*;

use crate::config::{FORWARDING_ADDRESSES, PLATFORM_ADDRESSES};
use crate::error::{AuditError, SelfTestFailure};
use crate::test_utils::{
    sample_config, MockDiagnosticRunner, MockDnsResolver, MockHttpProbe, MockReachability,
};
use crate::types::{
    Anomaly, AuditOutcome, CheckStatus, DiagnosticTool, Nameserver, RecordType, RedirectCheck,
    RootConfigState,
};

const AUTH: [&str; 2] = ["ns-cloud-a1.googledomains.com", "ns-cloud-a2.googledomains.com"];

fn authoritative() -> Vec<String> {
    AUTH.iter().map(ToString::to_string).collect()
}

/// A resolver where every expected record is fully propagated and the root
/// carries `root` A-records.
fn healthy_resolver(root: &[std::net::Ipv4Addr]) -> MockDnsResolver {
    let config = sample_config();
    let auth = authoritative();
    let root: Vec<String> = root.iter().map(ToString::to_string).collect();
    let root: Vec<&str> = root.iter().map(String::as_str).collect();

    config
        .records
        .iter()
        .fold(MockDnsResolver::new(), |mock, record| {
            mock.with_propagated(&record.fqdn(&config.domain), &record.target, &config, &auth)
        })
        .with_answer(
            "www.google.com",
            RecordType::A,
            &Nameserver::System,
            &["142.250.72.196"],
        )
        .with_answer("example.com", RecordType::Ns, &Nameserver::System, &AUTH)
        .with_answer("example.com", RecordType::A, &Nameserver::System, &root)
        .with_answer(
            "ghs.google.com",
            RecordType::A,
            &Nameserver::System,
            &["142.250.80.51"],
        )
}

fn healthy_http() -> MockHttpProbe {
    MockHttpProbe::new()
        .with_status("https://www.google.com", 200)
        .with_redirect("https://example.com", 301, "https://www.example.com/")
        .with_status("https://www.example.com", 200)
        .with_redirect("http://www.example.com", 301, "https://www.example.com/")
}

fn service(resolver: Arc<MockDnsResolver>, http: Arc<MockHttpProbe>) -> AuditService {
    AuditService::new(
        sample_config(),
        resolver,
        http,
        Arc::new(MockReachability::new(true)),
    )
}

#[tokio::test]
async fn platform_native_root_with_correct_redirect_is_clean() {
    let resolver = Arc::new(healthy_resolver(&PLATFORM_ADDRESSES));
    let report = service(resolver, Arc::new(healthy_http()))
        .run(&AuditOptions::default())
        .await
        .unwrap();

    assert_eq!(report.domain, "example.com");
    assert_eq!(report.root.state, RootConfigState::PlatformNative);
    assert!(matches!(report.root.redirect, RedirectCheck::Verified { .. }));
    assert_eq!(report.records.len(), 3);
    assert!(report.records.iter().all(|r| r.status == CheckStatus::Pass));
    assert!(report.https.secure_reachable);
    assert!(report.https.insecure_redirects);
    assert_eq!(report.outcome(), AuditOutcome::Clean);
    assert!(report.diagnostics.is_none());
    assert!(report.debug.is_none());
}

#[tokio::test]
async fn registrar_forwarding_root_passes_by_delegation() {
    let resolver = Arc::new(healthy_resolver(&FORWARDING_ADDRESSES));
    let http = Arc::new(healthy_http());
    let report = service(resolver, http.clone())
        .run(&AuditOptions::default())
        .await
        .unwrap();

    assert_eq!(report.root.state, RootConfigState::RegistrarForwarding);
    assert_eq!(report.root.redirect, RedirectCheck::Delegated);
    assert_eq!(report.root.status(), CheckStatus::Pass);
    assert!(report.root.probe.is_none());
    // Self-test plus the two www probes; the root is never probed.
    assert_eq!(http.calls(), 3);
}

#[tokio::test]
async fn missing_www_record_does_not_stop_later_stages() {
    let config = sample_config();
    let auth = authoritative();
    let root: Vec<String> = PLATFORM_ADDRESSES.iter().map(ToString::to_string).collect();
    let root: Vec<&str> = root.iter().map(String::as_str).collect();
    let resolver = MockDnsResolver::new()
        .with_answer(
            "www.google.com",
            RecordType::A,
            &Nameserver::System,
            &["142.250.72.196"],
        )
        .with_answer("example.com", RecordType::Ns, &Nameserver::System, &AUTH)
        .with_answer("example.com", RecordType::A, &Nameserver::System, &root)
        .with_propagated("blog.example.com", "example.blogspot.com", &config, &auth);

    let report = service(Arc::new(resolver), Arc::new(healthy_http()))
        .run(&AuditOptions::default())
        .await
        .unwrap();

    let www = &report.records[0];
    assert_eq!(www.label, "www");
    assert!(www.is_missing());
    assert_eq!(www.status, CheckStatus::Fail);
    assert_eq!(www.public.total, 0);
    assert_eq!(report.records[1].status, CheckStatus::Pass);
    assert_eq!(report.root.state, RootConfigState::PlatformNative);
    assert!(report.https.secure_reachable);
    assert_eq!(report.outcome(), AuditOutcome::Failures);
}

#[tokio::test]
async fn verification_record_with_address_is_anomaly_not_failure() {
    let resolver = healthy_resolver(&PLATFORM_ADDRESSES).with_answer(
        "abcd1234.example.com",
        RecordType::A,
        &Nameserver::System,
        &["203.0.113.7"],
    );
    let report = service(Arc::new(resolver), Arc::new(healthy_http()))
        .run(&AuditOptions::default())
        .await
        .unwrap();

    let verification = &report.records[2];
    assert!(verification
        .anomalies
        .contains(&Anomaly::VerificationRecordResolvesToA));
    assert_eq!(verification.status, CheckStatus::Warn);
    assert_eq!(report.outcome(), AuditOutcome::Warnings);
}

#[tokio::test]
async fn empty_self_test_dns_aborts_before_any_other_query() {
    let resolver = Arc::new(MockDnsResolver::new());
    let http = Arc::new(healthy_http());
    let err = service(resolver.clone(), http.clone())
        .run(&AuditOptions {
            advanced: true,
            debug: true,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AuditError::SelfTestFailed(SelfTestFailure::DnsUnresolved { .. })
    ));
    assert_eq!(resolver.query_count(), 1);
    assert_eq!(http.calls(), 0);
}

#[tokio::test]
async fn records_are_reported_in_configuration_order() {
    let resolver = Arc::new(healthy_resolver(&PLATFORM_ADDRESSES));
    let report = service(resolver, Arc::new(healthy_http()))
        .run(&AuditOptions::default())
        .await
        .unwrap();

    let labels: Vec<&str> = report.records.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["www", "blog", "abcd1234"]);
    for record in &report.records {
        assert!(record.public.agree <= record.public.total);
        assert!(record.authoritative.agree <= record.authoritative.total);
        assert_eq!(record.authoritative.total, AUTH.len());
    }
}

#[tokio::test]
async fn repeated_runs_give_identical_classifications() {
    let resolver = Arc::new(healthy_resolver(&PLATFORM_ADDRESSES));
    let service = service(resolver, Arc::new(healthy_http()));

    let first = service.run(&AuditOptions::default()).await.unwrap();
    let second = service.run(&AuditOptions::default()).await.unwrap();

    assert_eq!(first.root.state, second.root.state);
    assert_eq!(first.records, second.records);
    assert_eq!(first.https, second.https);
    assert_eq!(first.nameservers, second.nameservers);
}

#[tokio::test]
async fn advanced_and_debug_stages_use_installed_tools_only() {
    let resolver = Arc::new(healthy_resolver(&PLATFORM_ADDRESSES));
    let runner = Arc::new(
        MockDiagnosticRunner::new()
            .with_output(DiagnosticTool::Traceroute, " 1  10.0.0.1")
            .with_output(DiagnosticTool::DigTrace, "example.com. 300 IN A 216.239.32.21"),
    );
    let caps = Capabilities {
        traceroute: true,
        subfinder: false,
        dig: true,
    };
    let service = service(resolver, Arc::new(healthy_http())).with_diagnostics(runner.clone(), caps);

    let report = service
        .run(&AuditOptions {
            advanced: true,
            debug: true,
        })
        .await
        .unwrap();

    let diagnostics = report.diagnostics.unwrap();
    assert_eq!(diagnostics.steps.len(), 1);
    assert_eq!(diagnostics.steps[0].tool, DiagnosticTool::Traceroute);

    let debug = report.debug.unwrap();
    assert!(debug.dns_trace.unwrap().contains("216.239.32.21"));
    // Root probe followed by the secure and insecure www probes.
    assert_eq!(debug.responses.len(), 3);
    assert_eq!(debug.responses[0].url, "https://example.com");
    assert_eq!(runner.calls(), 2);
}

#[tokio::test]
async fn diagnostics_do_not_affect_outcome() {
    let resolver = Arc::new(healthy_resolver(&PLATFORM_ADDRESSES));
    let caps = Capabilities {
        traceroute: true,
        subfinder: true,
        dig: false,
    };
    let service = service(resolver, Arc::new(healthy_http()))
        .with_diagnostics(Arc::new(MockDiagnosticRunner::new()), caps);

    let report = service
        .run(&AuditOptions {
            advanced: true,
            debug: false,
        })
        .await
        .unwrap();

    let diagnostics = report.diagnostics.as_ref().unwrap();
    assert!(diagnostics
        .steps
        .iter()
        .all(|s| s.status == CheckStatus::Warn));
    assert_eq!(report.outcome(), AuditOutcome::Clean);
}
