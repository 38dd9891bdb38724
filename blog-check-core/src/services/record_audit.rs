//! Expected-record audit and multi-resolver propagation comparison.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info};
use tokio::time::timeout;

use crate::config::AuditConfig;
use crate::traits::DnsResolver;
use crate::types::{
    worst_status, Anomaly, ExpectedRecord, Finding, Nameserver, PropagationTally, RecordAuditResult,
    RecordKind, RecordType, ServerAnswer,
};

/// Audit one expected record.
///
/// `authoritative` is the NS list discovered by the nameserver stage; it is
/// read-only here and shared by every record.
pub async fn audit_record(
    resolver: &dyn DnsResolver,
    config: &AuditConfig,
    record: &ExpectedRecord,
    authoritative: &[String],
) -> RecordAuditResult {
    let fqdn = record.fqdn(&config.domain);
    debug!("[Audit] Checking {fqdn}");

    let cname = first_answer(resolver, &fqdn, RecordType::Cname, &Nameserver::System).await;
    let Some(cname) = cname else {
        info!("[Audit] {fqdn}: CNAME missing");
        return missing(fqdn, record);
    };

    let mut anomalies = BTreeSet::new();
    let mut findings = vec![Finding::pass(format!("CNAME → {cname}"))];

    if cname != record.target {
        anomalies.insert(Anomaly::TargetMismatch);
        findings.push(Finding::fail(format!(
            "CNAME target mismatch: expected {}, found {cname}",
            record.target
        )));
    }

    let resolved_ip = first_answer(resolver, &cname, RecordType::A, &Nameserver::System).await;

    if record.kind == RecordKind::Verification {
        let direct = first_answer(resolver, &fqdn, RecordType::A, &Nameserver::System).await;
        if let Some(address) = direct {
            anomalies.insert(Anomaly::VerificationRecordResolvesToA);
            findings.push(Finding::warn(format!(
                "Verification CNAME resolves to A-record {address}; NXDOMAIN expected"
            )));
        } else {
            findings.push(Finding::pass("Verification CNAME NXDOMAIN on A lookup"));
        }
    }

    let public_servers: Vec<(String, Nameserver)> = config
        .public_resolvers
        .iter()
        .map(|r| (r.name.clone(), Nameserver::Address(r.ip)))
        .collect();
    let authoritative_servers: Vec<(String, Nameserver)> = authoritative
        .iter()
        .map(|ns| (ns.clone(), Nameserver::Host(ns.clone())))
        .collect();
    let limit = config.timeouts.dns();

    let (public, authoritative) = tokio::join!(
        tally(resolver, &fqdn, &cname, public_servers, limit),
        tally(resolver, &fqdn, &cname, authoritative_servers, limit),
    );

    findings.push(propagation_finding(
        &public,
        &authoritative,
        config.propagation_threshold,
    ));
    let status = worst_status(&findings);
    info!("[Audit] {fqdn}: public {public} | authoritative {authoritative} → {status:?}");

    RecordAuditResult {
        fqdn,
        label: record.label.clone(),
        kind: record.kind,
        expected_target: record.target.clone(),
        resolved_cname: Some(cname),
        resolved_ip,
        public,
        authoritative,
        anomalies,
        status,
        findings,
    }
}

fn missing(fqdn: String, record: &ExpectedRecord) -> RecordAuditResult {
    let findings = vec![Finding::fail(format!(
        "Missing CNAME — expected {} → {}",
        record.label, record.target
    ))];
    RecordAuditResult {
        fqdn,
        label: record.label.clone(),
        kind: record.kind,
        expected_target: record.target.clone(),
        resolved_cname: None,
        resolved_ip: None,
        public: PropagationTally::default(),
        authoritative: PropagationTally::default(),
        anomalies: BTreeSet::new(),
        status: worst_status(&findings),
        findings,
    }
}

async fn first_answer(
    resolver: &dyn DnsResolver,
    name: &str,
    record_type: RecordType,
    nameserver: &Nameserver,
) -> Option<String> {
    match resolver.resolve(name, record_type, nameserver).await {
        Ok(answers) => answers.into_iter().next(),
        Err(e) => {
            debug!("[Audit] {record_type} {name} @{nameserver}: {e}");
            None
        }
    }
}

/// Query every server concurrently and count exact agreement with `expected`.
async fn tally(
    resolver: &dyn DnsResolver,
    fqdn: &str,
    expected: &str,
    servers: Vec<(String, Nameserver)>,
    limit: Duration,
) -> PropagationTally {
    let futures = servers.into_iter().map(|(label, nameserver)| async move {
        let answer = timeout(
            limit,
            first_answer(resolver, fqdn, RecordType::Cname, &nameserver),
        )
        .await
        .unwrap_or_else(|_| {
            debug!("[Audit] CNAME {fqdn} @{nameserver}: timed out");
            None
        });
        let agrees = answer.as_deref() == Some(expected);
        ServerAnswer {
            server: label,
            answer,
            agrees,
        }
    });
    PropagationTally::from_answers(join_all(futures).await)
}

/// Classify the two tallies.
///
/// Groups with no servers are neutral. All queried groups at `0/N` means not
/// propagated; any group under `threshold` means partially propagated.
pub fn propagation_finding(
    public: &PropagationTally,
    authoritative: &PropagationTally,
    threshold: f32,
) -> Finding {
    let summary = format!("Propagation → public {public} | authoritative {authoritative}");
    let queried: Vec<&PropagationTally> = [public, authoritative]
        .into_iter()
        .filter(|t| t.total > 0)
        .collect();

    if queried.is_empty() {
        return Finding::warn(format!("{summary} (no resolvers queried)"));
    }
    if queried.iter().all(|t| t.agree == 0) {
        return Finding::fail(format!("{summary} (not propagated)"));
    }
    if queried
        .iter()
        .any(|t| t.ratio().is_some_and(|ratio| ratio < threshold))
    {
        return Finding::warn(format!("{summary} (partially propagated)"));
    }
    Finding::pass(summary)
}
