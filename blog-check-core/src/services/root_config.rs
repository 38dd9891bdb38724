//! Root-domain configuration classifier and forwarding check.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use log::{info, warn};

use crate::config::AuditConfig;
use crate::traits::{DnsResolver, HttpProbe};
use crate::types::{
    Finding, Nameserver, ProbeResponse, RecordType, RedirectCheck, RootConfigReport,
    RootConfigState,
};

/// Classify an observed root A-record set.
///
/// Requires an exact set match (order and duplicates ignored) against one of
/// the reference sets; subsets, supersets and mixtures are `Misconfigured`.
pub fn classify_addresses(
    observed: &[Ipv4Addr],
    platform: &[Ipv4Addr],
    forwarding: &[Ipv4Addr],
) -> RootConfigState {
    let observed: BTreeSet<&Ipv4Addr> = observed.iter().collect();
    let platform: BTreeSet<&Ipv4Addr> = platform.iter().collect();
    let forwarding: BTreeSet<&Ipv4Addr> = forwarding.iter().collect();

    if !platform.is_empty() && observed == platform {
        RootConfigState::PlatformNative
    } else if !forwarding.is_empty() && observed == forwarding {
        RootConfigState::RegistrarForwarding
    } else {
        RootConfigState::Misconfigured
    }
}

/// Resolve the root A-records, classify them and run the matching redirect check.
pub async fn check_root(
    resolver: &dyn DnsResolver,
    http: &dyn HttpProbe,
    config: &AuditConfig,
) -> RootConfigReport {
    let domain = config.domain.as_str();
    let observed: Vec<Ipv4Addr> = match resolver
        .resolve(domain, RecordType::A, &Nameserver::System)
        .await
    {
        Ok(answers) => answers.iter().filter_map(|a| a.parse().ok()).collect(),
        Err(e) => {
            warn!("[Root] A lookup for {domain} failed: {e}");
            Vec::new()
        }
    };

    let state = classify_addresses(
        &observed,
        &config.platform_addresses,
        &config.forwarding_addresses,
    );
    info!("[Root] {domain} classified as {state}");

    let mut findings = Vec::new();
    let mut probe = None;
    let redirect = match state {
        RootConfigState::PlatformNative => {
            findings.push(Finding::pass("All platform A-records present"));
            let expected = config.www_redirect_target();
            let url = format!("https://{domain}");
            let response = match http.probe(&url, config.timeouts.http()).await {
                Ok(response) => Some(response),
                Err(e) => {
                    warn!("[Root] {url}: {e}");
                    None
                }
            };
            let redirect = verify_redirect(response.as_ref(), &expected);
            findings.push(redirect_finding(&redirect, &expected));
            probe = response;
            redirect
        }
        RootConfigState::RegistrarForwarding => {
            findings.push(Finding::pass(
                "Registrar DNS-forwarding detected — redirect is handled by the registrar \
                 and cannot be verified from here. Recommend switching to the platform A-records",
            ));
            RedirectCheck::Delegated
        }
        RootConfigState::Misconfigured => {
            findings.push(Finding::fail(format!(
                "Root A-records misconfigured — found [{}], expected platform [{}] or forwarding [{}]",
                join_addrs(&observed),
                join_addrs(&config.platform_addresses),
                join_addrs(&config.forwarding_addresses),
            )));
            RedirectCheck::NotApplicable
        }
    };

    RootConfigReport {
        observed,
        state,
        redirect,
        probe,
        expected_platform: config.platform_addresses.clone(),
        expected_forwarding: config.forwarding_addresses.clone(),
        findings,
    }
}

/// Pass only on status `301` with `Location` exactly equal to `expected`.
pub fn verify_redirect(response: Option<&ProbeResponse>, expected: &str) -> RedirectCheck {
    match response {
        Some(r) if r.status_code == 301 && r.location.as_deref() == Some(expected) => {
            RedirectCheck::Verified {
                status: r.status_code,
                location: expected.to_string(),
            }
        }
        Some(r) => RedirectCheck::Failed {
            status: Some(r.status_code),
            location: r.location.clone(),
        },
        None => RedirectCheck::Failed {
            status: None,
            location: None,
        },
    }
}

fn redirect_finding(redirect: &RedirectCheck, expected: &str) -> Finding {
    match redirect {
        RedirectCheck::Verified { .. } => Finding::pass(format!("HTTP 301 → {expected}")),
        RedirectCheck::Failed { status, location } => Finding::fail(format!(
            "Root redirect incorrect — expected 301 → {expected}, got {} → {}",
            status.map_or_else(|| "no response".to_string(), |s| s.to_string()),
            location.as_deref().unwrap_or("(no Location)")
        )),
        RedirectCheck::Delegated | RedirectCheck::NotApplicable => {
            Finding::skipped("No redirect check")
        }
    }
}

fn join_addrs(addrs: &[Ipv4Addr]) -> String {
    addrs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
