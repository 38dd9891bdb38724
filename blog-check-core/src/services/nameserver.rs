//! Authoritative nameserver sanity check.

use log::{info, warn};

use crate::traits::DnsResolver;
use crate::types::{Finding, NameserverReport, Nameserver, RecordType};

/// Fetch the domain's NS set and flag glue-style entries. Never fails.
pub async fn nameserver_sanity(resolver: &dyn DnsResolver, domain: &str) -> NameserverReport {
    let nameservers = match resolver
        .resolve(domain, RecordType::Ns, &Nameserver::System)
        .await
    {
        Ok(nameservers) => nameservers,
        Err(e) => {
            warn!("[NS] Lookup for {domain} failed: {e}");
            Vec::new()
        }
    };

    let glue_style: Vec<String> = nameservers
        .iter()
        .filter(|ns| is_glue_style(ns, domain))
        .cloned()
        .collect();

    let finding = if nameservers.is_empty() {
        Finding::warn(format!("No NS records found for {domain}"))
    } else if glue_style.is_empty() {
        Finding::pass(format!("Nameservers correct: {}", nameservers.join(", ")))
    } else {
        Finding::warn(format!(
            "Glue-style NS detected: {} (registrar is not serving a real zone)",
            glue_style.join(", ")
        ))
    };
    info!("[NS] {domain}: {}", finding.message);

    NameserverReport {
        nameservers,
        glue_style,
        findings: vec![finding],
    }
}

/// `true` when `nameserver` is `domain` itself or lives under it.
pub fn is_glue_style(nameserver: &str, domain: &str) -> bool {
    let nameserver = nameserver.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    nameserver == domain
        || nameserver
            .strip_suffix(&domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
