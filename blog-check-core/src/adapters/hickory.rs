//! hickory-resolver backed [`DnsResolver`].

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::{
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    proto::rr::{Name, RecordType as WireType},
    TokioResolver,
};
use log::{debug, info, warn};
use tokio::time::timeout;

use crate::error::{AuditError, AuditResult};
use crate::traits::DnsResolver;
use crate::types::{Nameserver, RecordType};

/// Production resolver.
///
/// Queries against [`Nameserver::System`] reuse one resolver built from the
/// host configuration; explicit nameservers get a dedicated single-server
/// resolver per query. One attempt per query, no retries.
pub struct HickoryDnsResolver {
    system: TokioResolver,
    timeout: Duration,
}

impl HickoryDnsResolver {
    pub fn new(timeout: Duration) -> Self {
        let system = build_system_resolver(timeout);
        info!("[DNS] System resolver: {}", system_label());
        Self { system, timeout }
    }

    /// Address of a nameserver known by hostname, via the system resolver.
    async fn address_of(&self, host: &str) -> AuditResult<IpAddr> {
        let lookup = timeout(self.timeout, self.system.ipv4_lookup(host))
            .await
            .map_err(|_| {
                AuditError::ResolverUnavailable(format!("timed out resolving nameserver {host}"))
            })?
            .map_err(|e| {
                AuditError::ResolverUnavailable(format!("cannot resolve nameserver {host}: {e}"))
            })?;
        lookup
            .iter()
            .next()
            .map(|a| IpAddr::V4(a.0))
            .ok_or_else(|| {
                AuditError::ResolverUnavailable(format!("nameserver {host} has no address"))
            })
    }
}

#[async_trait]
impl DnsResolver for HickoryDnsResolver {
    async fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
        nameserver: &Nameserver,
    ) -> AuditResult<Vec<String>> {
        let dedicated = match nameserver {
            Nameserver::System => None,
            Nameserver::Address(ip) => Some(build_resolver_for_ns(*ip, self.timeout)),
            Nameserver::Host(host) => {
                let ip = self.address_of(host).await?;
                Some(build_resolver_for_ns(ip, self.timeout))
            }
        };
        let resolver = dedicated.as_ref().unwrap_or(&self.system);

        match timeout(self.timeout, query(resolver, name, record_type)).await {
            Ok(answers) => {
                debug!("[DNS] {record_type} {name} @{nameserver} -> {answers:?}");
                Ok(answers)
            }
            Err(_) => {
                debug!(
                    "[DNS] {record_type} {name} @{nameserver} timed out ({}s)",
                    self.timeout.as_secs()
                );
                Ok(Vec::new())
            }
        }
    }
}

async fn query(resolver: &TokioResolver, name: &str, record_type: RecordType) -> Vec<String> {
    match record_type {
        RecordType::A => match resolver.ipv4_lookup(name).await {
            Ok(response) => response.iter().map(|a| a.0.to_string()).collect(),
            Err(e) => {
                debug!("[DNS] A {name}: {e}");
                Vec::new()
            }
        },
        RecordType::Cname => match resolver.lookup(name, WireType::CNAME).await {
            Ok(response) => response
                .record_iter()
                .filter_map(|record| record.data().as_cname())
                .map(|cname| ascii_name(&cname.0))
                .collect(),
            Err(e) => {
                debug!("[DNS] CNAME {name}: {e}");
                Vec::new()
            }
        },
        RecordType::Ns => match resolver.ns_lookup(name).await {
            Ok(response) => response
                .iter()
                .map(|ns| ascii_name(&ns.0))
                .collect(),
            Err(e) => {
                debug!("[DNS] NS {name}: {e}");
                Vec::new()
            }
        },
    }
}

/// Punycode form of a wire name, matching what config validation stores.
fn ascii_name(name: &Name) -> String {
    normalize_name(&name.to_ascii())
}

/// Strip the root dot and lower-case a DNS name.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

fn single_attempt_opts(timeout: Duration) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 1;
    opts
}

/// Build a resolver that only talks to `ns_ip`.
fn build_resolver_for_ns(ns_ip: IpAddr, timeout: Duration) -> TokioResolver {
    let config = ResolverConfig::from_parts(
        None,
        vec![],
        NameServerConfigGroup::from_ips_clear(&[ns_ip], 53, true),
    );
    TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
        .with_options(single_attempt_opts(timeout))
        .build()
}

/// Build a resolver using the host system DNS configuration (with fallback).
fn build_system_resolver(timeout: Duration) -> TokioResolver {
    #[cfg(any(unix, target_os = "windows"))]
    {
        match TokioResolver::builder_tokio() {
            Ok(mut builder) => {
                let opts = builder.options_mut();
                opts.timeout = timeout;
                opts.attempts = 1;
                return builder.build();
            }
            Err(e) => {
                warn!("Failed to load system DNS configuration, falling back to defaults: {e}");
            }
        }
    }

    TokioResolver::builder_with_config(ResolverConfig::default(), TokioConnectionProvider::default())
        .with_options(single_attempt_opts(timeout))
        .build()
}

/// Human-readable description of the DNS servers used by the system resolver.
fn system_label() -> String {
    #[cfg(any(unix, target_os = "windows"))]
    {
        if let Ok((config, _opts)) = hickory_resolver::system_conf::read_system_conf() {
            let ips = dedup_ips(&config);
            if !ips.is_empty() {
                return ips.join(", ");
            }
        }
    }

    let ips = dedup_ips(&ResolverConfig::default());
    if ips.is_empty() {
        "Default".to_string()
    } else {
        ips.join(", ")
    }
}

/// Deduplicate nameserver IP addresses from a resolver configuration.
fn dedup_ips(config: &ResolverConfig) -> Vec<String> {
    let mut ips: Vec<String> = Vec::new();
    for ns in config.name_servers() {
        let ip = ns.socket_addr.ip().to_string();
        if !ips.contains(&ip) {
            ips.push(ip);
        }
    }
    ips
}
