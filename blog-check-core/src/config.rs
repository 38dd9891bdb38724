//! Audit configuration: target domain, expected records and reference sets.
//!
//! Loaded once at startup and shared read-only (`Arc<AuditConfig>`) by every stage.

use std::collections::{BTreeSet, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};
use crate::types::{ExpectedRecord, PublicResolver, RecordKind};

/// The platform's four canonical root A-records.
pub const PLATFORM_ADDRESSES: [Ipv4Addr; 4] = [
    Ipv4Addr::new(216, 239, 32, 21),
    Ipv4Addr::new(216, 239, 34, 21),
    Ipv4Addr::new(216, 239, 36, 21),
    Ipv4Addr::new(216, 239, 38, 21),
];

/// The registrar's well-known forwarding pool.
pub const FORWARDING_ADDRESSES: [Ipv4Addr; 4] = [
    Ipv4Addr::new(198, 49, 23, 144),
    Ipv4Addr::new(198, 49, 23, 145),
    Ipv4Addr::new(198, 185, 159, 144),
    Ipv4Addr::new(198, 185, 159, 145),
];

/// Default CNAME target of the `www` host.
pub const DEFAULT_WWW_TARGET: &str = "ghs.google.com";

/// Host used by the environment self-test.
pub const DEFAULT_REFERENCE_HOST: &str = "www.google.com";

fn default_public_resolvers() -> Vec<PublicResolver> {
    vec![
        PublicResolver::new("Google DNS", IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))),
        PublicResolver::new("Cloudflare DNS", IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))),
        PublicResolver::new("Quad9 DNS", IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9))),
    ]
}

/// Per-operation time limits, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timeouts {
    pub dns_secs: u64,
    pub http_secs: u64,
    pub reachability_secs: u64,
    pub diagnostics_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            dns_secs: 5,
            http_secs: 5,
            reachability_secs: 3,
            diagnostics_secs: 60,
        }
    }
}

impl Timeouts {
    pub const fn dns(&self) -> Duration {
        Duration::from_secs(self.dns_secs)
    }

    pub const fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }

    pub const fn reachability(&self) -> Duration {
        Duration::from_secs(self.reachability_secs)
    }

    pub const fn diagnostics(&self) -> Duration {
        Duration::from_secs(self.diagnostics_secs)
    }
}

/// Process-wide audit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    /// Audited custom domain, e.g. `example.com`.
    pub domain: String,
    pub records: Vec<ExpectedRecord>,
    pub platform_addresses: Vec<Ipv4Addr>,
    pub forwarding_addresses: Vec<Ipv4Addr>,
    pub public_resolvers: Vec<PublicResolver>,
    pub reference_host: String,
    pub timeouts: Timeouts,
    /// Minimum `agree/total` per resolver group for a record to pass.
    pub propagation_threshold: f32,
    pub traceroute_max_hops: u8,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            records: vec![ExpectedRecord::www(DEFAULT_WWW_TARGET)],
            platform_addresses: PLATFORM_ADDRESSES.to_vec(),
            forwarding_addresses: FORWARDING_ADDRESSES.to_vec(),
            public_resolvers: default_public_resolvers(),
            reference_host: DEFAULT_REFERENCE_HOST.to_string(),
            timeouts: Timeouts::default(),
            propagation_threshold: 1.0,
            traceroute_max_hops: 4,
        }
    }
}

impl AuditConfig {
    /// Default configuration for `domain`, validated.
    pub fn for_domain(domain: &str) -> AuditResult<Self> {
        Self {
            domain: domain.to_string(),
            ..Self::default()
        }
        .validate()
    }

    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> AuditResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuditError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> AuditResult<Self> {
        serde_json::from_str(content).map_err(|e| AuditError::InvalidConfig(e.to_string()))
    }

    /// Validate and normalise. Consumes `self` so that only validated configs circulate.
    pub fn validate(mut self) -> AuditResult<Self> {
        self.domain = validate_domain(&self.domain)?;
        self.reference_host = validate_domain(&self.reference_host)?;

        if self.records.is_empty() {
            return Err(AuditError::InvalidConfig(
                "at least one expected record is required".to_string(),
            ));
        }
        let mut labels = HashSet::new();
        for record in &mut self.records {
            record.label = normalize_label(&record.label)?;
            record.target = normalize_target(&record.target)?;
            if !labels.insert(record.label.clone()) {
                return Err(AuditError::InvalidConfig(format!(
                    "duplicate record label: {}",
                    record.label
                )));
            }
        }
        let count = |kind: RecordKind| self.records.iter().filter(|r| r.kind == kind).count();
        if count(RecordKind::Www) != 1 {
            return Err(AuditError::InvalidConfig(
                "exactly one www record is required".to_string(),
            ));
        }
        if count(RecordKind::Verification) > 1 {
            return Err(AuditError::InvalidConfig(
                "at most one verification record is allowed".to_string(),
            ));
        }

        let platform: BTreeSet<_> = self.platform_addresses.iter().collect();
        let forwarding: BTreeSet<_> = self.forwarding_addresses.iter().collect();
        if platform.is_empty() || forwarding.is_empty() {
            return Err(AuditError::InvalidConfig(
                "platform and forwarding address sets must not be empty".to_string(),
            ));
        }
        if !platform.is_disjoint(&forwarding) {
            return Err(AuditError::InvalidConfig(
                "platform and forwarding address sets must be disjoint".to_string(),
            ));
        }

        if self.public_resolvers.is_empty() {
            return Err(AuditError::InvalidConfig(
                "at least one public resolver is required".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.propagation_threshold) {
            return Err(AuditError::InvalidConfig(format!(
                "propagation threshold must be within 0.0..=1.0 (got {})",
                self.propagation_threshold
            )));
        }
        let t = self.timeouts;
        if [t.dns_secs, t.http_secs, t.reachability_secs, t.diagnostics_secs].contains(&0) {
            return Err(AuditError::InvalidConfig(
                "timeouts must be at least 1 second".to_string(),
            ));
        }
        if self.traceroute_max_hops == 0 {
            return Err(AuditError::InvalidConfig(
                "traceroute max hops must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    /// `https://www.{domain}/`, the only acceptable root redirect target.
    pub fn www_redirect_target(&self) -> String {
        format!("https://www.{}/", self.domain)
    }
}

/// Validate and normalise a domain name.
///
/// Trims whitespace and a trailing dot, converts internationalised names to
/// ASCII via IDNA 2008, and rejects empty, overlong or IP-literal inputs.
pub fn validate_domain(domain: &str) -> AuditResult<String> {
    let domain = domain.trim().trim_end_matches('.');
    if domain.is_empty() {
        return Err(AuditError::InvalidConfig(
            "Domain name is required".to_string(),
        ));
    }
    if domain.parse::<IpAddr>().is_ok() {
        return Err(AuditError::InvalidConfig(format!(
            "Expected a domain name, got an IP address: {domain}"
        )));
    }
    let ascii_domain = idna::domain_to_ascii_strict(domain)
        .map_err(|_| AuditError::InvalidConfig(format!("Invalid domain name: {domain}")))?;
    if ascii_domain.len() > 253 {
        return Err(AuditError::InvalidConfig(format!(
            "Domain name exceeds maximum length of 253 characters (got {})",
            ascii_domain.len()
        )));
    }
    Ok(ascii_domain)
}

fn normalize_label(label: &str) -> AuditResult<String> {
    let label = label.trim().trim_matches('.').to_ascii_lowercase();
    if label.is_empty() {
        return Err(AuditError::InvalidConfig(
            "record label must not be empty".to_string(),
        ));
    }
    if label
        .split('.')
        .any(|part| part.is_empty() || part.len() > 63)
    {
        return Err(AuditError::InvalidConfig(format!(
            "invalid record label: {label}"
        )));
    }
    Ok(label)
}

fn normalize_target(target: &str) -> AuditResult<String> {
    validate_domain(target).map_err(|_| {
        AuditError::InvalidConfig(format!("invalid record target: {}", target.trim()))
    })
}
