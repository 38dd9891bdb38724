//! DNS, HTTP and reachability capability traits

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AuditResult;
use crate::types::{Nameserver, ProbeResponse, RecordType};

/// DNS query capability with nameserver override.
///
/// Implementations:
/// - `HickoryDnsResolver` (hickory-resolver, production)
/// - `MockDnsResolver` (tests)
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Resolve `name` for `record_type` against `nameserver`.
    ///
    /// # Returns
    /// * `Ok(answers)` - ordered answers, empty on NXDOMAIN, no data or timeout
    /// * `Err(AuditError::ResolverUnavailable)` - the query could not be issued at all
    ///
    /// Names in answers carry no trailing dot and are lower-cased.
    async fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
        nameserver: &Nameserver,
    ) -> AuditResult<Vec<String>>;
}

/// Header-only HTTP probe that never follows redirects.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Fetch `url` and return status, `Location` and headers, bounded by `timeout`.
    async fn probe(&self, url: &str, timeout: Duration) -> AuditResult<ProbeResponse>;
}

/// Host reachability check, the stand-in for ICMP ping.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn reachable(&self, address: IpAddr, timeout: Duration) -> bool;
}
