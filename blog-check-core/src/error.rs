//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Audit engine error type.
///
/// Only [`InvalidConfig`](Self::InvalidConfig), [`CapabilityMissing`](Self::CapabilityMissing)
/// and [`SelfTestFailed`](Self::SelfTestFailed) ever leave [`crate::AuditService::run`];
/// the rest are absorbed by the stage that hit them and surface as a failed check.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum AuditError {
    /// Configuration rejected during validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The DNS capability could not be invoked at all (distinct from an empty answer)
    #[error("Resolver unavailable: {0}")]
    ResolverUnavailable(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Bounded operation exceeded its time limit
    #[error("{operation} timed out ({secs}s)")]
    Timeout { operation: String, secs: u64 },

    /// A required capability (DNS or HTTP) is absent
    #[error("Required capability missing: {0}")]
    CapabilityMissing(String),

    /// Environment self-test failed; the run is aborted
    #[error("Self-test failed: {0}")]
    SelfTestFailed(SelfTestFailure),

    /// I/O error (config file, subprocess)
    #[error("I/O error: {0}")]
    Io(String),
}

/// The self-test step that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum SelfTestFailure {
    #[error("DNS could not resolve reference host {host}")]
    DnsUnresolved { host: String },

    #[error("reference address {address} is unreachable")]
    Unreachable { address: String },

    #[error("HTTPS fetch of {url} returned {}", .status.map_or_else(|| "no response".to_string(), |s| s.to_string()))]
    HttpsStatus { url: String, status: Option<u16> },
}

impl From<std::io::Error> for AuditError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Audit Result type alias
pub type AuditResult<T> = std::result::Result<T, AuditError>;
