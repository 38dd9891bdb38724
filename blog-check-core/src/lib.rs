//! Blog Check Core Library
//!
//! Audit engine for a hosted blog served under a custom domain:
//! - Environment self-test (DNS, reachability, HTTPS)
//! - Authoritative nameserver sanity
//! - Expected CNAME records and their propagation across public and authoritative resolvers
//! - Root-domain classification (platform A-records or registrar forwarding) and redirect check
//! - HTTPS availability and HTTP→HTTPS redirect
//!
//! Network access goes through the traits in [`traits`], so the whole pipeline
//! runs against mocks in tests.

pub mod adapters;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use capabilities::Capabilities;
pub use config::AuditConfig;
pub use error::{AuditError, AuditResult, SelfTestFailure};
pub use services::AuditService;
pub use traits::{DiagnosticRunner, DnsResolver, HttpProbe, ReachabilityProbe};
pub use types::{AuditOptions, AuditOutcome, AuditReport, CheckStatus, Finding};
