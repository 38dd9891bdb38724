//! Collaborator capability abstractions
//!
//! The engine only talks to the network through these traits; production
//! adapters live in [`crate::adapters`], mocks in the test utilities.

mod diagnostics;
mod network;

pub use diagnostics::DiagnosticRunner;
pub use network::{DnsResolver, HttpProbe, ReachabilityProbe};
