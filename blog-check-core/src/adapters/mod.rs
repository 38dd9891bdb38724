//! Production implementations of the capability traits.

mod hickory;
mod http;
mod process;
mod reachability;

pub use hickory::HickoryDnsResolver;
pub use http::ReqwestHttpProbe;
pub use process::ProcessDiagnosticRunner;
pub use reachability::{TcpReachabilityProbe, DEFAULT_REACHABILITY_PORT};
