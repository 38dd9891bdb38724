//! TCP connect reachability, used where ICMP echo needs privileges we don't have.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::traits::ReachabilityProbe;

/// Port probed when none is given.
pub const DEFAULT_REACHABILITY_PORT: u16 = 443;

#[derive(Debug, Clone, Copy)]
pub struct TcpReachabilityProbe {
    port: u16,
}

impl Default for TcpReachabilityProbe {
    fn default() -> Self {
        Self::new(DEFAULT_REACHABILITY_PORT)
    }
}

impl TcpReachabilityProbe {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl ReachabilityProbe for TcpReachabilityProbe {
    async fn reachable(&self, address: IpAddr, limit: Duration) -> bool {
        let target = SocketAddr::new(address, self.port);
        match timeout(limit, TcpStream::connect(target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("[Reach] {target}: {e}");
                false
            }
            Err(_) => {
                debug!("[Reach] {target}: timed out ({}s)", limit.as_secs());
                false
            }
        }
    }
}
