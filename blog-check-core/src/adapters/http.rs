//! reqwest backed [`HttpProbe`].

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::LOCATION;
use reqwest::{redirect::Policy, Client};
use tokio::time::timeout;
use url::Url;

use crate::error::{AuditError, AuditResult};
use crate::traits::HttpProbe;
use crate::types::{HttpHeader, ProbeResponse};

/// HEAD-only probe with redirects disabled, so callers see the exact
/// `Location` the server sent.
pub struct ReqwestHttpProbe {
    client: Client,
}

impl ReqwestHttpProbe {
    pub fn new() -> AuditResult<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .user_agent(concat!("blog-check/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuditError::CapabilityMissing(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProbe for ReqwestHttpProbe {
    async fn probe(&self, url: &str, limit: Duration) -> AuditResult<ProbeResponse> {
        let parsed = Url::parse(url)
            .map_err(|e| AuditError::Network(format!("Invalid URL {url}: {e}")))?;
        debug!("[HTTP] HEAD {parsed}");

        let response = timeout(limit, self.client.head(parsed.as_str()).send())
            .await
            .map_err(|_| AuditError::Timeout {
                operation: format!("HEAD {url}"),
                secs: limit.as_secs(),
            })?
            .map_err(|e| AuditError::Network(format!("HTTP request failed: {e}")))?;

        let status_code = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let headers: Vec<HttpHeader> = response
            .headers()
            .iter()
            .map(|(name, value)| HttpHeader {
                name: name.to_string(),
                value: value.to_str().unwrap_or("<binary>").to_string(),
            })
            .collect();

        debug!(
            "[HTTP] {url} -> status={status_code}, location={location:?}, headers={}",
            headers.len()
        );

        Ok(ProbeResponse {
            url: url.to_string(),
            status_code,
            location,
            headers,
        })
    }
}
