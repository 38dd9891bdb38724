//! Secure endpoint and insecure→secure redirect checks.

use log::{info, warn};

use crate::config::AuditConfig;
use crate::error::AuditResult;
use crate::traits::HttpProbe;
use crate::types::{Finding, HttpsStatus, ProbeResponse};

/// Probe `https://www.{domain}` and `http://www.{domain}` concurrently.
///
/// The insecure probe only needs a `301`; its `Location` is not inspected.
pub async fn https_status(http: &dyn HttpProbe, config: &AuditConfig) -> HttpsStatus {
    let secure_url = format!("https://www.{}", config.domain);
    let insecure_url = format!("http://www.{}", config.domain);
    let limit = config.timeouts.http();

    let (secure, insecure) = tokio::join!(
        http.probe(&secure_url, limit),
        http.probe(&insecure_url, limit)
    );

    let mut findings = Vec::with_capacity(2);
    let mut probes = Vec::with_capacity(2);

    let secure_status = status_of(&secure_url, &secure);
    let secure_reachable = secure_status == Some(200);
    findings.push(if secure_reachable {
        Finding::pass(format!("HTTPS reachable ({secure_url} → 200)"))
    } else {
        Finding::fail(format!(
            "HTTPS not reachable at {secure_url} ({})",
            describe(&secure)
        ))
    });

    let insecure_status = status_of(&insecure_url, &insecure);
    let insecure_redirects = insecure_status == Some(301);
    findings.push(if insecure_redirects {
        Finding::pass("HTTP → HTTPS redirect (301)")
    } else {
        Finding::fail(format!(
            "HTTP does not redirect with 301 at {insecure_url} ({})",
            describe(&insecure)
        ))
    });

    probes.extend(secure.ok());
    probes.extend(insecure.ok());
    info!("[HTTPS] secure={secure_reachable} insecure_redirects={insecure_redirects}");

    HttpsStatus {
        secure_reachable,
        insecure_redirects,
        secure_status,
        insecure_status,
        probes,
        findings,
    }
}

fn status_of(url: &str, result: &AuditResult<ProbeResponse>) -> Option<u16> {
    match result {
        Ok(response) => Some(response.status_code),
        Err(e) => {
            warn!("[HTTPS] {url}: {e}");
            None
        }
    }
}

fn describe(result: &AuditResult<ProbeResponse>) -> String {
    match result {
        Ok(response) => format!("got {}", response.status_code),
        Err(e) => e.to_string(),
    }
}
