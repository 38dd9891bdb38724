//! Audit pipeline façade.
//!
//! [`AuditService`] owns the configuration and the capability handles and
//! drives the stages in order. Each stage is also exposed on its own.

mod diagnostics;
mod https_status;
mod nameserver;
mod record_audit;
mod root_config;
mod self_test;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use log::info;

pub use nameserver::is_glue_style;
pub use record_audit::propagation_finding;
pub use root_config::{classify_addresses, verify_redirect};

use crate::adapters::{
    HickoryDnsResolver, ProcessDiagnosticRunner, ReqwestHttpProbe, TcpReachabilityProbe,
};
use crate::capabilities::Capabilities;
use crate::config::AuditConfig;
use crate::error::AuditResult;
use crate::traits::{DiagnosticRunner, DnsResolver, HttpProbe, ReachabilityProbe};
use crate::types::{
    AuditOptions, AuditReport, DebugDump, DiagnosticsReport, HttpsStatus, NameserverReport,
    ProbeResponse, RecordAuditResult, RootConfigReport, SelfTestReport,
};

/// Runs a blog custom-domain audit.
///
/// ```rust,no_run
/// use blog_check_core::{AuditConfig, AuditOptions, AuditService, Capabilities};
/// # async fn demo() -> blog_check_core::AuditResult<()> {
/// let config = AuditConfig::for_domain("example.com")?;
/// let service = AuditService::system(config, Capabilities::detect())?;
/// let report = service.run(&AuditOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuditService {
    config: Arc<AuditConfig>,
    resolver: Arc<dyn DnsResolver>,
    http: Arc<dyn HttpProbe>,
    reachability: Arc<dyn ReachabilityProbe>,
    diagnostics: Option<Arc<dyn DiagnosticRunner>>,
    capabilities: Capabilities,
}

impl AuditService {
    /// Create a service without pass-through diagnostics.
    pub fn new(
        config: AuditConfig,
        resolver: Arc<dyn DnsResolver>,
        http: Arc<dyn HttpProbe>,
        reachability: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
            http,
            reachability,
            diagnostics: None,
            capabilities: Capabilities::none(),
        }
    }

    /// Attach a diagnostic runner and the tool availability snapshot.
    #[must_use]
    pub fn with_diagnostics(
        mut self,
        runner: Arc<dyn DiagnosticRunner>,
        capabilities: Capabilities,
    ) -> Self {
        self.diagnostics = Some(runner);
        self.capabilities = capabilities;
        self
    }

    /// Wire the production adapters.
    ///
    /// # Errors
    /// `CapabilityMissing` when the HTTP client cannot be built.
    pub fn system(config: AuditConfig, capabilities: Capabilities) -> AuditResult<Self> {
        let resolver = Arc::new(HickoryDnsResolver::new(config.timeouts.dns()));
        let http = Arc::new(ReqwestHttpProbe::new()?);
        let runner = Arc::new(ProcessDiagnosticRunner::new(
            config.traceroute_max_hops,
            config.timeouts.diagnostics(),
        ));
        Ok(Self::new(
            config,
            resolver,
            http,
            Arc::new(TcpReachabilityProbe::default()),
        )
        .with_diagnostics(runner, capabilities))
    }

    /// Environment self-test. An error here must abort the run.
    pub async fn self_test(&self) -> AuditResult<SelfTestReport> {
        self_test::self_test(
            self.resolver.as_ref(),
            self.http.as_ref(),
            self.reachability.as_ref(),
            &self.config,
        )
        .await
    }

    pub async fn nameservers(&self) -> NameserverReport {
        nameserver::nameserver_sanity(self.resolver.as_ref(), &self.config.domain).await
    }

    /// Audit every expected record concurrently, results in configuration order.
    pub async fn audit_records(&self, authoritative: &[String]) -> Vec<RecordAuditResult> {
        let resolver = self.resolver.as_ref();
        let config = self.config.as_ref();
        join_all(
            config
                .records
                .iter()
                .map(|record| record_audit::audit_record(resolver, config, record, authoritative)),
        )
        .await
    }

    pub async fn check_root(&self) -> RootConfigReport {
        root_config::check_root(self.resolver.as_ref(), self.http.as_ref(), &self.config).await
    }

    pub async fn https_status(&self) -> HttpsStatus {
        https_status::https_status(self.http.as_ref(), &self.config).await
    }

    pub async fn diagnostics(&self) -> DiagnosticsReport {
        diagnostics::run_diagnostics(
            self.diagnostics.as_deref(),
            &self.capabilities,
            &self.config.domain,
        )
        .await
    }

    pub async fn debug_dump(&self, responses: Vec<ProbeResponse>) -> DebugDump {
        diagnostics::debug_dump(
            self.diagnostics.as_deref(),
            &self.capabilities,
            &self.config.domain,
            responses,
        )
        .await
    }

    /// Run the full pipeline.
    ///
    /// # Errors
    /// Only a failed self-test aborts; every later stage degrades into findings.
    pub async fn run(&self, options: &AuditOptions) -> AuditResult<AuditReport> {
        let started_at = Utc::now();
        let start = Instant::now();
        let domain = self.config.domain.clone();
        info!("[Audit] Starting audit of {domain}");

        let self_test = self.self_test().await?;

        let nameservers = self.nameservers().await;
        let authoritative: Arc<[String]> = nameservers.nameservers.clone().into();

        info!("[Audit] Checking {} expected records", self.config.records.len());
        let records = self.audit_records(&authoritative).await;

        let (root, https) = tokio::join!(self.check_root(), self.https_status());

        let diagnostics = if options.advanced {
            info!("[Audit] Running advanced diagnostics");
            Some(self.diagnostics().await)
        } else {
            None
        };

        let debug = if options.debug {
            let responses = root
                .probe
                .iter()
                .chain(https.probes.iter())
                .cloned()
                .collect();
            Some(self.debug_dump(responses).await)
        } else {
            None
        };

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!("[Audit] Finished {domain} in {duration_ms}ms");

        Ok(AuditReport {
            domain,
            started_at,
            duration_ms,
            self_test,
            nameservers,
            records,
            root,
            https,
            diagnostics,
            debug,
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
#[allow(clippy::unwrap_used, clippy::panic)]
mod pipeline_tests;
