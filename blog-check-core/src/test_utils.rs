//! Test helpers
//!
//! Mock capability implementations and fixture factories.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::AuditConfig;
use crate::error::{AuditError, AuditResult};
use crate::traits::{DiagnosticRunner, DnsResolver, HttpProbe, ReachabilityProbe};
use crate::types::{
    DiagnosticOutput, DiagnosticTool, ExpectedRecord, HttpHeader, Nameserver, ProbeResponse,
    RecordType,
};

type AnswerKey = (String, RecordType, Nameserver);

// ===== MockDnsResolver =====

/// Canned answers keyed by `(name, type, nameserver)`; unknown keys answer empty.
pub struct MockDnsResolver {
    answers: RwLock<HashMap<AnswerKey, Vec<String>>>,
    unavailable: HashSet<Nameserver>,
    queries: AtomicUsize,
}

impl MockDnsResolver {
    pub fn new() -> Self {
        Self {
            answers: RwLock::new(HashMap::new()),
            unavailable: HashSet::new(),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn with_answer(
        mut self,
        name: &str,
        record_type: RecordType,
        nameserver: &Nameserver,
        answers: &[&str],
    ) -> Self {
        self.answers.get_mut().insert(
            (name.to_string(), record_type, nameserver.clone()),
            answers.iter().map(|a| (*a).to_string()).collect(),
        );
        self
    }

    /// Publish `name CNAME target` on the default resolver, every configured
    /// public resolver and every listed authoritative nameserver.
    pub fn with_propagated(
        self,
        name: &str,
        target: &str,
        config: &AuditConfig,
        authoritative: &[String],
    ) -> Self {
        let nameservers = std::iter::once(Nameserver::System)
            .chain(
                config
                    .public_resolvers
                    .iter()
                    .map(|r| Nameserver::Address(r.ip)),
            )
            .chain(authoritative.iter().cloned().map(Nameserver::Host));
        nameservers.fold(self, |mock, ns| {
            mock.with_answer(name, RecordType::Cname, &ns, &[target])
        })
    }

    /// Every query against `nameserver` fails with `ResolverUnavailable`.
    pub fn unavailable(mut self, nameserver: Nameserver) -> Self {
        self.unavailable.insert(nameserver);
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsResolver for MockDnsResolver {
    async fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
        nameserver: &Nameserver,
    ) -> AuditResult<Vec<String>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.contains(nameserver) {
            return Err(AuditError::ResolverUnavailable(nameserver.to_string()));
        }
        let key = (name.to_string(), record_type, nameserver.clone());
        Ok(self
            .answers
            .read()
            .await
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

// ===== MockHttpProbe =====

/// Canned responses keyed by URL; unknown URLs fail with a network error.
pub struct MockHttpProbe {
    responses: RwLock<HashMap<String, ProbeResponse>>,
    calls: AtomicUsize,
}

impl MockHttpProbe {
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn response(url: &str, status_code: u16, location: Option<&str>) -> ProbeResponse {
        ProbeResponse {
            url: url.to_string(),
            status_code,
            location: location.map(String::from),
            headers: location
                .map(|l| HttpHeader {
                    name: "location".to_string(),
                    value: l.to_string(),
                })
                .into_iter()
                .collect(),
        }
    }

    pub fn with_status(mut self, url: &str, status_code: u16) -> Self {
        self.responses
            .get_mut()
            .insert(url.to_string(), Self::response(url, status_code, None));
        self
    }

    pub fn with_redirect(mut self, url: &str, status_code: u16, location: &str) -> Self {
        self.responses.get_mut().insert(
            url.to_string(),
            Self::response(url, status_code, Some(location)),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpProbe for MockHttpProbe {
    async fn probe(&self, url: &str, _timeout: std::time::Duration) -> AuditResult<ProbeResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| AuditError::Network(format!("connection refused: {url}")))
    }
}

// ===== MockReachability =====

pub struct MockReachability {
    reachable: bool,
    calls: AtomicUsize,
}

impl MockReachability {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReachabilityProbe for MockReachability {
    async fn reachable(&self, _address: IpAddr, _timeout: std::time::Duration) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

// ===== MockDiagnosticRunner =====

/// Canned tool output; tools without output fail as if not installed.
pub struct MockDiagnosticRunner {
    outputs: RwLock<HashMap<DiagnosticTool, DiagnosticOutput>>,
    calls: AtomicUsize,
}

impl MockDiagnosticRunner {
    pub fn new() -> Self {
        Self {
            outputs: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_output(mut self, tool: DiagnosticTool, stdout: &str) -> Self {
        self.outputs.get_mut().insert(
            tool,
            DiagnosticOutput {
                stdout: stdout.to_string(),
                success: true,
            },
        );
        self
    }

    /// The tool runs but exits non-zero.
    pub fn with_failed_output(mut self, tool: DiagnosticTool, stdout: &str) -> Self {
        self.outputs.get_mut().insert(
            tool,
            DiagnosticOutput {
                stdout: stdout.to_string(),
                success: false,
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagnosticRunner for MockDiagnosticRunner {
    async fn run(&self, tool: DiagnosticTool, _domain: &str) -> AuditResult<DiagnosticOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outputs
            .read()
            .await
            .get(&tool)
            .cloned()
            .ok_or_else(|| AuditError::Io(format!("{}: not found", tool.program())))
    }
}

// ===== Fixtures =====

/// `example.com` with a www, a blog subdomain and a verification record.
#[allow(clippy::expect_used)]
pub fn sample_config() -> AuditConfig {
    AuditConfig {
        domain: "example.com".to_string(),
        records: vec![
            ExpectedRecord::www("ghs.google.com"),
            ExpectedRecord::subdomain("blog", "example.blogspot.com"),
            ExpectedRecord::verification("abcd1234", "gv-xxxxxxx.dv.googlehosted.com"),
        ],
        ..AuditConfig::default()
    }
    .validate()
    .expect("sample config is valid")
}

/// Google public DNS, first public resolver of the default config.
pub fn google() -> Nameserver {
    Nameserver::Address(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)))
}
