//! Public types consumed and returned by audit operations.

use std::collections::BTreeSet;
use std::fmt::{self, Write};
use std::net::{IpAddr, Ipv4Addr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DNS record type queried by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record.
    A,
    /// Canonical name (alias) record.
    Cname,
    /// Name server record.
    Ns,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::Cname => "CNAME",
            Self::Ns => "NS",
        };
        f.write_str(s)
    }
}

/// Nameserver a query is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Nameserver {
    /// The host's default resolver configuration.
    System,
    /// An explicit nameserver address (public resolvers).
    Address(IpAddr),
    /// A nameserver known only by hostname (authoritative NS records).
    Host(String),
}

impl fmt::Display for Nameserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Address(ip) => write!(f, "{ip}"),
            Self::Host(host) => f.write_str(host),
        }
    }
}

/// Role of an expected record in the platform's setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    /// Ownership-verification CNAME; must not resolve to an address itself.
    Verification,
    /// The `www` host serving the blog.
    Www,
    /// Any secondary subdomain mapping (e.g. `blog` → the hosted blog name).
    Subdomain,
}

/// One DNS mapping the audited domain must publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedRecord {
    /// Subdomain label, e.g. `www`.
    pub label: String,
    /// Expected CNAME target, e.g. `ghs.google.com`.
    pub target: String,
    pub kind: RecordKind,
}

impl ExpectedRecord {
    pub fn new(label: impl Into<String>, target: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
            kind,
        }
    }

    pub fn www(target: impl Into<String>) -> Self {
        Self::new("www", target, RecordKind::Www)
    }

    pub fn verification(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(label, target, RecordKind::Verification)
    }

    pub fn subdomain(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(label, target, RecordKind::Subdomain)
    }

    /// Fully qualified name of this record under `domain`.
    pub fn fqdn(&self, domain: &str) -> String {
        format!("{}.{domain}", self.label)
    }
}

/// A public resolver used for propagation comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicResolver {
    /// Human-readable name (e.g. `"Google DNS"`).
    pub name: String,
    pub ip: IpAddr,
}

impl PublicResolver {
    pub fn new(name: &str, ip: IpAddr) -> Self {
        Self {
            name: name.to_string(),
            ip,
        }
    }
}

/// Outcome of a single check, ordered by severity (`max` yields the worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckStatus {
    Skipped,
    Pass,
    Warn,
    Fail,
}

/// A single reported line of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub status: CheckStatus,
    pub message: String,
}

impl Finding {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Pass,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Warn,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            message: message.into(),
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Skipped,
            message: message.into(),
        }
    }
}

/// Worst status among `findings`, or `Skipped` when there are none.
pub fn worst_status(findings: &[Finding]) -> CheckStatus {
    findings
        .iter()
        .map(|f| f.status)
        .max()
        .unwrap_or(CheckStatus::Skipped)
}

/// Single HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

/// Response of a single non-following HTTP probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    /// Probed URL.
    pub url: String,
    pub status_code: u16,
    /// Verbatim `Location` header, if any.
    pub location: Option<String>,
    pub headers: Vec<HttpHeader>,
}

impl ProbeResponse {
    /// Render as a raw HTTP/1.1 response head, for the debug dump.
    pub fn raw(&self) -> String {
        let mut raw = format!("HTTP/1.1 {}\r\n", self.status_code);
        for header in &self.headers {
            let _ = write!(raw, "{}: {}\r\n", header.name, header.value);
        }
        raw
    }
}

/// Result of the environment self-test. Only produced when every step passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfTestReport {
    pub reference_host: String,
    pub resolved_address: IpAddr,
    pub reachable: bool,
    pub https_status: u16,
    pub findings: Vec<Finding>,
}

/// Authoritative nameserver inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameserverReport {
    /// NS hostnames as published, trailing dot removed.
    pub nameservers: Vec<String>,
    /// Subset of `nameservers` that live inside the audited domain.
    pub glue_style: Vec<String>,
    pub findings: Vec<Finding>,
}

impl NameserverReport {
    pub fn status(&self) -> CheckStatus {
        worst_status(&self.findings)
    }
}

/// Non-fatal irregularity detected on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Anomaly {
    /// The ownership-verification name also answers an A query.
    #[serde(rename = "verification-record-resolves-to-A")]
    VerificationRecordResolvesToA,
    /// The published CNAME differs from the expected target.
    #[serde(rename = "target-mismatch")]
    TargetMismatch,
}

impl Anomaly {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VerificationRecordResolvesToA => "verification-record-resolves-to-A",
            Self::TargetMismatch => "target-mismatch",
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer observed from one resolver during propagation comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAnswer {
    /// Display label of the resolver (name or NS hostname).
    pub server: String,
    /// First CNAME answer, `None` on empty answer, error or timeout.
    pub answer: Option<String>,
    pub agrees: bool,
}

/// `agree/total` over one resolver group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationTally {
    pub agree: usize,
    pub total: usize,
    pub servers: Vec<ServerAnswer>,
}

impl PropagationTally {
    /// Build a tally from per-server answers; `agree <= total` by construction.
    pub fn from_answers(servers: Vec<ServerAnswer>) -> Self {
        let agree = servers.iter().filter(|s| s.agrees).count();
        Self {
            agree,
            total: servers.len(),
            servers,
        }
    }

    /// Agreement ratio in `0.0..=1.0`, `None` when no server was queried.
    pub fn ratio(&self) -> Option<f32> {
        if self.total == 0 {
            return None;
        }
        // usize -> f32: resolver counts are tiny
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.agree as f32 / self.total as f32;
        Some(ratio)
    }
}

impl fmt::Display for PropagationTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.agree, self.total)
    }
}

/// Audit result for one expected record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAuditResult {
    pub fqdn: String,
    pub label: String,
    pub kind: RecordKind,
    pub expected_target: String,
    /// CNAME seen by the default resolver; `None` means the record is missing.
    pub resolved_cname: Option<String>,
    /// Informational address of the CNAME target.
    pub resolved_ip: Option<String>,
    pub public: PropagationTally,
    pub authoritative: PropagationTally,
    pub anomalies: BTreeSet<Anomaly>,
    pub status: CheckStatus,
    pub findings: Vec<Finding>,
}

impl RecordAuditResult {
    pub const fn is_missing(&self) -> bool {
        self.resolved_cname.is_none()
    }
}

/// How the bare root domain is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RootConfigState {
    /// Exactly the platform's canonical A-records.
    PlatformNative,
    /// Exactly the registrar's forwarding pool.
    RegistrarForwarding,
    /// Anything else, including partial overlap with either set.
    Misconfigured,
}

impl fmt::Display for RootConfigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PlatformNative => "platform-native",
            Self::RegistrarForwarding => "registrar-forwarding",
            Self::Misconfigured => "misconfigured",
        };
        f.write_str(s)
    }
}

/// Root-domain redirect verification, selected by [`RootConfigState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum RedirectCheck {
    /// `301` to exactly `https://www.{domain}/`.
    #[serde(rename_all = "camelCase")]
    Verified { status: u16, location: String },
    /// Wrong status, wrong target, or no response.
    #[serde(rename_all = "camelCase")]
    Failed {
        status: Option<u16>,
        location: Option<String>,
    },
    /// Redirect is the registrar's responsibility.
    Delegated,
    /// No redirect check applies (misconfigured root).
    NotApplicable,
}

/// Root configuration classification and forwarding check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootConfigReport {
    pub observed: Vec<Ipv4Addr>,
    pub state: RootConfigState,
    pub redirect: RedirectCheck,
    /// Root HTTPS probe, kept for the debug dump.
    pub probe: Option<ProbeResponse>,
    pub expected_platform: Vec<Ipv4Addr>,
    pub expected_forwarding: Vec<Ipv4Addr>,
    pub findings: Vec<Finding>,
}

impl RootConfigReport {
    pub fn status(&self) -> CheckStatus {
        worst_status(&self.findings)
    }
}

/// Secure endpoint availability and insecure→secure redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpsStatus {
    pub secure_reachable: bool,
    pub insecure_redirects: bool,
    pub secure_status: Option<u16>,
    pub insecure_status: Option<u16>,
    pub probes: Vec<ProbeResponse>,
    pub findings: Vec<Finding>,
}

impl HttpsStatus {
    pub fn status(&self) -> CheckStatus {
        worst_status(&self.findings)
    }
}

/// External pass-through diagnostic tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticTool {
    /// Bounded-hop network path trace.
    Traceroute,
    /// Passive subdomain enumeration.
    Subfinder,
    /// Raw delegation trace (`dig +trace`), debug only.
    DigTrace,
}

impl DiagnosticTool {
    /// Executable looked up on `PATH`.
    pub const fn program(self) -> &'static str {
        match self {
            Self::Traceroute => "traceroute",
            Self::Subfinder => "subfinder",
            Self::DigTrace => "dig",
        }
    }
}

impl fmt::Display for DiagnosticTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Traceroute => "traceroute",
            Self::Subfinder => "subdomain enumeration",
            Self::DigTrace => "dig +trace",
        };
        f.write_str(s)
    }
}

/// Raw output of a diagnostic tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticOutput {
    pub stdout: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticStep {
    pub tool: DiagnosticTool,
    pub status: CheckStatus,
    /// Raw tool output, or the error that prevented it.
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub steps: Vec<DiagnosticStep>,
}

/// Raw material for deep troubleshooting (`--debug`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugDump {
    pub dns_trace: Option<String>,
    /// Every HTTP response collected during the run, in probe order.
    pub responses: Vec<ProbeResponse>,
}

/// Options selecting the optional stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditOptions {
    pub advanced: bool,
    pub debug: bool,
}

/// Aggregate verdict of an audit run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditOutcome {
    Clean,
    Warnings,
    Failures,
}

/// Everything a single audit run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub domain: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub self_test: SelfTestReport,
    pub nameservers: NameserverReport,
    pub records: Vec<RecordAuditResult>,
    pub root: RootConfigReport,
    pub https: HttpsStatus,
    pub diagnostics: Option<DiagnosticsReport>,
    pub debug: Option<DebugDump>,
}

impl AuditReport {
    /// Worst status over the domain checks (self-test and diagnostics excluded).
    pub fn worst_status(&self) -> CheckStatus {
        let records = self.records.iter().map(|r| r.status);
        [self.nameservers.status(), self.root.status(), self.https.status()]
            .into_iter()
            .chain(records)
            .max()
            .unwrap_or(CheckStatus::Skipped)
    }

    pub fn outcome(&self) -> AuditOutcome {
        match self.worst_status() {
            CheckStatus::Fail => AuditOutcome::Failures,
            CheckStatus::Warn => AuditOutcome::Warnings,
            CheckStatus::Pass | CheckStatus::Skipped => AuditOutcome::Clean,
        }
    }
}
