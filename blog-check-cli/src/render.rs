//! Human-readable report rendering.

use blog_check_core::types::{
    DebugDump, DiagnosticsReport, HttpsStatus, NameserverReport, RecordAuditResult,
    RootConfigReport, SelfTestReport,
};
use blog_check_core::{AuditError, AuditOutcome, AuditReport, CheckStatus, Finding};
use colored::Colorize;

fn header(title: &str) -> String {
    format!("\n===== {title} =====").bold().to_string()
}

fn symbol(status: CheckStatus) -> String {
    match status {
        CheckStatus::Pass => "✓".green().bold().to_string(),
        CheckStatus::Warn => "⚠".yellow().bold().to_string(),
        CheckStatus::Fail => "✗".red().bold().to_string(),
        CheckStatus::Skipped => "-".dimmed().to_string(),
    }
}

fn finding(out: &mut Vec<String>, indent: &str, finding: &Finding) {
    out.push(format!("{indent}{} {}", symbol(finding.status), finding.message));
}

fn label(text: &str) -> String {
    text.cyan().to_string()
}

/// Render the whole report, one section per stage.
pub fn render_report(report: &AuditReport) -> String {
    let mut out = vec![format!(
        "Auditing {} ({})",
        report.domain.bold(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )];

    self_test(&mut out, &report.self_test);
    nameservers(&mut out, &report.nameservers);

    out.push(header("DNS Records"));
    for record in &report.records {
        record_section(&mut out, record);
    }

    root(&mut out, &report.root);
    https(&mut out, &report.https);

    if let Some(diagnostics) = &report.diagnostics {
        advanced(&mut out, diagnostics);
    }
    if let Some(debug) = &report.debug {
        debug_section(&mut out, debug);
    }

    out.push(header("Summary"));
    let summary = match report.outcome() {
        AuditOutcome::Clean => "All checks passed".green().bold(),
        AuditOutcome::Warnings => "Completed with warnings".yellow().bold(),
        AuditOutcome::Failures => "Configuration problems found".red().bold(),
    };
    out.push(format!("{summary} ({} ms)", report.duration_ms));
    out.join("\n")
}

fn self_test(out: &mut Vec<String>, report: &SelfTestReport) {
    out.push(header("Self-Test"));
    for f in &report.findings {
        finding(out, "", f);
    }
}

fn nameservers(out: &mut Vec<String>, report: &NameserverReport) {
    out.push(header("Nameservers"));
    for f in &report.findings {
        finding(out, "", f);
    }
}

fn record_section(out: &mut Vec<String>, record: &RecordAuditResult) {
    out.push(format!(
        "{} {} {}",
        symbol(record.status),
        record.fqdn.bold(),
        format!("(expects {})", record.expected_target).dimmed()
    ));
    for f in &record.findings {
        finding(out, "    ", f);
    }
    if let Some(ip) = &record.resolved_ip {
        out.push(format!("    {}: {ip}", label("Resolved IP")));
    }
    for anomaly in &record.anomalies {
        out.push(format!("    {}: {}", label("Anomaly"), anomaly.to_string().yellow()));
    }
    for (group, tally) in [("Public", &record.public), ("Authoritative", &record.authoritative)] {
        if tally.total == 0 {
            continue;
        }
        out.push(format!("    {} {tally}", label(group)));
        for server in &tally.servers {
            let answer = server.answer.as_deref().unwrap_or("(no answer)");
            let mark = if server.agrees {
                "✓".green()
            } else {
                "✗".red()
            };
            out.push(format!("      {mark} {:<32} {answer}", server.server));
        }
    }
}

fn root(out: &mut Vec<String>, report: &RootConfigReport) {
    out.push(header("Root Domain"));
    let observed = if report.observed.is_empty() {
        "(none)".to_string()
    } else {
        report
            .observed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    out.push(format!("{}: {observed}", label("A-records")));
    out.push(format!("{}: {}", label("Classification"), report.state));
    for f in &report.findings {
        finding(out, "", f);
    }
}

fn https(out: &mut Vec<String>, report: &HttpsStatus) {
    out.push(header("HTTPS"));
    for f in &report.findings {
        finding(out, "", f);
    }
}

fn advanced(out: &mut Vec<String>, report: &DiagnosticsReport) {
    out.push(header("Advanced Diagnostics"));
    if report.steps.is_empty() {
        out.push("No diagnostic tools installed".dimmed().to_string());
    }
    for step in &report.steps {
        out.push(format!("{} {}", symbol(step.status), step.tool.to_string().bold()));
        if let Some(output) = &step.output {
            out.extend(output.lines().map(|line| format!("    {line}")));
        }
    }
}

fn debug_section(out: &mut Vec<String>, dump: &DebugDump) {
    out.push(header("Debug"));
    match &dump.dns_trace {
        Some(trace) => {
            out.push(label("dig +trace"));
            out.extend(trace.lines().map(|line| format!("    {line}")));
        }
        None => out.push("dig not available, no delegation trace".dimmed().to_string()),
    }
    for response in &dump.responses {
        out.push(label(&response.url));
        out.extend(
            response
                .raw()
                .lines()
                .map(|line| format!("    {line}")),
        );
    }
}

/// One-line rendering of a fatal error.
pub fn render_error(error: &anyhow::Error) -> String {
    let prefix = match error.downcast_ref::<AuditError>() {
        Some(AuditError::SelfTestFailed(_)) => "Environment check failed, aborting:",
        Some(AuditError::InvalidConfig(_)) => "Configuration error:",
        _ => "Error:",
    };
    format!("{} {} {error:#}", "✗".red().bold(), prefix.red().bold())
}
