//! Optional pass-through diagnostics (`--advanced`) and debug dump (`--debug`).

use log::{debug, warn};

use crate::capabilities::Capabilities;
use crate::traits::DiagnosticRunner;
use crate::types::{
    CheckStatus, DebugDump, DiagnosticStep, DiagnosticTool, DiagnosticsReport, ProbeResponse,
};

const ADVANCED_TOOLS: [DiagnosticTool; 2] = [DiagnosticTool::Traceroute, DiagnosticTool::Subfinder];

/// Run the advanced tools that are installed. Absent tools are silently skipped.
pub async fn run_diagnostics(
    runner: Option<&dyn DiagnosticRunner>,
    capabilities: &Capabilities,
    domain: &str,
) -> DiagnosticsReport {
    let Some(runner) = runner else {
        return DiagnosticsReport::default();
    };

    let mut steps = Vec::new();
    for tool in ADVANCED_TOOLS {
        if !capabilities.has(tool) {
            debug!("[Diag] {tool} not installed, skipping");
            continue;
        }
        steps.push(run_step(runner, tool, domain).await);
    }
    DiagnosticsReport { steps }
}

/// Collect the raw delegation trace and every HTTP response seen so far.
pub async fn debug_dump(
    runner: Option<&dyn DiagnosticRunner>,
    capabilities: &Capabilities,
    domain: &str,
    responses: Vec<ProbeResponse>,
) -> DebugDump {
    let dns_trace = match runner {
        Some(runner) if capabilities.has(DiagnosticTool::DigTrace) => {
            run_step(runner, DiagnosticTool::DigTrace, domain)
                .await
                .output
        }
        _ => {
            debug!("[Debug] dig not available, no delegation trace");
            None
        }
    };
    DebugDump {
        dns_trace,
        responses,
    }
}

async fn run_step(runner: &dyn DiagnosticRunner, tool: DiagnosticTool, domain: &str) -> DiagnosticStep {
    match runner.run(tool, domain).await {
        Ok(output) => {
            let status = if output.success {
                CheckStatus::Pass
            } else {
                warn!("[Diag] {tool} exited with a non-zero status");
                CheckStatus::Warn
            };
            DiagnosticStep {
                tool,
                status,
                output: Some(output.stdout),
            }
        }
        Err(e) => {
            warn!("[Diag] {tool} failed: {e}");
            DiagnosticStep {
                tool,
                status: CheckStatus::Warn,
                output: Some(e.to_string()),
            }
        }
    }
}
