//! Subprocess backed [`DiagnosticRunner`].

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{AuditError, AuditResult};
use crate::traits::DiagnosticRunner;
use crate::types::{DiagnosticOutput, DiagnosticTool};

/// Runs `traceroute`, `subfinder` and `dig +trace` and captures stdout.
#[derive(Debug, Clone, Copy)]
pub struct ProcessDiagnosticRunner {
    max_hops: u8,
    timeout: Duration,
}

impl ProcessDiagnosticRunner {
    pub const fn new(max_hops: u8, timeout: Duration) -> Self {
        Self { max_hops, timeout }
    }

    fn args(&self, tool: DiagnosticTool, domain: &str) -> Vec<String> {
        match tool {
            DiagnosticTool::Traceroute => {
                vec!["-m".to_string(), self.max_hops.to_string(), domain.to_string()]
            }
            DiagnosticTool::Subfinder => {
                vec!["-silent".to_string(), "-d".to_string(), domain.to_string()]
            }
            DiagnosticTool::DigTrace => vec!["+trace".to_string(), domain.to_string()],
        }
    }
}

#[async_trait]
impl DiagnosticRunner for ProcessDiagnosticRunner {
    async fn run(&self, tool: DiagnosticTool, domain: &str) -> AuditResult<DiagnosticOutput> {
        let args = self.args(tool, domain);
        debug!("[Diag] {} {}", tool.program(), args.join(" "));

        let output = timeout(
            self.timeout,
            Command::new(tool.program())
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| AuditError::Timeout {
            operation: tool.to_string(),
            secs: self.timeout.as_secs(),
        })??;

        Ok(DiagnosticOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            success: output.status.success(),
        })
    }
}
