//! Pass-through diagnostic tool trait

use async_trait::async_trait;

use crate::error::AuditResult;
use crate::types::{DiagnosticOutput, DiagnosticTool};

/// Runs an opaque external diagnostic against the audited domain.
///
/// Output is reported raw; the engine never interprets it.
#[async_trait]
pub trait DiagnosticRunner: Send + Sync {
    async fn run(&self, tool: DiagnosticTool, domain: &str) -> AuditResult<DiagnosticOutput>;
}
