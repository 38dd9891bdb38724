//! Optional tool availability, detected once at startup.

use std::ffi::OsStr;
use std::path::Path;

use serde::Serialize;

use crate::types::DiagnosticTool;

/// Immutable snapshot of which optional external tools are installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub traceroute: bool,
    pub subfinder: bool,
    pub dig: bool,
}

impl Capabilities {
    /// Scan `PATH` for the optional tools.
    pub fn detect() -> Self {
        let path = std::env::var_os("PATH").unwrap_or_default();
        let caps = Self::detect_in(&path);
        log::debug!("[Capabilities] Detected {caps:?}");
        caps
    }

    /// Scan an explicit `PATH`-style search list.
    pub fn detect_in(search_path: &OsStr) -> Self {
        let has = |tool: DiagnosticTool| {
            std::env::split_paths(search_path).any(|dir| is_executable(&dir, tool.program()))
        };
        Self {
            traceroute: has(DiagnosticTool::Traceroute),
            subfinder: has(DiagnosticTool::Subfinder),
            dig: has(DiagnosticTool::DigTrace),
        }
    }

    /// No optional tool available.
    pub const fn none() -> Self {
        Self {
            traceroute: false,
            subfinder: false,
            dig: false,
        }
    }

    pub const fn has(&self, tool: DiagnosticTool) -> bool {
        match tool {
            DiagnosticTool::Traceroute => self.traceroute,
            DiagnosticTool::Subfinder => self.subfinder,
            DiagnosticTool::DigTrace => self.dig,
        }
    }
}

fn is_executable(dir: &Path, program: &str) -> bool {
    if has_exec_bit(&dir.join(program)) {
        return true;
    }
    cfg!(windows) && dir.join(format!("{program}.exe")).is_file()
}

#[cfg(unix)]
fn has_exec_bit(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn has_exec_bit(path: &Path) -> bool {
    path.is_file()
}
