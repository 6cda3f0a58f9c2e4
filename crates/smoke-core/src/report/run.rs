//! Result of a whole run across suites.

use super::suite::SuiteReport;
use crate::error::{Result, SmokeError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Process exit codes.
pub struct ExitCode;

impl ExitCode {
    pub const SUCCESS: i32 = 0;
    pub const FAILURES: i32 = 1;
    pub const INTERRUPTED: i32 = 2;
    pub const FATAL: i32 = 3;
}

/// Result of running one or more suites against a deployment.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub base_url: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub suites: Vec<SuiteReport>,
    pub interrupted: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        !self.interrupted && !self.suites.is_empty() && self.suites.iter().all(|s| s.succeeded())
    }

    pub fn suites_succeeded(&self) -> usize {
        self.suites.iter().filter(|s| s.succeeded()).count()
    }

    /// Map the run to a process exit code.
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            ExitCode::INTERRUPTED
        } else if self.succeeded() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURES
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SmokeError::io_with_path(e, parent))?;
        }
        std::fs::write(path, json).map_err(|e| SmokeError::io_with_path(e, path))?;
        info!("Detailed results saved to: {}", path.display());
        Ok(())
    }
}
