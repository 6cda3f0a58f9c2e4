//! Smoke suites.
//!
//! Each suite is a fixed sequence of checks against one area of the Spiread
//! deployment. Suites never fail fast: every transport error or unexpected
//! status becomes a failed [`CheckOutcome`](crate::report::CheckOutcome) and
//! the next check runs.

mod ai;
pub(crate) mod common;
mod core_ux;
mod core_ux_local;
mod parimpar;
mod phase3;
mod phase5;
mod release;
mod security;

pub use ai::AiSuite;
pub use core_ux::CoreUxSuite;
pub use core_ux_local::CoreUxLocalSuite;
pub use parimpar::ParImparSuite;
pub use phase3::Phase3Suite;
pub use phase5::Phase5Suite;
pub use release::ReleaseSuite;
pub use security::SecuritySuite;

use crate::cancel::CancellationToken;
use crate::config::SmokeConfig;
use crate::error::SmokeError;
use crate::network::HttpClient;
use crate::report::SuiteReport;
use async_trait::async_trait;
use serde::Serialize;
use std::str::FromStr;
use tracing::warn;

/// Identifier of a suite, as used on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SuiteId {
    /// Progress, game runs and settings behind the game shell.
    CoreUx,
    /// Route presence and game type support on a local server.
    CoreUxLocal,
    /// Word-bank games and regressions.
    Phase3,
    /// Session runner, i18n, PWA assets, performance and error handling.
    Phase5,
    /// Par/Impar game data round trip.
    Parimpar,
    /// AI summarize and question generation endpoints.
    Ai,
    /// Release-candidate go/no-go and public assets.
    Release,
    /// Hardening headers, CSP and HSTS policy, CSP report endpoint.
    Security,
}

impl SuiteId {
    pub const ALL: [SuiteId; 8] = [
        SuiteId::CoreUx,
        SuiteId::CoreUxLocal,
        SuiteId::Phase3,
        SuiteId::Phase5,
        SuiteId::Parimpar,
        SuiteId::Ai,
        SuiteId::Release,
        SuiteId::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuiteId::CoreUx => "core-ux",
            SuiteId::CoreUxLocal => "core-ux-local",
            SuiteId::Phase3 => "phase3",
            SuiteId::Phase5 => "phase5",
            SuiteId::Parimpar => "parimpar",
            SuiteId::Ai => "ai",
            SuiteId::Release => "release",
            SuiteId::Security => "security",
        }
    }

    /// Instantiate the suite.
    pub fn suite(&self) -> Box<dyn Suite> {
        match self {
            SuiteId::CoreUx => Box::new(CoreUxSuite),
            SuiteId::CoreUxLocal => Box::new(CoreUxLocalSuite),
            SuiteId::Phase3 => Box::new(Phase3Suite),
            SuiteId::Phase5 => Box::new(Phase5Suite),
            SuiteId::Parimpar => Box::new(ParImparSuite),
            SuiteId::Ai => Box::new(AiSuite),
            SuiteId::Release => Box::new(ReleaseSuite),
            SuiteId::Security => Box::new(SecuritySuite),
        }
    }
}

impl std::fmt::Display for SuiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SuiteId {
    type Err = SmokeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SuiteId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| SmokeError::UnknownSuite(s.to_string()))
    }
}

/// Everything a suite needs to issue its probes.
pub struct SuiteContext {
    pub client: HttpClient,
    pub config: SmokeConfig,
    pub user_id: String,
    pub cancel: CancellationToken,
}

impl SuiteContext {
    pub fn new(
        client: HttpClient,
        config: SmokeConfig,
        user_id: String,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            config,
            user_id,
            cancel,
        }
    }

    pub fn api(&self, path: &str) -> String {
        self.config.api_url(path)
    }

    pub fn site(&self, path: &str) -> String {
        self.config.site_url(path)
    }

    /// Check for cancellation between checks.
    ///
    /// Marks the report as interrupted and returns `true` when the run must stop.
    pub fn should_stop(&self, report: &mut SuiteReport) -> bool {
        if self.cancel.check().is_err() {
            warn!(
                "{} interrupted after {} checks",
                report.suite,
                report.total()
            );
            report.interrupted = true;
            true
        } else {
            false
        }
    }

    /// Sleep for the configured pause between checks.
    pub async fn pause(&self) {
        if !self.config.pause_between_checks.is_zero() {
            tokio::time::sleep(self.config.pause_between_checks).await;
        }
    }
}

/// A named sequence of checks.
#[async_trait]
pub trait Suite: Send + Sync {
    fn id(&self) -> SuiteId;

    fn title(&self) -> &'static str;

    /// Run every check and return the collected report.
    async fn run(&self, ctx: &SuiteContext) -> SuiteReport;
}
