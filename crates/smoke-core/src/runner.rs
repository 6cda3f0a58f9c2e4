//! Sequential execution of suites against one deployment.

use crate::cancel::CancellationToken;
use crate::config::SmokeConfig;
use crate::error::Result;
use crate::network::{extract_host, HttpClient};
use crate::report::RunReport;
use crate::suites::{SuiteContext, SuiteId};
use chrono::Utc;
use tracing::{info, warn};

/// Runs suites one after another with a shared client and user id.
pub struct Runner {
    client: HttpClient,
    config: SmokeConfig,
    user_id: String,
}

impl Runner {
    /// Build the HTTP client and resolve the user id for the whole run.
    pub fn new(config: SmokeConfig) -> Result<Self> {
        let client = HttpClient::new(&config)?;
        let user_id = config.user_id.resolve();
        Ok(Self {
            client,
            config,
            user_id,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn config(&self) -> &SmokeConfig {
        &self.config
    }

    /// Run `suites` in order.
    ///
    /// Cancellation stops the run between checks; suites that already
    /// started are still part of the report.
    pub async fn run(self, suites: &[SuiteId], cancel: CancellationToken) -> RunReport {
        let started_at = Utc::now();
        let base_url = self.config.base_url().to_string();
        info!(
            "Testing against: {} ({} suites, user {})",
            extract_host(&base_url),
            suites.len(),
            self.user_id
        );

        let ctx = SuiteContext::new(self.client, self.config, self.user_id, cancel);
        let mut reports = Vec::with_capacity(suites.len());
        let mut interrupted = false;

        for id in suites {
            if ctx.cancel.is_cancelled() {
                interrupted = true;
                break;
            }
            let suite = id.suite();
            info!("▶ Running suite {} ({})", id, suite.title());
            let report = suite.run(&ctx).await;
            info!(
                "Suite {} finished: {}/{} checks passed in {:.0}ms",
                id,
                report.passed(),
                report.total(),
                report.elapsed_ms
            );
            let stop = report.interrupted;
            reports.push(report);
            if stop {
                interrupted = true;
                break;
            }
        }

        if interrupted {
            warn!("Testing interrupted by user");
        }

        RunReport {
            base_url,
            user_id: ctx.user_id,
            started_at,
            finished_at: Utc::now(),
            suites: reports,
            interrupted,
        }
    }
}
