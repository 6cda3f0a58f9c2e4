//! Aggregated result of one suite.

use super::outcome::{CheckOutcome, CheckStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

/// How a suite turns its outcomes into a success/failure verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerdictPolicy {
    /// No check failed.
    NoFailures,
    /// No critical check failed.
    NoCriticalFailures,
    /// At least `required` critical checks passed.
    CriticalQuorum { required: usize },
    /// No critical check failed and the success rate reaches `min_rate` percent.
    CriticalAndRate { min_rate: f64 },
}

/// Result of running one suite.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub title: String,
    pub outcomes: Vec<CheckOutcome>,
    /// Error lines collected while checks ran, in order.
    pub errors: Vec<String>,
    /// Free-form lines printed under the summary (support matrices, counts).
    pub notes: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: f64,
    pub policy: VerdictPolicy,
    /// How many collected errors the summary lists.
    #[serde(skip)]
    pub error_limit: usize,
    pub interrupted: bool,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>, title: impl Into<String>, policy: VerdictPolicy) -> Self {
        Self {
            suite: suite.into(),
            title: title.into(),
            outcomes: Vec::new(),
            errors: Vec::new(),
            notes: Vec::new(),
            started_at: Utc::now(),
            elapsed_ms: 0.0,
            policy,
            error_limit: 5,
            interrupted: false,
        }
    }

    pub fn with_error_limit(mut self, limit: usize) -> Self {
        self.error_limit = limit;
        self
    }

    /// Record a check outcome and log it.
    pub fn record(&mut self, outcome: CheckOutcome) {
        let symbol = outcome.status.symbol();
        match outcome.status {
            CheckStatus::Pass => info!("{} {}: {}", symbol, outcome.name, outcome.detail),
            CheckStatus::Warn => warn!("{} {}: {}", symbol, outcome.name, outcome.detail),
            CheckStatus::Fail => error!("{} {}: {}", symbol, outcome.name, outcome.detail),
        }
        self.outcomes.push(outcome);
    }

    /// Collect an error line for the summary.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.notes.push(line.into());
    }

    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed()).count()
    }

    /// Weighted score: warnings count as half a pass.
    pub fn score(&self) -> f64 {
        self.outcomes.iter().map(|o| o.status.weight()).sum()
    }

    /// Score as a percentage of total checks; 0 when nothing ran.
    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.score() / self.total() as f64 * 100.0
        }
    }

    pub fn critical_failures(&self) -> Vec<&CheckOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.critical && o.failed())
            .collect()
    }

    /// Apply the verdict policy. Interrupted suites never succeed.
    pub fn succeeded(&self) -> bool {
        if self.interrupted || self.outcomes.is_empty() {
            return false;
        }
        match self.policy {
            VerdictPolicy::NoFailures => self.failed() == 0,
            VerdictPolicy::NoCriticalFailures => self.critical_failures().is_empty(),
            VerdictPolicy::CriticalQuorum { required } => {
                self.outcomes
                    .iter()
                    .filter(|o| o.critical && o.passed())
                    .count()
                    >= required
            }
            VerdictPolicy::CriticalAndRate { min_rate } => {
                self.critical_failures().is_empty() && self.success_rate() >= min_rate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(policy: VerdictPolicy, outcomes: Vec<CheckOutcome>) -> SuiteReport {
        let mut report = SuiteReport::new("core-ux", "Core UX", policy);
        for outcome in outcomes {
            report.record(outcome);
        }
        report
    }

    #[test]
    fn test_counts_and_rate() {
        let r = report(
            VerdictPolicy::NoFailures,
            vec![
                CheckOutcome::pass("a", ""),
                CheckOutcome::warn("b", ""),
                CheckOutcome::fail("c", ""),
                CheckOutcome::pass("d", ""),
            ],
        );
        assert_eq!(r.total(), 4);
        assert_eq!(r.passed(), 2);
        assert_eq!(r.failed(), 1);
        assert_eq!(r.score(), 2.5);
        assert_eq!(r.success_rate(), 62.5);
        assert!(!r.succeeded());
        assert!(r.outcome("b").is_some());
    }

    #[test]
    fn test_empty_report_never_succeeds() {
        let r = report(VerdictPolicy::NoFailures, vec![]);
        assert_eq!(r.success_rate(), 0.0);
        assert!(!r.succeeded());
    }

    #[test]
    fn test_warnings_do_not_fail_no_failures_policy() {
        let r = report(
            VerdictPolicy::NoFailures,
            vec![CheckOutcome::pass("a", ""), CheckOutcome::warn("b", "")],
        );
        assert!(r.succeeded());
    }

    #[test]
    fn test_critical_policy_ignores_non_critical_failures() {
        let r = report(
            VerdictPolicy::NoCriticalFailures,
            vec![
                CheckOutcome::pass("health", "").critical(),
                CheckOutcome::fail("cors", ""),
            ],
        );
        assert!(r.succeeded());

        let r = report(
            VerdictPolicy::NoCriticalFailures,
            vec![CheckOutcome::fail("health", "").critical()],
        );
        assert!(!r.succeeded());
        assert_eq!(r.critical_failures().len(), 1);
    }

    #[test]
    fn test_quorum_policy() {
        let outcomes = vec![
            CheckOutcome::pass("health", "").critical(),
            CheckOutcome::fail("routes", "").critical(),
            CheckOutcome::pass("games", "").critical(),
        ];
        let quorum = |required| VerdictPolicy::CriticalQuorum { required };
        assert!(report(quorum(2), outcomes.clone()).succeeded());
        assert!(!report(quorum(3), outcomes).succeeded());
    }

    #[test]
    fn test_rate_policy() {
        let mut outcomes = vec![CheckOutcome::pass("go", "").critical()];
        outcomes.extend((0..8).map(|i| CheckOutcome::pass(format!("p{i}"), "")));
        outcomes.push(CheckOutcome::fail("extra", ""));
        // 9/10 = 90%
        let policy = VerdictPolicy::CriticalAndRate { min_rate: 90.0 };
        assert!(report(policy, outcomes.clone()).succeeded());
        outcomes.push(CheckOutcome::fail("another", ""));
        assert!(!report(policy, outcomes).succeeded());
    }

    #[test]
    fn test_interrupted_never_succeeds() {
        let mut r = report(VerdictPolicy::NoFailures, vec![CheckOutcome::pass("a", "")]);
        r.interrupted = true;
        assert!(!r.succeeded());
    }
}
