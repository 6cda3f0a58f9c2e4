//! Human-readable summaries printed at the end of a run.

use super::run::RunReport;
use super::suite::SuiteReport;
use std::fmt::Write;

const RULE: &str = "============================================================";

/// Render the summary block of one suite.
pub fn render_suite(report: &SuiteReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "📊 {} SUMMARY", report.title.to_uppercase());
    let _ = writeln!(out, "{RULE}");

    for outcome in &report.outcomes {
        if outcome.detail.is_empty() {
            let _ = writeln!(
                out,
                "{} {}: {}",
                outcome.status.symbol(),
                outcome.name,
                outcome.status
            );
        } else {
            let _ = writeln!(
                out,
                "{} {}: {} ({})",
                outcome.status.symbol(),
                outcome.name,
                outcome.status,
                outcome.detail
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "📈 OVERALL RESULTS: {}/{} tests passed ({:.1}%)",
        report.score(),
        report.total(),
        report.success_rate()
    );

    if !report.notes.is_empty() {
        let _ = writeln!(out);
        for note in &report.notes {
            let _ = writeln!(out, "{note}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "🚨 CRITICAL ISSUES:");
    if report.errors.is_empty() {
        let _ = writeln!(out, "  🎉 No critical issues found!");
    } else {
        for error in report.errors.iter().take(report.error_limit) {
            let _ = writeln!(out, "  ❌ {error}");
        }
        if report.errors.len() > report.error_limit {
            let _ = writeln!(
                out,
                "  ... and {} more errors",
                report.errors.len() - report.error_limit
            );
        }
    }

    let _ = writeln!(out);
    if report.interrupted {
        let _ = writeln!(out, "⚠️ {}: interrupted", report.title);
    } else if report.succeeded() {
        let _ = writeln!(out, "🏁 {}: PASSED", report.title);
    } else {
        let critical = report.critical_failures();
        if critical.is_empty() {
            let _ = writeln!(out, "🏁 {}: FAILED", report.title);
        } else {
            let _ = writeln!(
                out,
                "🏁 {}: FAILED ({} critical checks failing)",
                report.title,
                critical.len()
            );
        }
    }
    out
}

/// Render every suite followed by the run footer.
pub fn render_run(run: &RunReport) -> String {
    let mut out = String::new();
    for suite in &run.suites {
        out.push_str(&render_suite(suite));
        out.push('\n');
    }

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Testing against: {}", run.base_url);
    let _ = writeln!(out, "Test User ID: {}", run.user_id);
    let _ = writeln!(
        out,
        "Suites: {}/{} succeeded",
        run.suites_succeeded(),
        run.suites.len()
    );
    if run.interrupted {
        let _ = writeln!(out, "⚠️ Testing interrupted by user");
    } else if run.succeeded() {
        let _ = writeln!(out, "🎉 ALL SUITES PASSED");
    } else {
        let _ = writeln!(out, "❌ SOME SUITES FAILED");
    }
    let _ = writeln!(out, "{RULE}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CheckOutcome, VerdictPolicy};
    use chrono::Utc;

    fn sample() -> SuiteReport {
        let mut report = SuiteReport::new(
            "core-ux-local",
            "Core UX (local)",
            VerdictPolicy::NoFailures,
        )
        .with_error_limit(3);
        report.record(CheckOutcome::pass("Health Endpoint", "12.5ms"));
        report.record(CheckOutcome::warn("CORS & Headers", "content-type text/plain"));
        for i in 0..5 {
            report.error(format!("route {i}: 404"));
        }
        report.note("🔗 API ROUTES STATUS:");
        report
    }

    #[test]
    fn test_render_suite_lists_limited_errors() {
        let text = render_suite(&sample());
        assert!(text.contains("📊 CORE UX (LOCAL) SUMMARY"));
        assert!(text.contains("✅ Health Endpoint: PASS (12.5ms)"));
        assert!(text.contains("⚠️ CORS & Headers: WARN"));
        assert!(text.contains("📈 OVERALL RESULTS: 1.5/2 tests passed (75.0%)"));
        assert!(text.contains("❌ route 2: 404"));
        assert!(!text.contains("route 3: 404"));
        assert!(text.contains("... and 2 more errors"));
        assert!(text.contains("🔗 API ROUTES STATUS:"));
        assert!(text.contains("🏁 Core UX (local): PASSED"));
    }

    #[test]
    fn test_render_suite_without_errors() {
        let mut report = SuiteReport::new("phase3", "Phase 3", VerdictPolicy::NoFailures);
        report.record(CheckOutcome::fail("Health Endpoint", "").critical());
        let text = render_suite(&report);
        assert!(text.contains("🎉 No critical issues found!"));
        assert!(text.contains("❌ Health Endpoint: FAIL\n"));
        assert!(text.contains("FAILED (1 critical checks failing)"));
    }

    #[test]
    fn test_render_run_footer() {
        let run = RunReport {
            base_url: "http://localhost:3000".into(),
            user_id: "u1".into(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            suites: vec![sample()],
            interrupted: false,
        };
        let text = render_run(&run);
        assert!(text.contains("Suites: 1/1 succeeded"));
        assert!(text.contains("🎉 ALL SUITES PASSED"));
    }
}
