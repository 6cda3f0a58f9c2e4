//! Security headers and the CSP violation report endpoint.
//!
//! Sends `HEAD` to the main page, an API route and the debug page, then scores
//! the hardening headers each one carries. The main page's policy headers are
//! inspected in detail: CSP directives, unsafe script sources and the HSTS
//! lifetime.

use super::{Suite, SuiteContext, SuiteId};
use crate::config::SecurityConfig;
use crate::network::Probe;
use crate::report::{CheckOutcome, SuiteReport, VerdictPolicy};
use async_trait::async_trait;
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

pub struct SecuritySuite;

const CSP: &str = "content-security-policy";
const CSP_REPORT_ONLY: &str = "content-security-policy-report-only";
const HSTS: &str = "strict-transport-security";

/// Hardening headers every page must send: header, description.
const SECURITY_HEADERS: [(&str, &str); 6] = [
    (CSP, "Content Security Policy"),
    (HSTS, "HTTP Strict Transport Security"),
    ("x-frame-options", "Clickjacking Protection"),
    ("x-content-type-options", "MIME Type Sniffing Protection"),
    ("referrer-policy", "Referrer Policy"),
    ("permissions-policy", "Permissions Policy"),
];

const CSP_DIRECTIVES: [&str; 8] = [
    "default-src",
    "script-src",
    "style-src",
    "img-src",
    "connect-src",
    "worker-src",
    "frame-ancestors",
    "report-uri",
];

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[async_trait]
impl Suite for SecuritySuite {
    fn id(&self) -> SuiteId {
        SuiteId::Security
    }

    fn title(&self) -> &'static str {
        "Security Headers"
    }

    async fn run(&self, ctx: &SuiteContext) -> SuiteReport {
        let started = Instant::now();
        let mut report = SuiteReport::new(
            self.id().as_str(),
            self.title(),
            VerdictPolicy::CriticalAndRate {
                min_rate: SecurityConfig::MIN_SCORE,
            },
        );

        info!("🔐 Starting {} testing", self.title());
        run_checks(ctx, &mut report).await;

        report.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        report
    }
}

async fn run_checks(ctx: &SuiteContext, report: &mut SuiteReport) {
    let pages = [
        ("/", ctx.site("/")),
        ("/api/health", ctx.api("/health")),
        ("/debug", ctx.site("/debug")),
    ];

    let mut main_page = None;
    for (label, url) in pages {
        let probe = check_headers(ctx, report, label, &url).await;
        if label == "/" {
            main_page = probe;
        }
        if ctx.should_stop(report) {
            return;
        }
    }

    match main_page {
        Some(probe) => {
            report.record(csp_directives_outcome(&probe));
            report.record(csp_sources_outcome(&probe));
            report.record(hsts_outcome(&probe));
        }
        None => {
            for name in ["CSP Directives", "CSP Unsafe Sources", "HSTS Max-Age"] {
                report.record(CheckOutcome::fail(name, "Main page unreachable"));
            }
        }
    }
    if ctx.should_stop(report) {
        return;
    }

    check_csp_report(ctx, report).await;
}

/// The enforced policy, falling back to the report-only one.
fn csp_header(probe: &Probe) -> Option<&str> {
    probe.header(CSP).or_else(|| probe.header(CSP_REPORT_ONLY))
}

fn missing_headers(probe: &Probe) -> Vec<&'static str> {
    SECURITY_HEADERS
        .into_iter()
        .filter(|(name, _)| match *name {
            CSP => csp_header(probe).is_none(),
            _ => !probe.has_header(name),
        })
        .map(|(_, description)| description)
        .collect()
}

/// Percentage of the hardening headers present.
fn header_score(missing: usize) -> f64 {
    let total = SECURITY_HEADERS.len();
    (total - missing.min(total)) as f64 / total as f64 * 100.0
}

async fn check_headers(
    ctx: &SuiteContext,
    report: &mut SuiteReport,
    label: &str,
    url: &str,
) -> Option<Probe> {
    let name = format!("Security Headers ({})", label);
    let critical = label == "/";

    let probe = match ctx.client.head(url).await {
        Ok(probe) => probe,
        Err(e) => {
            report.error(format!("{}: {}", name, e));
            let outcome = CheckOutcome::fail(name, format!("Error: {}", e));
            report.record(if critical { outcome.critical() } else { outcome });
            return None;
        }
    };

    let missing = missing_headers(&probe);
    let score = header_score(missing.len());
    let detail = if missing.is_empty() {
        format!("Status: {}, Score: {:.0}%", probe.status_code(), score)
    } else {
        for description in &missing {
            warn!("  ❌ {}: Missing", description);
        }
        format!(
            "Status: {}, Score: {:.0}%, Missing: {}",
            probe.status_code(),
            score,
            missing.join(", ")
        )
    };

    let outcome = if missing.is_empty() {
        CheckOutcome::pass(&name, detail)
    } else if score >= SecurityConfig::MIN_SCORE {
        CheckOutcome::warn(&name, detail)
    } else {
        report.error(format!("{}: {}", name, detail));
        CheckOutcome::fail(&name, detail)
    };
    let outcome = outcome.with_elapsed(probe.elapsed);
    report.record(if critical { outcome.critical() } else { outcome });
    Some(probe)
}

/// Source list of a directive, or `None` when the policy omits it.
fn directive<'a>(csp: &'a str, name: &str) -> Option<&'a str> {
    csp.split(';').find_map(|part| {
        let part = part.trim();
        let (key, sources) = part.split_once(char::is_whitespace).unwrap_or((part, ""));
        key.eq_ignore_ascii_case(name).then(|| sources.trim())
    })
}

fn missing_directives(csp: &str) -> Vec<&'static str> {
    CSP_DIRECTIVES
        .into_iter()
        .filter(|name| directive(csp, name).is_none())
        .collect()
}

/// Script sources that defeat the policy.
fn unsafe_sources(csp: &str) -> Vec<&'static str> {
    let mut found = Vec::new();
    let scripts = directive(csp, "script-src").or_else(|| directive(csp, "default-src"));
    if scripts.is_some_and(|sources| sources.contains("'unsafe-inline'")) {
        found.push("'unsafe-inline' in script-src");
    }
    if csp.contains("'unsafe-eval'") {
        found.push("'unsafe-eval'");
    }
    found
}

fn csp_directives_outcome(probe: &Probe) -> CheckOutcome {
    const NAME: &str = "CSP Directives";

    let Some(csp) = csp_header(probe) else {
        return CheckOutcome::fail(NAME, "No Content-Security-Policy header");
    };
    let missing = missing_directives(csp);
    let present = CSP_DIRECTIVES.len() - missing.len();
    if missing.is_empty() {
        let detail = format!("{}/{} directives", present, CSP_DIRECTIVES.len());
        CheckOutcome::pass(NAME, detail)
    } else {
        CheckOutcome::warn(
            NAME,
            format!(
                "{}/{} directives, not specified: {}",
                present,
                CSP_DIRECTIVES.len(),
                missing.join(", ")
            ),
        )
    }
}

fn csp_sources_outcome(probe: &Probe) -> CheckOutcome {
    const NAME: &str = "CSP Unsafe Sources";

    let Some(csp) = csp_header(probe) else {
        return CheckOutcome::fail(NAME, "No Content-Security-Policy header");
    };
    let found = unsafe_sources(csp);
    if found.is_empty() {
        CheckOutcome::pass(NAME, "No unsafe script sources")
    } else {
        CheckOutcome::fail(NAME, format!("CSP allows {}", found.join(", ")))
    }
}

/// `max-age` in seconds, when the header carries a parseable one.
fn hsts_max_age(value: &str) -> Option<u64> {
    value.split(';').find_map(|part| {
        let (key, seconds) = part.trim().split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        seconds.trim().trim_matches('"').parse().ok()
    })
}

fn hsts_outcome(probe: &Probe) -> CheckOutcome {
    const NAME: &str = "HSTS Max-Age";

    let Some(hsts) = probe.header(HSTS) else {
        return CheckOutcome::fail(NAME, "No Strict-Transport-Security header");
    };
    let Some(max_age) = hsts_max_age(hsts) else {
        return CheckOutcome::fail(NAME, format!("No max-age in \"{}\"", hsts));
    };

    let days = max_age / SECONDS_PER_DAY;
    let lower = hsts.to_ascii_lowercase();
    let detail = format!(
        "{} days, includeSubDomains: {}, preload: {}",
        days,
        lower.contains("includesubdomains"),
        lower.contains("preload")
    );
    if days >= SecurityConfig::HSTS_MIN_DAYS {
        CheckOutcome::pass(NAME, detail)
    } else {
        CheckOutcome::fail(
            NAME,
            format!("{}, below {} days", detail, SecurityConfig::HSTS_MIN_DAYS),
        )
    }
}

async fn check_csp_report(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "CSP Report Endpoint";

    let violation = json!({
        "csp-report": {
            "document-uri": ctx.site("/test"),
            "referrer": "",
            "blocked-uri": "https://evil.example.com/malicious.js",
            "violated-directive": "script-src 'self'",
            "original-policy": "default-src 'self'"
        }
    });
    let result = ctx
        .client
        .post_body(
            &ctx.api("/csp-report"),
            SecurityConfig::CSP_REPORT_CONTENT_TYPE,
            violation.to_string(),
        )
        .await;

    let outcome = match result {
        Ok(probe) if probe.status.as_u16() == 204 => {
            CheckOutcome::pass(NAME, "Accepted (204 No Content)").with_elapsed(probe.elapsed)
        }
        Ok(probe) => CheckOutcome::warn(NAME, format!("Returned {}", probe.status_code()))
            .with_elapsed(probe.elapsed),
        Err(e) => {
            report.error(format!("{}: {}", NAME, e));
            CheckOutcome::fail(NAME, format!("Error: {}", e))
        }
    };
    report.record(outcome);
}
