//! Probes shared by several suites.

use super::SuiteContext;
use crate::config::NetworkConfig;
use crate::network::Probe;
use crate::report::{CheckOutcome, SuiteReport};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Headers a CORS preflight must carry for the browser client.
pub(crate) const CORS_HEADERS: [&str; 3] = [
    "Access-Control-Allow-Origin",
    "Access-Control-Allow-Methods",
    "Access-Control-Allow-Headers",
];

pub(crate) fn missing_cors_headers(probe: &Probe) -> Vec<&'static str> {
    CORS_HEADERS
        .into_iter()
        .filter(|h| !probe.has_header(h))
        .collect()
}

/// Fields every installable web app manifest must declare.
pub(crate) const MANIFEST_REQUIRED_FIELDS: [&str; 5] =
    ["name", "short_name", "start_url", "display", "icons"];

pub(crate) fn missing_manifest_fields(manifest: &Value) -> Vec<&'static str> {
    MANIFEST_REQUIRED_FIELDS
        .into_iter()
        .filter(|field| manifest.get(*field).is_none())
        .collect()
}

/// Compact JSON cut to `max_chars`, for check details.
pub(crate) fn json_preview(value: &Value, max_chars: usize) -> String {
    let text = serde_json::to_string(value).unwrap_or_default();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}

fn apply_critical(outcome: CheckOutcome, critical: bool) -> CheckOutcome {
    if critical {
        outcome.critical()
    } else {
        outcome
    }
}

/// `GET /api/health`; passes on 200.
pub(crate) async fn check_health(
    ctx: &SuiteContext,
    report: &mut SuiteReport,
    critical: bool,
) -> Option<Probe> {
    const NAME: &str = "Health Endpoint";

    match ctx.client.get(&ctx.api("/health")).await {
        Ok(probe) if probe.is_ok() => {
            let body = match probe.json() {
                Ok(value) => json_preview(&value, NetworkConfig::DETAIL_PREVIEW_CHARS),
                Err(_) => probe
                    .body_preview(NetworkConfig::DETAIL_PREVIEW_CHARS)
                    .to_string(),
            };
            let detail = format!("Working ({}ms) {}", probe.elapsed_ms(), body);
            let outcome = CheckOutcome::pass(NAME, detail).with_elapsed(probe.elapsed);
            report.record(apply_critical(outcome, critical));
            Some(probe)
        }
        Ok(probe) => {
            let outcome = CheckOutcome::fail(NAME, format!("Failed ({})", probe.status_code()))
                .with_elapsed(probe.elapsed);
            report.record(apply_critical(outcome, critical));
            report.error(format!("Health check: {}", probe.error_summary()));
            Some(probe)
        }
        Err(e) => {
            report.record(apply_critical(
                CheckOutcome::fail(NAME, format!("Error - {}", e)),
                critical,
            ));
            report.error(format!("Health check error: {}", e));
            None
        }
    }
}

/// `OPTIONS` preflight on an API path; passes when all CORS headers are present.
///
/// With `require_ok` the preflight must also answer 200.
pub(crate) async fn check_cors_preflight(
    ctx: &SuiteContext,
    report: &mut SuiteReport,
    path: &str,
    require_ok: bool,
) -> bool {
    const NAME: &str = "CORS Headers";

    let probe = match ctx.client.options(&ctx.api(path)).await {
        Ok(probe) => probe,
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("Error - {}", e)));
            report.error(format!("CORS test error: {}", e));
            return false;
        }
    };

    if require_ok && !probe.is_ok() {
        report.record(CheckOutcome::fail(
            NAME,
            format!("OPTIONS request failed: {}", probe.status_code()),
        ));
        report.error(format!("CORS preflight: {}", probe.error_summary()));
        return false;
    }

    for header in CORS_HEADERS {
        match probe.header(header) {
            Some(value) => info!("  ✅ {}: {}", header, value),
            None => warn!("  ❌ {}: Missing", header),
        }
    }

    let missing = missing_cors_headers(&probe);
    if missing.is_empty() {
        report.record(CheckOutcome::pass(NAME, "All required CORS headers present"));
        true
    } else {
        report.record(CheckOutcome::fail(
            NAME,
            format!("Missing headers: {}", missing.join(", ")),
        ));
        false
    }
}

/// POST `body` and report whether the API answered 200.
///
/// Logs the step and collects an error line on failure; records no outcome.
pub(crate) async fn post_accepted<T: Serialize + Sync + ?Sized>(
    ctx: &SuiteContext,
    report: &mut SuiteReport,
    label: &str,
    path: &str,
    body: &T,
) -> bool {
    match ctx.client.post_json(&ctx.api(path), body).await {
        Ok(probe) if probe.is_ok() => {
            info!("  ✅ {}: accepted", label);
            true
        }
        Ok(probe) => {
            warn!("  ❌ {}: failed ({})", label, probe.status_code());
            report.error(format!("{}: {}", label, probe.error_summary()));
            false
        }
        Err(e) => {
            warn!("  ❌ {}: error - {}", label, e);
            report.error(format!("{} error: {}", label, e));
            false
        }
    }
}

/// GET with query parameters, returning the probe only when it answered 200.
pub(crate) async fn get_ok(
    ctx: &SuiteContext,
    report: &mut SuiteReport,
    label: &str,
    path: &str,
    query: &[(&str, &str)],
) -> Option<Probe> {
    match ctx.client.get_query(&ctx.api(path), query).await {
        Ok(probe) if probe.is_ok() => Some(probe),
        Ok(probe) => {
            warn!("  ❌ {}: failed ({})", label, probe.status_code());
            report.error(format!("{}: {}", label, probe.error_summary()));
            None
        }
        Err(e) => {
            warn!("  ❌ {}: error - {}", label, e);
            report.error(format!("{} error: {}", label, e));
            None
        }
    }
}
