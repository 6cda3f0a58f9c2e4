//! Release-candidate go/no-go verification.
//!
//! Reads the readiness object served at `/debug`, then checks that every
//! public asset the release depends on is served with the right content type,
//! and finally inspects the service worker and manifest in detail.

use super::common;
use super::{Suite, SuiteContext, SuiteId};
use crate::config::ReleaseConfig;
use crate::network::Probe;
use crate::report::{CheckOutcome, SuiteReport, VerdictPolicy};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tracing::{error, info};

pub struct ReleaseSuite;

/// Components the readiness object must report as `OK`.
const GO_NO_GO_COMPONENTS: [&str; 5] =
    ["security", "observability", "analytics", "pwa", "seo_legal"];

/// Public assets: path, expected content type, description.
const CRITICAL_ENDPOINTS: [(&str, &str, &str); 9] = [
    ("/debug", "application/json", "System Status & Go/No-Go"),
    ("/sw.js", "application/javascript", "Service Worker"),
    ("/manifest.json", "application/json", "PWA Manifest"),
    ("/robots.txt", "text/plain", "SEO Robots File"),
    ("/sitemap.xml", "application/xml", "SEO Sitemap"),
    ("/", "text/html", "Main Page"),
    ("/legal/privacy", "text/html", "Privacy Policy"),
    ("/legal/terms", "text/html", "Terms of Service"),
    ("/offline", "text/html", "Offline Experience"),
];

const VERSIONED_CACHES: [&str; 3] = ["spiread-shell-v1", "spiread-assets-v1", "spiread-data-v1"];
const OFFLINE_QUEUE_MARKERS: [&str; 3] = ["offlineQueue", "game_runs", "session_schedules"];
const CACHE_CALLS: [&str; 3] = ["caches.open", "cache.put", "cache.match"];

#[async_trait]
impl Suite for ReleaseSuite {
    fn id(&self) -> SuiteId {
        SuiteId::Release
    }

    fn title(&self) -> &'static str {
        "Release Candidate"
    }

    async fn run(&self, ctx: &SuiteContext) -> SuiteReport {
        let started = Instant::now();
        let mut report = SuiteReport::new(
            self.id().as_str(),
            self.title(),
            VerdictPolicy::CriticalAndRate {
                min_rate: ReleaseConfig::MIN_SUCCESS_RATE,
            },
        );

        info!(
            "🚀 Release candidate {} verification",
            ctx.config.expected_version
        );
        run_checks(ctx, &mut report).await;

        if !report.interrupted {
            let decision = if report.succeeded() { "APPROVED" } else { "ISSUES_FOUND" };
            report.note(format!(
                "🚀 Release candidate {} decision: {}",
                ctx.config.expected_version, decision
            ));
        }
        report.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        report
    }
}

async fn run_checks(ctx: &SuiteContext, report: &mut SuiteReport) {
    check_go_no_go(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }

    info!("🏭 Critical endpoints verification");
    let mut working = 0;
    for (path, content_type, description) in CRITICAL_ENDPOINTS {
        if check_endpoint(ctx, report, path, content_type, description).await {
            working += 1;
        }
        if ctx.should_stop(report) {
            return;
        }
    }
    report.note(format!(
        "📊 CRITICAL ENDPOINTS: {}/{} working",
        working,
        CRITICAL_ENDPOINTS.len()
    ));

    info!("🔧 PWA hardening verification");
    check_service_worker_hardening(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_manifest_hardening(ctx, report).await;
}

/// Fetch a page and require a 200 with `content_type` in its `Content-Type`.
async fn fetch_typed(
    ctx: &SuiteContext,
    path: &str,
    content_type: Option<&str>,
) -> Result<Probe, String> {
    let probe = ctx
        .client
        .get(&ctx.site(path))
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    if !probe.is_ok() {
        return Err(format!("Status {} != 200", probe.status_code()));
    }
    if let Some(expected) = content_type {
        if !probe.content_type().contains(expected) {
            return Err(format!(
                "Expected content-type {}, got {}",
                expected,
                probe.content_type()
            ));
        }
    }
    Ok(probe)
}

/// Everything wrong with a readiness object, empty when it is ready.
fn go_no_go_problems(go_no_go: &Value, expected_version: &str) -> Vec<String> {
    let mut problems = Vec::new();

    let version = go_no_go.get("version").and_then(Value::as_str).unwrap_or("missing");
    if version != expected_version {
        problems.push(format!("version {} (expected {})", version, expected_version));
    }
    let status = go_no_go.get("overall_status").and_then(Value::as_str).unwrap_or("missing");
    if status != ReleaseConfig::READY_STATUS {
        problems.push(format!("overall_status {}", status));
    }
    for component in GO_NO_GO_COMPONENTS {
        let state = go_no_go
            .pointer(&format!("/checks/{}/status", component))
            .and_then(Value::as_str)
            .unwrap_or("missing");
        if state != "OK" {
            problems.push(format!("{} {}", component, state));
        }
    }
    let blockers = release_blockers(go_no_go);
    if !blockers.is_empty() {
        problems.push(format!("{} release blockers", blockers.len()));
    }
    problems
}

fn release_blockers(go_no_go: &Value) -> Vec<String> {
    go_no_go
        .get("release_blockers")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|b| b.as_str().map_or_else(|| b.to_string(), str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn check_go_no_go(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "Go/No-Go Checklist";

    let probe = match fetch_typed(ctx, "/debug", Some("application/json")).await {
        Ok(probe) => probe,
        Err(detail) => {
            report.error(format!("{}: {}", NAME, detail));
            report.record(CheckOutcome::fail(NAME, detail).critical());
            return;
        }
    };
    let body = match probe.json() {
        Ok(body) => body,
        Err(_) => {
            report.error("Debug endpoint returned invalid JSON");
            let outcome = CheckOutcome::fail(NAME, "Invalid JSON response from debug endpoint");
            report.record(outcome.critical());
            return;
        }
    };

    let go_no_go = body.get("goNoGo").cloned().unwrap_or(Value::Null);
    let problems = go_no_go_problems(&go_no_go, &ctx.config.expected_version);
    let blockers = release_blockers(&go_no_go);
    if !blockers.is_empty() {
        report.note(format!("🚨 RELEASE BLOCKERS ({}):", blockers.len()));
        for blocker in &blockers {
            report.note(format!("  - {}", blocker));
        }
    }

    let outcome = if problems.is_empty() {
        CheckOutcome::pass(
            NAME,
            format!(
                "Ready for release candidate {}",
                ctx.config.expected_version
            ),
        )
    } else {
        report.error(format!("Go/No-Go not ready: {}", problems.join(", ")));
        CheckOutcome::fail(NAME, format!("Not ready: {}", problems.join(", ")))
    };
    report.record(outcome.critical().with_elapsed(probe.elapsed));
}

/// Content checks for assets whose body matters, beyond status and type.
fn body_problem(path: &str, probe: &Probe) -> Option<String> {
    match path {
        "/sw.js" if !probe.body.contains(ReleaseConfig::SW_VERSION_MARKER) => Some(format!(
            "Service Worker missing {} version",
            ReleaseConfig::SW_VERSION_MARKER
        )),
        "/debug" => match probe.json() {
            Ok(body) if body.get("goNoGo").is_some() => None,
            Ok(_) => Some("Debug endpoint missing goNoGo object".into()),
            Err(_) => Some("Debug endpoint invalid JSON".into()),
        },
        "/manifest.json" => match probe.json() {
            Ok(manifest) => {
                let missing = common::missing_manifest_fields(&manifest);
                (!missing.is_empty())
                    .then(|| format!("Manifest missing fields: {}", missing.join(", ")))
            }
            Err(_) => Some("Manifest invalid JSON".into()),
        },
        _ => None,
    }
}

async fn check_endpoint(
    ctx: &SuiteContext,
    report: &mut SuiteReport,
    path: &str,
    content_type: &str,
    description: &str,
) -> bool {
    let name = format!("{} ({})", description, path);
    let result = fetch_typed(ctx, path, Some(content_type))
        .await
        .and_then(|probe| match body_problem(path, &probe) {
            Some(problem) => Err(problem),
            None => Ok(probe),
        });

    match result {
        Ok(probe) => {
            let detail = format!(
                "Status: {}, Size: {} bytes, Time: {:.2}s",
                probe.status_code(),
                probe.body.len(),
                probe.elapsed.as_secs_f64()
            );
            let outcome = CheckOutcome::pass(name, detail).critical();
            report.record(outcome.with_elapsed(probe.elapsed));
            true
        }
        Err(detail) => {
            report.error(format!("{}: {}", path, detail));
            report.record(CheckOutcome::fail(name, detail).critical());
            false
        }
    }
}

/// Named hardening checks on the service worker source.
fn service_worker_checks(source: &str) -> Vec<(&'static str, bool)> {
    vec![
        ("spiread_v1_version", source.contains(ReleaseConfig::SW_VERSION_MARKER)),
        ("cache_names", VERSIONED_CACHES.iter().all(|c| source.contains(c))),
        ("background_sync", source.contains("addEventListener('sync'")),
        ("offline_queue", OFFLINE_QUEUE_MARKERS.iter().all(|m| source.contains(m))),
        (
            "exponential_backoff",
            source.contains("retryWithBackoff") || source.to_lowercase().contains("exponential"),
        ),
        ("cache_management", CACHE_CALLS.iter().all(|c| source.contains(c))),
    ]
}

fn array_len(manifest: &Value, key: &str) -> usize {
    manifest.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

/// Named hardening checks on the web app manifest.
fn manifest_checks(manifest: &Value) -> Vec<(&'static str, bool)> {
    let text = |key: &str| manifest.get(key).and_then(Value::as_str);
    vec![
        ("name", text("name") == Some(ReleaseConfig::PRODUCT_NAME)),
        ("short_name", text("short_name") == Some(ReleaseConfig::SHORT_NAME)),
        ("start_url", text("start_url") == Some("/")),
        ("display", text("display") == Some("standalone")),
        ("theme_color", manifest.get("theme_color").is_some()),
        ("background_color", manifest.get("background_color").is_some()),
        ("icons", array_len(manifest, "icons") >= 8),
        ("shortcuts", array_len(manifest, "shortcuts") >= 3),
        ("features", array_len(manifest, "features") >= 5),
        ("categories", array_len(manifest, "categories") >= 3),
    ]
}

fn hardening_outcome(name: &str, checks: &[(&'static str, bool)], summary: String) -> CheckOutcome {
    let failing: Vec<&str> = checks.iter().filter(|(_, ok)| !ok).map(|(check, _)| *check).collect();
    for (check, ok) in checks {
        if !ok {
            error!("   ❌ {}", check);
        }
    }
    if failing.is_empty() {
        CheckOutcome::pass(name, summary)
    } else {
        CheckOutcome::fail(name, format!("Failing: {}", failing.join(", ")))
    }
}

async fn check_service_worker_hardening(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "Service Worker Hardening";

    let outcome = match fetch_typed(ctx, "/sw.js", None).await {
        Ok(probe) => hardening_outcome(
            NAME,
            &service_worker_checks(&probe.body),
            format!(
                "Production-ready ({} characters)",
                probe.body.chars().count()
            ),
        ),
        Err(detail) => CheckOutcome::fail(NAME, detail),
    };
    report.record(outcome);
}

async fn check_manifest_hardening(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "Manifest Hardening";

    let outcome = match fetch_typed(ctx, "/manifest.json", None).await {
        Ok(probe) => match probe.json() {
            Ok(manifest) => hardening_outcome(
                NAME,
                &manifest_checks(&manifest),
                format!("Complete ({} icons)", array_len(&manifest, "icons")),
            ),
            Err(_) => CheckOutcome::fail(NAME, "Invalid JSON manifest"),
        },
        Err(detail) => CheckOutcome::fail(NAME, detail),
    };
    report.record(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ready() -> Value {
        json!({
            "version": "1.0.0-rc.1",
            "overall_status": "READY_FOR_RC",
            "checks": {
                "security": {"status": "OK"},
                "observability": {"status": "OK"},
                "analytics": {"status": "OK"},
                "pwa": {"status": "OK"},
                "seo_legal": {"status": "OK"}
            },
            "release_blockers": []
        })
    }

    #[test]
    fn test_ready_go_no_go_has_no_problems() {
        assert!(go_no_go_problems(&ready(), "1.0.0-rc.1").is_empty());
    }

    #[test]
    fn test_go_no_go_problems_are_listed() {
        let mut go = ready();
        go["checks"]["pwa"]["status"] = json!("WARN");
        go["release_blockers"] = json!(["analytics consent banner"]);

        let problems = go_no_go_problems(&go, "1.0.0-rc.2");
        assert_eq!(
            problems,
            vec![
                "version 1.0.0-rc.1 (expected 1.0.0-rc.2)".to_string(),
                "pwa WARN".to_string(),
                "1 release blockers".to_string(),
            ]
        );
        assert_eq!(release_blockers(&go), vec!["analytics consent banner".to_string()]);
    }

    #[test]
    fn test_missing_go_no_go_fails_every_component() {
        let problems = go_no_go_problems(&Value::Null, "1.0.0-rc.1");
        assert_eq!(problems.len(), 2 + GO_NO_GO_COMPONENTS.len());
    }

    #[test]
    fn test_service_worker_checks() {
        let source = "const CACHE = 'spiread-v1';\
            ['spiread-shell-v1', 'spiread-assets-v1', 'spiread-data-v1'];\
            self.addEventListener('sync', e => {});\
            offlineQueue game_runs session_schedules;\
            retryWithBackoff(); caches.open(); cache.put(); cache.match();";
        assert!(service_worker_checks(source).iter().all(|(_, ok)| *ok));

        let bare = service_worker_checks("self.addEventListener('fetch', () => {})");
        assert!(bare.iter().all(|(_, ok)| !ok));
    }

    #[test]
    fn test_manifest_checks_count_collections() {
        let manifest = json!({
            "name": ReleaseConfig::PRODUCT_NAME,
            "short_name": "Spiread",
            "start_url": "/",
            "display": "standalone",
            "theme_color": "#000",
            "background_color": "#fff",
            "icons": vec![json!({}); 8],
            "shortcuts": vec![json!({}); 3],
            "features": ["a", "b", "c", "d", "e"],
            "categories": ["education", "productivity", "books"]
        });
        assert!(manifest_checks(&manifest).iter().all(|(_, ok)| *ok));

        let mut short = manifest.clone();
        short["icons"] = json!([{}]);
        let failing: Vec<_> = manifest_checks(&short)
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(failing, vec!["icons"]);
    }
}
