//! Session runner, i18n, PWA assets, performance budgets and error handling.

use super::common;
use super::{Suite, SuiteContext, SuiteId};
use crate::config::NetworkConfig;
use crate::models::games::{medium_session_sample, SESSION_TEMPLATES};
use crate::models::{FlatSettingsUpdate, GameRun};
use crate::report::{CheckOutcome, SuiteReport, VerdictPolicy};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct Phase5Suite;

/// Service worker markers; at least [`SW_MIN_MARKERS`] must appear.
const SW_MARKERS: [(&str, &str); 6] = [
    ("CACHE_NAME", "Cache naming"),
    ("install", "Install event"),
    ("activate", "Activate event"),
    ("fetch", "Fetch event"),
    ("background-sync", "Background sync"),
    ("offline", "Offline support"),
];
const SW_MIN_MARKERS: usize = 4;

#[async_trait]
impl Suite for Phase5Suite {
    fn id(&self) -> SuiteId {
        SuiteId::Phase5
    }

    fn title(&self) -> &'static str {
        "Phase 5 Closure Sprint"
    }

    async fn run(&self, ctx: &SuiteContext) -> SuiteReport {
        let started = Instant::now();
        let mut report =
            SuiteReport::new(self.id().as_str(), self.title(), VerdictPolicy::NoFailures);

        info!("🚀 Starting {} testing", self.title());
        run_checks(ctx, &mut report).await;

        if !report.interrupted && report.total() > 0 {
            let line = if report.failed() == 0 {
                "🎉 All Phase 5 backend checks passed"
            } else if report.success_rate() >= 80.0 {
                "⚠️ Most Phase 5 backend checks passed - minor issues to address"
            } else {
                "❌ Significant Phase 5 backend issues found - requires attention"
            };
            report.note(line);
        }
        report.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        report
    }
}

async fn run_checks(ctx: &SuiteContext, report: &mut SuiteReport) {
    common::check_health(ctx, report, false).await;
    if ctx.should_stop(report) {
        return;
    }
    check_session_schedules(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_session_templates(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_language_settings(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_manifest(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_service_worker(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_session_game_run(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_offline_queue(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_performance(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_error_handling(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_existing_systems(ctx, report).await;
}

async fn check_session_schedules(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "Session Schedules";

    info!("Testing GET /sessionSchedules");
    let user = ctx.user_id.as_str();
    match ctx.client.get_query(&ctx.api("/sessionSchedules"), &[("user_id", user)]).await {
        Ok(probe) if probe.is_ok() => info!("  ✅ GET session schedules working"),
        Ok(probe) => warn!(
            "  ⚠️ GET session schedules failed: {}",
            probe.error_summary()
        ),
        Err(e) => warn!("  ⚠️ GET session schedules error: {}", e),
    }

    info!("Testing POST /sessionSchedules");
    let session = medium_session_sample(&ctx.user_id, Utc::now());
    let outcome = match ctx.client.post_json(&ctx.api("/sessionSchedules"), &session).await {
        Ok(probe) if probe.is_ok() => {
            let id = probe
                .json()
                .ok()
                .and_then(|body| {
                    body.get("id")
                        .map(|id| id.as_str().map_or_else(|| id.to_string(), str::to_string))
                })
                .unwrap_or_else(|| "No ID".to_string());
            info!("  Created session: {}", id);
            CheckOutcome::pass(NAME, format!("Created session {}", id))
                .with_elapsed(probe.elapsed)
        }
        Ok(probe) => {
            report.error(format!("Session schedule post: {}", probe.error_summary()));
            CheckOutcome::fail(NAME, format!("POST failed ({})", probe.status_code()))
        }
        Err(e) => {
            report.error(format!("Session schedule post error: {}", e));
            CheckOutcome::fail(NAME, format!("Error - {}", e))
        }
    };
    report.record(outcome);
}

async fn check_session_templates(ctx: &SuiteContext, report: &mut SuiteReport) {
    let mut created = 0;
    for template in SESSION_TEMPLATES {
        let session = template.completed_session(&ctx.user_id, Utc::now());
        let label = format!(
            "{} template session ({} min)",
            template.name, template.minutes
        );
        if common::post_accepted(ctx, report, &label, "/sessionSchedules", &session).await {
            created += 1;
        }
    }

    let detail = format!("{}/{} templates stored", created, SESSION_TEMPLATES.len());
    report.record(if created == SESSION_TEMPLATES.len() {
        CheckOutcome::pass("Session Templates", detail)
    } else {
        CheckOutcome::fail("Session Templates", detail)
    });
}

fn language_settings(user_id: &str, language: &str) -> FlatSettingsUpdate {
    FlatSettingsUpdate {
        user_id: user_id.to_string(),
        language: Some(language.to_string()),
        wpm_target: 300,
        chunk_size: 1,
        theme: "auto".into(),
        font_size: Some(16),
        sound_enabled: Some(true),
        show_instructions: Some(true),
        progress: Some(json!({
            "rsvp": {"lastLevel": 1, "lastBestScore": 0},
            "schulte": {"lastLevel": 1, "lastBestScore": 0}
        })),
    }
}

async fn check_language_settings(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "i18n Language Persistence";

    for language in ["es", "en"] {
        let label = format!("Settings language {}", language);
        let payload = language_settings(&ctx.user_id, language);
        common::post_accepted(ctx, report, &label, "/settings", &payload).await;
    }

    let user = ctx.user_id.as_str();
    let query = [("user_id", user)];
    let probe = common::get_ok(ctx, report, "Settings get", "/settings", &query).await;
    let Some(probe) = probe else {
        report.record(CheckOutcome::fail(NAME, "GET /settings did not return 200"));
        return;
    };
    let language = probe
        .json()
        .ok()
        .and_then(|body| body.get("language").and_then(Value::as_str).map(str::to_string));
    report.record(match language.as_deref() {
        Some("en") => CheckOutcome::pass(NAME, "Language retrieved: en"),
        Some(other) => CheckOutcome::fail(NAME, format!("Language retrieved: {}", other)),
        None => CheckOutcome::fail(NAME, "Language not found"),
    });
}

fn array_len(value: &Value, key: &str) -> usize {
    value.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

async fn check_manifest(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "PWA Manifest";

    let probe = match ctx.client.get(&ctx.site("/manifest.json")).await {
        Ok(probe) if probe.is_ok() => probe,
        Ok(probe) => {
            report.error(format!("Manifest: {}", probe.error_summary()));
            let detail = format!("Not accessible ({})", probe.status_code());
            report.record(CheckOutcome::fail(NAME, detail));
            return;
        }
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("Error - {}", e)));
            return;
        }
    };
    let manifest = match probe.json() {
        Ok(manifest) => manifest,
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("Invalid JSON - {}", e)));
            return;
        }
    };

    let missing = common::missing_manifest_fields(&manifest);
    if !missing.is_empty() {
        let detail = format!("Missing fields: {}", missing.join(", "));
        report.record(CheckOutcome::fail(NAME, detail));
        return;
    }

    let icons = array_len(&manifest, "icons");
    let shortcuts = array_len(&manifest, "shortcuts");
    let features = array_len(&manifest, "features");
    report.note(format!(
        "📱 Manifest: {} icons, {} shortcuts, {} features",
        icons, shortcuts, features
    ));
    if icons < 2 {
        warn!("  ⚠️ PWA manifest has only {} icons", icons);
    }
    let outcome = CheckOutcome::pass(NAME, "All required fields present");
    report.record(outcome.with_elapsed(probe.elapsed));
}

async fn check_service_worker(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "Service Worker";

    let probe = match ctx.client.get(&ctx.site("/sw.js")).await {
        Ok(probe) if probe.is_ok() => probe,
        Ok(probe) => {
            report.error(format!("Service worker: {}", probe.error_summary()));
            let detail = format!("Not accessible ({})", probe.status_code());
            report.record(CheckOutcome::fail(NAME, detail));
            return;
        }
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("Error - {}", e)));
            return;
        }
    };

    let mut found = 0;
    for (marker, description) in SW_MARKERS {
        if probe.body.contains(marker) {
            found += 1;
            info!("  ✅ {} implemented", description);
        } else {
            warn!("  ❌ {} not found", description);
        }
    }
    let detail = format!("{}/{} features", found, SW_MARKERS.len());
    report.record(if found >= SW_MIN_MARKERS {
        CheckOutcome::pass(NAME, detail)
    } else {
        CheckOutcome::fail(NAME, detail)
    });
}

async fn check_session_game_run(ctx: &SuiteContext, report: &mut SuiteReport) {
    let session_id = format!("session_{}_{}", Utc::now().timestamp(), ctx.user_id);
    let run = GameRun::new(&ctx.user_id, "session_block", 85)
        .level(2)
        .duration_ms(180_000)
        .metrics(json!({
            "blockType": "par_impar",
            "sessionId": session_id,
            "templateType": "medium",
            "blockIndex": 0,
            "carryOverLevel": 2,
            "pausedMs": 1000,
            "completed": true
        }));

    let stored = common::post_accepted(ctx, report, "Session game run", "/gameRuns", &run).await;
    report.record(if stored {
        CheckOutcome::pass("Game Runs Integration", "Session-based game run created")
    } else {
        CheckOutcome::fail("Game Runs Integration", "Session-based game run rejected")
    });
}

async fn check_offline_queue(ctx: &SuiteContext, report: &mut SuiteReport) {
    const QUEUED: u32 = 3;

    let queued: Vec<GameRun> = (0..QUEUED)
        .map(|i| {
            GameRun::new(&ctx.user_id, &format!("offline_test_{}", i), 50 + i * 10)
                .level(1)
                .duration_ms(60_000)
                .metrics(json!({
                    "offline": true,
                    "queuedAt": Utc::now().to_rfc3339(),
                    "syncAttempt": i + 1
                }))
        })
        .collect();

    let mut synced = 0;
    for (i, run) in queued.iter().enumerate() {
        let label = format!("Queued run {}", i + 1);
        if common::post_accepted(ctx, report, &label, "/gameRuns", run).await {
            synced += 1;
        }
    }

    let detail = format!("{}/{} queue items synced", synced, QUEUED);
    report.record(if synced == QUEUED {
        CheckOutcome::pass("Offline Queue Replay", detail)
    } else {
        CheckOutcome::fail("Offline Queue Replay", detail)
    });
}

fn within_budget(elapsed: Duration, budget: Duration) -> bool {
    elapsed < budget
}

async fn check_performance(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "Performance Targets";
    let page_budget = ctx.config.page_load_budget;
    let api_budget = ctx.config.api_latency_budget;

    let page = match ctx.client.get(&ctx.site("/")).await {
        Ok(probe) => probe.elapsed,
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("Page load error - {}", e)));
            return;
        }
    };
    let api = match ctx.client.get(&ctx.api("/health")).await {
        Ok(probe) => probe.elapsed,
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("API latency error - {}", e)));
            return;
        }
    };

    let detail = format!(
        "page {:.2}s (budget {:.1}s), API {:.2}s (budget {:.1}s)",
        page.as_secs_f64(),
        page_budget.as_secs_f64(),
        api.as_secs_f64(),
        api_budget.as_secs_f64()
    );
    report.record(if within_budget(page, page_budget) && within_budget(api, api_budget) {
        CheckOutcome::pass(NAME, detail)
    } else {
        CheckOutcome::fail(NAME, detail)
    });
}

async fn check_error_handling(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "Error Handling";
    let quick = NetworkConfig::QUICK_REQUEST_TIMEOUT;

    let not_found = match ctx.client.get_with_timeout(&ctx.api("/invalid_endpoint"), quick).await {
        Ok(probe) => probe.status_code(),
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("Error - {}", e)));
            return;
        }
    };
    let missing_user = match ctx.client.get_with_timeout(&ctx.api("/settings"), quick).await {
        Ok(probe) => probe.status_code(),
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("Error - {}", e)));
            return;
        }
    };

    let detail = format!(
        "invalid endpoint -> {}, settings without user id -> {}",
        not_found, missing_user
    );
    report.record(if not_found == 404 && missing_user == 400 {
        CheckOutcome::pass(NAME, detail)
    } else {
        CheckOutcome::fail(NAME, detail)
    });
}

async fn check_existing_systems(ctx: &SuiteContext, report: &mut SuiteReport) {
    let legacy_run = GameRun::new(&ctx.user_id, "schulte", 120)
        .level(3)
        .duration_ms(45_000)
        .metrics(json!({"gridSize": 5, "accuracy": 0.95, "avgResponseTime": 1200}));
    let runs_ok =
        common::post_accepted(ctx, report, "Legacy game run", "/gameRuns", &legacy_run).await;

    let legacy_settings = FlatSettingsUpdate {
        user_id: ctx.user_id.clone(),
        language: None,
        wpm_target: 250,
        chunk_size: 1,
        theme: "dark".into(),
        font_size: None,
        sound_enabled: None,
        show_instructions: None,
        progress: None,
    };
    let settings_ok = common::post_accepted(
        ctx,
        report,
        "Legacy settings",
        "/settings",
        &legacy_settings,
    )
    .await;

    let detail = format!(
        "legacy game runs {}, legacy settings {}",
        if runs_ok { "ok" } else { "broken" },
        if settings_ok { "ok" } else { "broken" }
    );
    report.record(if runs_ok && settings_ok {
        CheckOutcome::pass("Existing Systems", detail)
    } else {
        CheckOutcome::fail("Existing Systems", detail)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_settings_payload() {
        let value = serde_json::to_value(language_settings("u1", "en")).unwrap();
        assert_eq!(value["user_id"], "u1");
        assert_eq!(value["language"], "en");
        assert_eq!(value["wpm_target"], 300);
        assert_eq!(value["progress"]["rsvp"]["lastLevel"], 1);
    }

    #[test]
    fn test_budget_is_strict() {
        let budget = Duration::from_millis(1000);
        assert!(within_budget(Duration::from_millis(999), budget));
        assert!(!within_budget(budget, budget));
    }

    #[test]
    fn test_array_len_tolerates_missing_keys() {
        let manifest = json!({"icons": [{}, {}], "shortcuts": "none"});
        assert_eq!(array_len(&manifest, "icons"), 2);
        assert_eq!(array_len(&manifest, "shortcuts"), 0);
        assert_eq!(array_len(&manifest, "features"), 0);
    }
}
