//! Core UX checks tuned for a local dev server.
//!
//! A local server usually has no database behind it, so validation and
//! storage errors (400/500) still prove a route is wired.

use super::common;
use super::{Suite, SuiteContext, SuiteId};
use crate::config::NetworkConfig;
use crate::models::games::CORE_GAMES;
use crate::models::GameRun;
use crate::network::Probe;
use crate::report::{CheckOutcome, SuiteReport, VerdictPolicy};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

pub struct CoreUxLocalSuite;

/// Routes the game shell calls, probed with dummy data.
const API_ROUTES: [(&str, Method, &str); 6] = [
    ("/progress/save", Method::POST, "Progress Save"),
    ("/progress/get", Method::GET, "Progress Get"),
    ("/gameRuns", Method::POST, "Game Runs Save"),
    ("/gameRuns", Method::GET, "Game Runs Get"),
    ("/settings", Method::GET, "Settings Get"),
    ("/settings", Method::POST, "Settings Save"),
];

/// A route exists when the handler answered, even with a validation or storage error.
fn route_responds(probe: &Probe) -> bool {
    matches!(probe.status_code(), 200 | 400 | 500)
}

#[async_trait]
impl Suite for CoreUxLocalSuite {
    fn id(&self) -> SuiteId {
        SuiteId::CoreUxLocal
    }

    fn title(&self) -> &'static str {
        "Core UX Backend (local)"
    }

    async fn run(&self, ctx: &SuiteContext) -> SuiteReport {
        let started = Instant::now();
        let mut report = SuiteReport::new(
            self.id().as_str(),
            self.title(),
            VerdictPolicy::CriticalQuorum { required: 2 },
        )
        .with_error_limit(3);

        info!("🚀 Starting {} testing", self.title());
        run_checks(ctx, &mut report).await;

        report.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        report
    }
}

async fn run_checks(ctx: &SuiteContext, report: &mut SuiteReport) {
    common::check_health(ctx, report, true).await;
    if ctx.should_stop(report) {
        return;
    }
    check_api_structure(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_game_types(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    check_content_type(ctx, report).await;
}

async fn check_api_structure(ctx: &SuiteContext, report: &mut SuiteReport) {
    info!("🔍 Testing API structure");
    let dummy = json!({"test": "data"});
    let mut responding = 0;
    let mut areas = [("Progress API", false), ("Game Runs API", false), ("Settings API", false)];

    for (index, (path, method, description)) in API_ROUTES.iter().enumerate() {
        let url = ctx.api(path);
        let result = if *method == Method::GET {
            ctx.client.get_query(&url, &[("userId", "test")]).await
        } else {
            ctx.client.post_json(&url, &dummy).await
        };

        match result {
            Ok(probe) if route_responds(&probe) => {
                responding += 1;
                areas[index / 2].1 = true;
                info!(
                    "  ✅ {}: Route exists ({})",
                    description,
                    probe.status_code()
                );
            }
            Ok(probe) => {
                warn!(
                    "  ❌ {}: Route missing ({})",
                    description,
                    probe.status_code()
                );
                report.error(format!("{}: {}", description, probe.status_code()));
            }
            Err(e) => {
                warn!("  ❌ {}: Error - {}", description, e);
                report.error(format!("{}: {}", description, e));
            }
        }
    }

    let detail = format!("{}/{} routes responding", responding, API_ROUTES.len());
    let outcome = if responding * 2 >= API_ROUTES.len() {
        CheckOutcome::pass("API Structure", detail)
    } else {
        CheckOutcome::fail("API Structure", detail)
    };
    report.record(outcome.critical());

    report.note("🔗 API ROUTES STATUS:");
    for (area, working) in areas {
        let (symbol, state) = if working { ("✅", "Working") } else { ("❌", "Failed") };
        report.note(format!("  {} {}: {}", symbol, area, state));
    }
}

async fn check_game_types(ctx: &SuiteContext, report: &mut SuiteReport) {
    info!("🔍 Testing game types backend support");
    let mut supported = Vec::with_capacity(CORE_GAMES.len());

    for game in CORE_GAMES {
        let run = GameRun::new(&ctx.user_id, game, 100).level(1).duration_ms(30_000);
        let ok = match ctx.client.post_json(&ctx.api("/gameRuns"), &run).await {
            Ok(probe) if route_responds(&probe) => {
                info!("  ✅ {}: Backend support confirmed", game);
                true
            }
            Ok(probe) => {
                warn!(
                    "  ❌ {}: No backend support ({})",
                    game,
                    probe.status_code()
                );
                false
            }
            Err(e) => {
                warn!("  ❌ {}: Error - {}", game, e);
                report.error(format!("{}: {}", game, e));
                false
            }
        };
        supported.push((game, ok));
    }

    let count = supported.iter().filter(|(_, ok)| *ok).count();
    let detail = format!("{}/{} supported", count, CORE_GAMES.len());
    // 80% of the catalogue
    let outcome = if count * 5 >= CORE_GAMES.len() * 4 {
        CheckOutcome::pass("Game Types", detail)
    } else {
        CheckOutcome::fail("Game Types", detail)
    };
    report.record(outcome.critical());

    report.note("🎮 GAME TYPES DETAILED SUPPORT:");
    for (game, ok) in supported {
        let (symbol, state) = if ok { ("✅", "Supported") } else { ("❌", "Not supported") };
        report.note(format!("  {} {}: {}", symbol, game, state));
    }
}

async fn check_content_type(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "CORS & Headers";

    let url = ctx.api("/health");
    let quick = NetworkConfig::QUICK_REQUEST_TIMEOUT;
    let probe = match ctx.client.get_with_timeout(&url, quick).await {
        Ok(probe) => probe,
        Err(e) => {
            report.record(CheckOutcome::fail(NAME, format!("Error - {}", e)));
            report.error(format!("CORS test error: {}", e));
            return;
        }
    };
    if !probe.is_ok() {
        let detail = format!("Health endpoint failed ({})", probe.status_code());
        report.record(CheckOutcome::fail(NAME, detail));
        report.error(format!("Health endpoint failed: {}", probe.status_code()));
        return;
    }

    let cors = if common::missing_cors_headers(&probe).len() < common::CORS_HEADERS.len() {
        "CORS headers present"
    } else {
        "CORS handled by the framework"
    };
    let content_type = probe.content_type();
    let outcome = if content_type.contains("application/json") {
        CheckOutcome::pass(NAME, format!("JSON content type, {}", cors))
    } else {
        CheckOutcome::warn(NAME, format!("content type '{}', {}", content_type, cors))
    };
    report.record(outcome.with_elapsed(probe.elapsed));
}
