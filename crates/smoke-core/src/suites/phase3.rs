//! Word-bank games: game runs, per-game progress and regressions.

use super::common;
use super::{Suite, SuiteContext, SuiteId};
use crate::config::NetworkConfig;
use crate::models::games::{phase3_metrics, PHASE3_GAMES, REGRESSION_GAMES};
use crate::models::{GameRun, ProgressRecord, ProgressSave};
use crate::report::{CheckOutcome, SuiteReport, VerdictPolicy};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tracing::info;

pub struct Phase3Suite;

#[async_trait]
impl Suite for Phase3Suite {
    fn id(&self) -> SuiteId {
        SuiteId::Phase3
    }

    fn title(&self) -> &'static str {
        "Phase 3 Word-Bank Games"
    }

    async fn run(&self, ctx: &SuiteContext) -> SuiteReport {
        let started = Instant::now();
        let mut report =
            SuiteReport::new(self.id().as_str(), self.title(), VerdictPolicy::NoFailures);

        info!("🚀 Starting {} testing", self.title());
        run_checks(ctx, &mut report).await;

        report.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        report
    }
}

async fn run_checks(ctx: &SuiteContext, report: &mut SuiteReport) {
    info!("=== Game Runs API: new game types ===");
    for game in PHASE3_GAMES {
        let run = GameRun::new(&ctx.user_id, game, 150)
            .level(5)
            .duration_ms(60_000)
            .metrics(phase3_metrics(game));
        post_run(ctx, report, format!("Game Runs POST - {}", game), run).await;
        if ctx.should_stop(report) {
            return;
        }
    }
    check_runs_listed(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }

    info!("=== Progress API: new game types ===");
    for game in PHASE3_GAMES {
        let payload = ProgressSave {
            user_id: ctx.user_id.clone(),
            game: game.to_string(),
            progress: ProgressRecord {
                last_level: 8,
                last_best_score: 250,
                total_rounds: Some(15),
                average_accuracy: Some(0.85),
                ..Default::default()
            },
        };
        let name = format!("Progress Save - {}", game);
        let outcome = match ctx.client.post_json(&ctx.api("/progress/save"), &payload).await {
            Ok(probe) if probe.is_ok() => {
                CheckOutcome::pass(name, format!("Status: {}", probe.status_code()))
            }
            Ok(probe) => CheckOutcome::fail(
                name,
                format!(
                    "Status: {}, Response: {}",
                    probe.status_code(),
                    probe.body_preview(NetworkConfig::DETAIL_PREVIEW_CHARS)
                ),
            ),
            Err(e) => CheckOutcome::fail(name, format!("Error: {}", e)),
        };
        report.record(outcome);
        if ctx.should_stop(report) {
            return;
        }
    }
    for game in PHASE3_GAMES {
        check_progress_get(ctx, report, game).await;
        if ctx.should_stop(report) {
            return;
        }
    }

    info!("=== API endpoint health ===");
    common::check_health(ctx, report, false).await;
    if ctx.should_stop(report) {
        return;
    }
    common::check_cors_preflight(ctx, report, "/gameRuns", false).await;
    if ctx.should_stop(report) {
        return;
    }

    info!("=== Regression testing ===");
    for game in REGRESSION_GAMES {
        let run = GameRun::new(&ctx.user_id, game, 100)
            .level(3)
            .duration_ms(60_000)
            .metrics(phase3_metrics(game));
        post_run(ctx, report, format!("Regression - {}", game), run).await;
        if ctx.should_stop(report) {
            return;
        }
    }
}

async fn post_run(ctx: &SuiteContext, report: &mut SuiteReport, name: String, run: GameRun) {
    let outcome = match ctx.client.post_json(&ctx.api("/gameRuns"), &run).await {
        Ok(probe) if probe.is_ok() => {
            CheckOutcome::pass(name, format!("Status: {}", probe.status_code()))
                .with_elapsed(probe.elapsed)
        }
        Ok(probe) => {
            report.error(format!("{}: {}", name, probe.error_summary()));
            CheckOutcome::fail(
                name,
                format!(
                    "Status: {}, Response: {}",
                    probe.status_code(),
                    probe.body_preview(NetworkConfig::DETAIL_PREVIEW_CHARS)
                ),
            )
        }
        Err(e) => {
            report.error(format!("{} error: {}", name, e));
            CheckOutcome::fail(name, format!("Error: {}", e))
        }
    };
    report.record(outcome);
}

async fn check_runs_listed(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "Game Runs GET";

    let user = ctx.user_id.as_str();
    let outcome = match ctx.client.get_query(&ctx.api("/gameRuns"), &[("user_id", user)]).await {
        Ok(probe) if probe.is_ok() => match probe.json() {
            Ok(body) => {
                let records = match body {
                    Value::Array(items) => items.len().to_string(),
                    _ => "N/A".to_string(),
                };
                let detail = format!("Status: {}, Records: {}", probe.status_code(), records);
                CheckOutcome::pass(NAME, detail).with_elapsed(probe.elapsed)
            }
            Err(_) => CheckOutcome::fail(NAME, "Invalid JSON response"),
        },
        Ok(probe) => CheckOutcome::fail(NAME, format!("Status: {}", probe.error_summary())),
        Err(e) => CheckOutcome::fail(NAME, format!("Error: {}", e)),
    };
    report.record(outcome);
}

/// `progress.<game>` must carry `lastLevel` and `lastBestScore`.
fn saved_level(body: &Value, game: &str) -> Option<Value> {
    let entry = body.get("progress")?.get(game)?;
    entry.get("lastBestScore")?;
    entry.get("lastLevel").cloned()
}

async fn check_progress_get(ctx: &SuiteContext, report: &mut SuiteReport, game: &str) {
    let name = format!("Progress Get - {}", game);
    let user = ctx.user_id.as_str();

    let query = [("userId", user), ("game", game)];
    let probe = match ctx.client.get_query(&ctx.api("/progress/get"), &query).await {
        Ok(probe) => probe,
        Err(e) => {
            report.record(CheckOutcome::fail(name, format!("Error: {}", e)));
            return;
        }
    };
    if !probe.is_ok() {
        report.record(CheckOutcome::fail(name, format!("Status: {}", probe.error_summary())));
        return;
    }

    let outcome = match probe.json().ok().and_then(|body| saved_level(&body, game)) {
        Some(level) => CheckOutcome::pass(
            name,
            format!("Status: {}, Level: {}", probe.status_code(), level),
        ),
        None => CheckOutcome::fail(name, "Missing required progress fields"),
    };
    report.record(outcome.with_elapsed(probe.elapsed));
}
