//! AI summarize and question generation endpoints.

use super::{Suite, SuiteContext, SuiteId};
use crate::models::{QuestionsRequest, SummarizeRequest};
use crate::network::Probe;
use crate::report::{CheckOutcome, SuiteReport, VerdictPolicy};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tracing::info;

pub struct AiSuite;

const SUMMARIZE: &str = "/ai/summarize";
const QUESTIONS: &str = "/ai/questions";

#[async_trait]
impl Suite for AiSuite {
    fn id(&self) -> SuiteId {
        SuiteId::Ai
    }

    fn title(&self) -> &'static str {
        "AI Endpoints"
    }

    async fn run(&self, ctx: &SuiteContext) -> SuiteReport {
        let started = Instant::now();
        let mut report =
            SuiteReport::new(self.id().as_str(), self.title(), VerdictPolicy::NoFailures);

        info!("🤖 Starting {} testing", self.title());
        run_checks(ctx, &mut report).await;

        if !report.interrupted {
            report.note("🎯 AI ENDPOINTS STATUS:");
            report.note(if report.failed() == 0 {
                "✅ All AI endpoints are working correctly"
            } else {
                "❌ Some AI endpoints need attention"
            });
        }
        report.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        report
    }
}

/// Record an outcome; failures outside health checks are critical and listed.
fn record(report: &mut SuiteReport, outcome: CheckOutcome, health_check: bool) {
    let outcome = if health_check { outcome } else { outcome.critical() };
    if outcome.failed() {
        report.error(format!("{}: {}", outcome.name, outcome.detail));
    }
    report.record(outcome);
}

fn status_of(result: &Result<Probe>) -> String {
    match result {
        Ok(probe) => probe.status_code().to_string(),
        Err(e) => format!("No response ({})", e),
    }
}

/// JSON body of a probe with the expected status.
fn json_with_status(result: &Result<Probe>, status: u16) -> std::result::Result<Value, String> {
    match result {
        Ok(probe) if probe.status_code() == status => {
            probe.json().map_err(|_| "Invalid JSON response".to_string())
        }
        _ => Err(format!("Status: {}", status_of(result))),
    }
}

async fn run_checks(ctx: &SuiteContext, report: &mut SuiteReport) {
    let env = ctx.client.get(&ctx.api(SUMMARIZE)).await;
    let outcome = match &env {
        Ok(probe) if probe.is_ok() => CheckOutcome::pass(
            "AI Environment",
            "AI endpoints accessible, environment configured",
        ),
        _ => CheckOutcome::fail(
            "AI Environment",
            "AI endpoints not accessible, check environment variables",
        ),
    };
    record(report, outcome, true);
    if ctx.should_stop(report) {
        return;
    }

    info!("=== Testing AI Summarize Endpoint ===");
    check_endpoint_health(ctx, report, "AI Summarize Health Check", SUMMARIZE).await;
    if ctx.should_stop(report) {
        return;
    }
    check_summarize(
        ctx,
        report,
        "AI Summarize Valid Request",
        "test-doc-1",
        "es",
    )
    .await;
    if ctx.should_stop(report) {
        return;
    }
    let invalid = SummarizeRequest {
        doc_id: None,
        locale: "es".into(),
        user_id: ctx.user_id.clone(),
    };
    let result = ctx.client.post_json(&ctx.api(SUMMARIZE), &invalid).await;
    let outcome = validation_outcome("AI Summarize Invalid Request", &result);
    record(report, outcome, false);
    if ctx.should_stop(report) {
        return;
    }
    check_summarize(
        ctx,
        report,
        "AI Summarize English Locale",
        "test-doc-2",
        "en",
    )
    .await;
    if ctx.should_stop(report) {
        return;
    }

    info!("=== Testing AI Questions Generation Endpoint ===");
    check_endpoint_health(ctx, report, "AI Questions Health Check", QUESTIONS).await;
    if ctx.should_stop(report) {
        return;
    }
    check_questions(ctx, report).await;
    if ctx.should_stop(report) {
        return;
    }
    let invalid = QuestionsRequest {
        doc_id: None,
        locale: "es".into(),
        n: 3,
        user_id: ctx.user_id.clone(),
    };
    let result = ctx.client.post_json(&ctx.api(QUESTIONS), &invalid).await;
    let outcome = validation_outcome("AI Questions Invalid Request", &result);
    record(report, outcome, false);
    if ctx.should_stop(report) {
        return;
    }
    check_question_count(ctx, report).await;
}

async fn check_endpoint_health(
    ctx: &SuiteContext,
    report: &mut SuiteReport,
    name: &str,
    path: &str,
) {
    let result = ctx.client.get(&ctx.api(path)).await;
    let outcome = match json_with_status(&result, 200) {
        Ok(body) if body.get("message").is_some() && body.get("usage").is_some() => {
            let message = body["message"].as_str().unwrap_or_default();
            CheckOutcome::pass(name, format!("Health: {}", message))
        }
        Ok(body) => CheckOutcome::fail(name, format!("Unexpected response: {}", body)),
        Err(detail) => CheckOutcome::fail(name, detail),
    };
    record(report, outcome, true);
}

async fn check_summarize(
    ctx: &SuiteContext,
    report: &mut SuiteReport,
    name: &str,
    doc_id: &str,
    locale: &str,
) {
    let payload = SummarizeRequest {
        doc_id: Some(doc_id.into()),
        locale: locale.into(),
        user_id: ctx.user_id.clone(),
    };
    let result = ctx.client.post_json(&ctx.api(SUMMARIZE), &payload).await;
    let outcome = match json_with_status(&result, 200) {
        Ok(body) => summary_outcome(name, &body),
        Err(detail) => CheckOutcome::fail(name, detail),
    };
    record(report, outcome, false);
}

fn flag(body: &Value, key: &str) -> bool {
    body.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn summary_outcome(name: &str, body: &Value) -> CheckOutcome {
    let missing: Vec<&str> = ["bullets", "abstract"]
        .into_iter()
        .filter(|field| body.get(*field).is_none())
        .collect();
    if !missing.is_empty() {
        return CheckOutcome::fail(name, format!("Missing fields: {}", missing.join(", ")));
    }
    let bullets = body["bullets"].as_array().map_or(0, Vec::len);
    let has_abstract = body["abstract"].as_str().is_some_and(|s| !s.is_empty());
    CheckOutcome::pass(
        name,
        format!(
            "Bullets: {}, Abstract: {}, Fallback: {}, Cached: {}",
            bullets,
            has_abstract,
            flag(body, "fallback"),
            flag(body, "cached")
        ),
    )
}

/// A request without `docId` must be rejected with 400 and an `error` field.
fn validation_outcome(name: &str, result: &Result<Probe>) -> CheckOutcome {
    match json_with_status(result, 400) {
        Ok(body) => match body.get("error") {
            Some(error) => CheckOutcome::pass(name, format!("Validation works: {}", error)),
            None => CheckOutcome::fail(name, "400 response missing error field"),
        },
        Err(_) if matches!(result, Ok(probe) if probe.status_code() == 400) => {
            CheckOutcome::fail(name, "Invalid JSON in error response")
        }
        Err(_) => CheckOutcome::fail(name, format!("Expected 400, got {}", status_of(result))),
    }
}

/// First generated question must be a well-formed multiple choice item.
fn question_shape_error(question: &Value) -> Option<String> {
    let missing: Vec<&str> = ["q", "choices", "correctIndex", "explain"]
        .into_iter()
        .filter(|field| question.get(*field).is_none())
        .collect();
    if !missing.is_empty() {
        return Some(format!("Missing question fields: {}", missing.join(", ")));
    }
    let choices_valid = question["choices"].as_array().is_some_and(|c| c.len() == 4);
    let index_valid = question["correctIndex"].as_u64().is_some_and(|i| i <= 3);
    if choices_valid && index_valid {
        None
    } else {
        Some("Invalid question structure (choices or correctIndex)".into())
    }
}

async fn check_questions(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "AI Questions Valid Request";

    let payload = QuestionsRequest {
        doc_id: Some("test-doc-1".into()),
        locale: "es".into(),
        n: 3,
        user_id: ctx.user_id.clone(),
    };
    let result = ctx.client.post_json(&ctx.api(QUESTIONS), &payload).await;
    let outcome = match json_with_status(&result, 200) {
        Ok(body) => match body.get("items").and_then(Value::as_array) {
            Some(items) if items.is_empty() => CheckOutcome::fail(NAME, "No questions generated"),
            Some(items) => match question_shape_error(&items[0]) {
                Some(error) => CheckOutcome::fail(NAME, error),
                None => CheckOutcome::pass(
                    NAME,
                    format!(
                        "Generated {} questions, Fallback: {}, Cached: {}",
                        items.len(),
                        flag(&body, "fallback"),
                        flag(&body, "cached")
                    ),
                ),
            },
            None => CheckOutcome::fail(NAME, "Missing or invalid 'items' field in response"),
        },
        Err(detail) => CheckOutcome::fail(NAME, detail),
    };
    record(report, outcome, false);
}

async fn check_question_count(ctx: &SuiteContext, report: &mut SuiteReport) {
    const NAME: &str = "AI Questions Custom Count";

    let payload = QuestionsRequest {
        doc_id: Some("test-doc-3".into()),
        locale: "es".into(),
        n: 5,
        user_id: ctx.user_id.clone(),
    };
    let result = ctx.client.post_json(&ctx.api(QUESTIONS), &payload).await;
    let outcome = match json_with_status(&result, 200) {
        Ok(body) => match body.get("items").and_then(Value::as_array) {
            Some(items) => {
                CheckOutcome::pass(NAME, format!("Requested 5, got {} questions", items.len()))
            }
            None => CheckOutcome::fail(NAME, "Missing or invalid 'items' field"),
        },
        Err(detail) => CheckOutcome::fail(NAME, detail),
    };
    record(report, outcome, false);
}
