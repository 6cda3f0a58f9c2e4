//! In-process stand-in for a Spiread deployment.
//!
//! Serves the API routes under `/api` and the public assets at the root,
//! with in-memory storage so saved progress and runs can be read back.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use spiread_smoke::CancellationToken;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

/// Hardening headers added to every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityHeaders {
    /// Full header set with a tight policy and a one-year HSTS.
    Strict,
    /// Every header present, but unsafe script sources and a one-day HSTS.
    Weak,
    None,
}

/// Knobs for simulating broken deployments.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Answer preflights with CORS headers.
    pub cors: bool,
    /// Fail every write with the storage errors of a deployment without tables.
    pub storage_failures: bool,
    /// Blockers listed in the go/no-go object.
    pub release_blockers: Vec<String>,
    /// Answer progress, game run and settings reads with a 200 HTML error page.
    pub malformed_reads: bool,
    /// Cancelled when the health endpoint is hit, as ctrl-c would be mid-suite.
    pub interrupt: Option<CancellationToken>,
    pub security_headers: SecurityHeaders,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            cors: true,
            storage_failures: false,
            release_blockers: Vec::new(),
            malformed_reads: false,
            interrupt: None,
            security_headers: SecurityHeaders::Strict,
        }
    }
}

#[derive(Default)]
struct Store {
    progress: HashMap<String, Map<String, Value>>,
    runs: Vec<Value>,
    settings: HashMap<String, Map<String, Value>>,
    sessions: Vec<Value>,
}

struct MockState {
    options: MockOptions,
    store: Mutex<Store>,
}

type Shared = State<Arc<MockState>>;
type Params = Query<HashMap<String, String>>;
type Reply = (StatusCode, Json<Value>);

/// A running mock server; aborted on drop.
pub struct MockServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a mock deployment on an ephemeral port.
pub async fn spawn(options: MockOptions) -> MockServer {
    let cors = options.cors;
    let security_headers = options.security_headers;
    let malformed = options.malformed_reads;
    let state = Arc::new(MockState {
        options,
        store: Mutex::new(Store::default()),
    });

    let (progress_reads, run_reads, settings_reads) = if malformed {
        (get(proxy_error), get(proxy_error), get(proxy_error))
    } else {
        (get(progress_get), get(list_runs), get(get_settings))
    };

    let api = Router::new()
        .route("/health", get(health))
        .route("/progress/save", post(progress_save))
        .route("/progress/get", progress_reads)
        .route("/gameRuns", run_reads.post(create_run))
        .route("/settings", settings_reads.post(save_settings))
        .route("/sessionSchedules", get(list_sessions).post(create_session))
        .route("/ai/summarize", get(summarize_info).post(summarize))
        .route("/ai/questions", get(questions_info).post(questions))
        .route("/csp-report", post(csp_report));

    let mut app = Router::new()
        .nest("/api", api)
        .route("/", get(page))
        .route("/debug", get(debug))
        .route("/sw.js", get(service_worker))
        .route("/manifest.json", get(manifest))
        .route("/robots.txt", get(robots))
        .route("/sitemap.xml", get(sitemap))
        .route("/legal/privacy", get(page))
        .route("/legal/terms", get(page))
        .route("/offline", get(page))
        .with_state(state);

    app = match security_headers {
        SecurityHeaders::Strict => app.layer(middleware::map_response(strict_headers)),
        SecurityHeaders::Weak => app.layer(middleware::map_response(weak_headers)),
        SecurityHeaders::None => app,
    };

    if cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Mock server has no address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server error");
    });

    MockServer { addr, handle }
}

fn user_param(params: &HashMap<String, String>) -> Option<String> {
    params
        .get("userId")
        .or_else(|| params.get("user_id"))
        .cloned()
}

fn user_field(body: &Value) -> Option<String> {
    body.get("userId")
        .or_else(|| body.get("user_id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn bad_request(message: &str) -> Reply {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

const STRICT_CSP: &str = "default-src 'self'; script-src 'self'; \
    style-src 'self' 'unsafe-inline'; img-src 'self' data: blob:; connect-src 'self'; \
    worker-src 'self' blob:; frame-ancestors 'none'; report-uri /api/csp-report";
const WEAK_CSP: &str = "default-src 'self'; script-src 'self' 'unsafe-inline' 'unsafe-eval'";

fn add_security_headers(response: &mut Response, csp: &'static str, hsts: &'static str) {
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(csp),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static(hsts),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );
}

async fn strict_headers(mut response: Response) -> Response {
    add_security_headers(
        &mut response,
        STRICT_CSP,
        "max-age=31536000; includeSubDomains; preload",
    );
    response
}

async fn weak_headers(mut response: Response) -> Response {
    add_security_headers(&mut response, WEAK_CSP, "max-age=86400");
    response
}

/// What a misrouted read looks like behind a broken proxy.
async fn proxy_error() -> Html<&'static str> {
    Html("<html><body>proxy error</body></html>")
}

async fn csp_report() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health(State(state): Shared) -> Json<Value> {
    if let Some(token) = &state.options.interrupt {
        token.cancel();
    }
    Json(json!({
        "status": "healthy",
        "version": "1.0.0-rc.1",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn progress_save(State(state): Shared, Json(body): Json<Value>) -> Reply {
    if state.options.storage_failures {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch current settings" })),
        );
    }
    let game = body.get("game").and_then(Value::as_str);
    let (Some(user), Some(game)) = (user_field(&body), game) else {
        return bad_request("userId and game are required");
    };
    let progress = body.get("progress").cloned().unwrap_or_else(|| json!({}));

    let mut store = state.store.lock().unwrap();
    store
        .progress
        .entry(user)
        .or_default()
        .insert(game.to_string(), progress);

    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": format!("Progress saved for {}", game) })),
    )
}

async fn progress_get(State(state): Shared, Query(params): Params) -> Reply {
    let Some(user) = user_param(&params) else {
        return bad_request("userId is required");
    };
    let store = state.store.lock().unwrap();
    let saved = store.progress.get(&user).cloned().unwrap_or_default();

    let progress = match params.get("game") {
        Some(game) => match saved.get(game) {
            Some(entry) => {
                let mut only = Map::new();
                only.insert(game.clone(), entry.clone());
                Value::Object(only)
            }
            None => json!({}),
        },
        None => Value::Object(saved),
    };
    (StatusCode::OK, Json(json!({ "progress": progress })))
}

async fn list_runs(State(state): Shared, Query(params): Params) -> Reply {
    let Some(user) = user_param(&params) else {
        return bad_request("userId is required");
    };
    let store = state.store.lock().unwrap();
    let runs: Vec<Value> = store
        .runs
        .iter()
        .filter(|run| user_field(run).as_deref() == Some(user.as_str()))
        .cloned()
        .collect();
    (StatusCode::OK, Json(Value::Array(runs)))
}

async fn create_run(State(state): Shared, Json(mut body): Json<Value>) -> Reply {
    if state.options.storage_failures {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to create game run",
                "details": "new row violates row-level security policy"
            })),
        );
    }
    if user_field(&body).is_none() || body.get("game").and_then(Value::as_str).is_none() {
        return bad_request("userId and game are required");
    }

    let mut store = state.store.lock().unwrap();
    body["id"] = json!(store.runs.len() + 1);
    store.runs.push(body.clone());
    (StatusCode::OK, Json(body))
}

async fn get_settings(State(state): Shared, Query(params): Params) -> Reply {
    let Some(user) = user_param(&params) else {
        return bad_request("user_id is required");
    };
    let store = state.store.lock().unwrap();
    let mut settings = store.settings.get(&user).cloned().unwrap_or_default();
    settings.entry("user_id").or_insert_with(|| json!(user));
    settings.entry("language").or_insert_with(|| json!("es"));
    (StatusCode::OK, Json(Value::Object(settings)))
}

async fn save_settings(State(state): Shared, Json(body): Json<Value>) -> Reply {
    let (Some(user), Some(fields)) = (user_field(&body), body.as_object()) else {
        return bad_request("user_id is required");
    };
    let mut store = state.store.lock().unwrap();
    let saved = store.settings.entry(user).or_default();
    for (key, value) in fields {
        saved.insert(key.clone(), value.clone());
    }
    (StatusCode::OK, Json(Value::Object(saved.clone())))
}

async fn list_sessions(State(state): Shared, Query(params): Params) -> Reply {
    let Some(user) = user_param(&params) else {
        return bad_request("user_id is required");
    };
    let store = state.store.lock().unwrap();
    let sessions: Vec<Value> = store
        .sessions
        .iter()
        .filter(|s| user_field(s).as_deref() == Some(user.as_str()))
        .cloned()
        .collect();
    (StatusCode::OK, Json(Value::Array(sessions)))
}

async fn create_session(State(state): Shared, Json(mut body): Json<Value>) -> Reply {
    if user_field(&body).is_none() || body.get("template_type").is_none() {
        return bad_request("user_id and template_type are required");
    }
    let mut store = state.store.lock().unwrap();
    body["id"] = json!(format!("session-{}", store.sessions.len() + 1));
    store.sessions.push(body.clone());
    (StatusCode::OK, Json(body))
}

async fn summarize_info() -> Json<Value> {
    Json(json!({
        "message": "AI summarize endpoint is running",
        "usage": "POST { docId, locale, userId }"
    }))
}

async fn summarize(Json(body): Json<Value>) -> Reply {
    if body.get("docId").is_none() {
        return bad_request("docId is required");
    }
    (
        StatusCode::OK,
        Json(json!({
            "bullets": ["Primera idea", "Segunda idea", "Tercera idea"],
            "abstract": "Resumen del documento de prueba.",
            "fallback": true,
            "cached": false
        })),
    )
}

async fn questions_info() -> Json<Value> {
    Json(json!({
        "message": "AI questions endpoint is running",
        "usage": "POST { docId, locale, n, userId }"
    }))
}

async fn questions(Json(body): Json<Value>) -> Reply {
    if body.get("docId").is_none() {
        return bad_request("docId is required");
    }
    let n = body.get("n").and_then(Value::as_u64).unwrap_or(5);
    let items: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "q": format!("Pregunta {}", i + 1),
                "choices": ["A", "B", "C", "D"],
                "correctIndex": i % 4,
                "explain": "Explicación"
            })
        })
        .collect();
    (
        StatusCode::OK,
        Json(json!({ "items": items, "fallback": true, "cached": false })),
    )
}

async fn debug(State(state): Shared) -> Json<Value> {
    let blockers = &state.options.release_blockers;
    let overall = if blockers.is_empty() { "READY_FOR_RC" } else { "NOT_READY" };
    Json(json!({
        "goNoGo": {
            "version": "1.0.0-rc.1",
            "overall_status": overall,
            "checks": {
                "security": { "status": "OK" },
                "observability": { "status": "OK" },
                "analytics": { "status": "OK" },
                "pwa": { "status": "OK" },
                "seo_legal": { "status": "OK" }
            },
            "release_blockers": blockers
        }
    }))
}

const SERVICE_WORKER: &str = r#"
const CACHE_NAME = 'spiread-v1';
const CACHES = ['spiread-shell-v1', 'spiread-assets-v1', 'spiread-data-v1'];
const offlineQueue = { game_runs: [], session_schedules: [] };

self.addEventListener('install', (event) => {
  event.waitUntil(caches.open('spiread-shell-v1').then((cache) => cache.addAll(['/', '/offline'])));
});

self.addEventListener('activate', (event) => {
  event.waitUntil(caches.keys());
});

self.addEventListener('fetch', (event) => {
  event.respondWith(
    caches.open('spiread-data-v1').then((cache) =>
      cache.match(event.request).then((hit) => hit || fetch(event.request).then((res) => {
        cache.put(event.request, res.clone());
        return res;
      })).catch(() => caches.match('/offline'))
    )
  );
});

self.addEventListener('sync', (event) => {
  if (event.tag === 'background-sync') {
    event.waitUntil(retryWithBackoff(offlineQueue));
  }
});

async function retryWithBackoff(queue, attempt = 0) {
  // exponential delay between replays
  return new Promise((resolve) => setTimeout(resolve, 2 ** attempt * 1000));
}
"#;

async fn service_worker() -> Response {
    ([(header::CONTENT_TYPE, "application/javascript")], SERVICE_WORKER).into_response()
}

async fn manifest() -> Json<Value> {
    let icons: Vec<Value> = [72, 96, 128, 144, 152, 192, 384, 512]
        .iter()
        .map(|size| {
            json!({
                "src": format!("/icons/icon-{size}x{size}.png"),
                "sizes": format!("{size}x{size}"),
                "type": "image/png"
            })
        })
        .collect();
    Json(json!({
        "name": "Spiread - Acelera tu lectura, mejora tu comprensión",
        "short_name": "Spiread",
        "start_url": "/",
        "display": "standalone",
        "theme_color": "#1e40af",
        "background_color": "#ffffff",
        "icons": icons,
        "shortcuts": [
            { "name": "RSVP", "url": "/?tab=rsvp" },
            { "name": "Training", "url": "/?tab=training" },
            { "name": "Progress", "url": "/?tab=progress" }
        ],
        "features": ["offline", "background-sync", "installable", "responsive", "accessible"],
        "categories": ["education", "productivity", "games"]
    }))
}

async fn robots() -> &'static str {
    "User-agent: *\nAllow: /\nSitemap: /sitemap.xml\n"
}

async fn sitemap() -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset><url><loc>/</loc></url></urlset>"#,
    )
        .into_response()
}

async fn page() -> Html<&'static str> {
    Html("<!doctype html><html><head><title>Spiread</title></head><body>Spiread</body></html>")
}
