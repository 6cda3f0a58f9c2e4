//! HTTP probe client.
//!
//! Provides a wrapper around reqwest with:
//! - Configurable timeout and user agent
//! - Non-2xx responses returned as data, never as errors
//! - Body, headers and latency captured in a [`Probe`]

use crate::config::{NetworkConfig, SmokeConfig};
use crate::{Result, SmokeError};
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// The captured result of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct Probe {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub elapsed: Duration,
}

impl Probe {
    /// True for exactly 200, the only status the suites treat as success.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(SmokeError::from)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// The `Content-Type` header, or an empty string when absent.
    pub fn content_type(&self) -> &str {
        self.header(header::CONTENT_TYPE.as_str()).unwrap_or("")
    }

    /// First `max_chars` characters of the body.
    pub fn body_preview(&self, max_chars: usize) -> &str {
        match self.body.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.body[..idx],
            None => &self.body,
        }
    }

    /// `"<status> - <body preview>"`, the shape used in collected errors.
    pub fn error_summary(&self) -> String {
        format!(
            "{} - {}",
            self.status_code(),
            self.body_preview(NetworkConfig::ERROR_PREVIEW_CHARS)
        )
    }

    pub fn elapsed_ms(&self) -> f64 {
        (self.elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
    }
}

/// HTTP client used by every suite in a run.
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a client from the run configuration.
    pub fn new(config: &SmokeConfig) -> Result<Self> {
        Self::with_settings(config.timeout, &config.user_agent)
    }

    /// Create a client with an explicit timeout and user agent.
    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(NetworkConfig::ACCEPT),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| SmokeError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<Probe> {
        self.send(Method::GET, url, self.client.get(url), self.default_timeout)
            .await
    }

    /// Make a GET request with query parameters.
    pub async fn get_query(&self, url: &str, query: &[(&str, &str)]) -> Result<Probe> {
        let request = self.client.get(url).query(query);
        self.send(Method::GET, url, request, self.default_timeout)
            .await
    }

    /// Make a GET request with a per-request timeout.
    pub async fn get_with_timeout(&self, url: &str, timeout: Duration) -> Result<Probe> {
        let request = self.client.get(url).timeout(timeout);
        self.send(Method::GET, url, request, timeout).await
    }

    /// Make a HEAD request. Only status and headers are meaningful.
    pub async fn head(&self, url: &str) -> Result<Probe> {
        self.send(
            Method::HEAD,
            url,
            self.client.head(url),
            self.default_timeout,
        )
        .await
    }

    /// Make a POST request with JSON body.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Probe> {
        let request = self.client.post(url).json(body);
        self.send(Method::POST, url, request, self.default_timeout)
            .await
    }

    /// Make a POST request with a raw body and explicit content type.
    pub async fn post_body(&self, url: &str, content_type: &str, body: String) -> Result<Probe> {
        let request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(body);
        self.send(Method::POST, url, request, self.default_timeout)
            .await
    }

    /// Make an OPTIONS (CORS preflight) request.
    pub async fn options(&self, url: &str) -> Result<Probe> {
        let request = self.client.request(Method::OPTIONS, url);
        self.send(Method::OPTIONS, url, request, self.default_timeout)
            .await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Probe> {
        let start = Instant::now();

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SmokeError::Timeout(timeout)
            } else {
                SmokeError::Network {
                    message: format!("{} {} failed: {}", method, url, e),
                    cause: std::error::Error::source(&e).map(|s| s.to_string()),
                }
            }
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                SmokeError::Timeout(timeout)
            } else {
                SmokeError::Network {
                    message: format!("Reading body of {} {} failed: {}", method, url, e),
                    cause: None,
                }
            }
        })?;
        let elapsed = start.elapsed();

        debug!(
            "{} {} -> {} ({} bytes, {:?}) [{}]",
            method,
            url,
            status.as_u16(),
            body.len(),
            elapsed,
            extract_host(url)
        );

        Ok(Probe {
            method,
            url: url.to_string(),
            status,
            headers,
            body,
            elapsed,
        })
    }
}

/// Extract the host from a URL for log context.
pub fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(status: StatusCode, body: &str) -> Probe {
        Probe {
            method: Method::GET,
            url: "http://localhost:3000/api/health".into(),
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_extract_host() {
        assert_eq!(
            extract_host("https://brain-games-2.preview.emergentagent.com/api/health"),
            "brain-games-2.preview.emergentagent.com"
        );
        assert_eq!(extract_host("http://localhost:3000/sw.js"), "localhost");
        assert_eq!(extract_host("invalid-url"), "unknown");
    }

    #[test]
    fn test_probe_status_helpers() {
        assert!(probe(StatusCode::OK, "{}").is_ok());
        assert!(!probe(StatusCode::CREATED, "{}").is_ok());
        assert_eq!(probe(StatusCode::NOT_FOUND, "").status_code(), 404);
    }

    #[test]
    fn test_body_preview_respects_char_boundaries() {
        let p = probe(StatusCode::OK, "comprensión");
        assert_eq!(p.body_preview(10), "comprensió");
        assert_eq!(p.body_preview(50), "comprensión");
        assert_eq!(p.body_preview(0), "");
    }

    #[test]
    fn test_error_summary_truncates() {
        let long = "x".repeat(500);
        let p = probe(StatusCode::INTERNAL_SERVER_ERROR, &long);
        let summary = p.error_summary();
        assert!(summary.starts_with("500 - "));
        assert_eq!(summary.len(), "500 - ".len() + NetworkConfig::ERROR_PREVIEW_CHARS);
    }

    #[test]
    fn test_probe_json_and_headers() {
        let mut p = probe(StatusCode::OK, r#"{"status":"healthy"}"#);
        p.headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert_eq!(p.json().unwrap()["status"], "healthy");
        assert!(p.content_type().contains("application/json"));
        assert!(p.has_header("content-type"));
        assert!(!p.has_header("access-control-allow-origin"));

        assert!(probe(StatusCode::OK, "<html>").json().is_err());
    }

    #[test]
    fn test_client_creation() {
        let client =
            HttpClient::with_settings(Duration::from_secs(5), NetworkConfig::USER_AGENT).unwrap();
        assert_eq!(client.default_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client =
            HttpClient::with_settings(Duration::from_secs(2), NetworkConfig::USER_AGENT).unwrap();
        // Port 9 (discard) on loopback is closed on test machines.
        let err = client.get("http://127.0.0.1:9/api/health").await.unwrap_err();
        assert!(err.is_transport());
    }

    /// Accept connections and never answer them.
    async fn silent_listener() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_timeout_reports_the_per_request_budget() {
        let addr = silent_listener().await;
        let client =
            HttpClient::with_settings(Duration::from_secs(10), NetworkConfig::USER_AGENT).unwrap();

        let budget = Duration::from_millis(200);
        let err = client
            .get_with_timeout(&format!("http://{}/", addr), budget)
            .await
            .unwrap_err();
        assert!(
            matches!(err, SmokeError::Timeout(d) if d == budget),
            "unexpected error: {}",
            err
        );
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_timeout_reports_the_client_default() {
        let addr = silent_listener().await;
        let timeout = Duration::from_millis(300);
        let client = HttpClient::with_settings(timeout, NetworkConfig::USER_AGENT).unwrap();

        let err = client
            .get(&format!("http://{}/api/health", addr))
            .await
            .unwrap_err();
        assert!(
            matches!(err, SmokeError::Timeout(d) if d == timeout),
            "unexpected error: {}",
            err
        );
    }

    #[tokio::test]
    async fn test_bare_reqwest_timeout_converts_to_network_error() {
        let addr = silent_listener().await;
        let err = reqwest::Client::new()
            .get(format!("http://{}/", addr))
            .timeout(Duration::from_millis(200))
            .send()
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let err = SmokeError::from(err);
        match &err {
            SmokeError::Network { message, .. } => {
                assert!(message.starts_with("Request timed out"), "{}", message)
            }
            other => panic!("expected a network error, got {:?}", other),
        }
        assert!(err.is_transport());
    }
}
