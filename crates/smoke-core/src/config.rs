//! Centralized configuration for smoke runs.
//!
//! Constant tables hold the defaults the suites were written against; a
//! [`SmokeConfig`] carries the per-run values resolved from the command line.

use crate::error::{Result, SmokeError};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3000";
    pub const API_PREFIX: &'static str = "/api";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const QUICK_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
    pub const USER_AGENT: &'static str = "Spiread-Backend-Test/1.0.0-rc.1";
    pub const ACCEPT: &'static str =
        "application/json, text/html, application/xml, text/plain, */*";
    /// Characters of a response body kept in error messages.
    pub const ERROR_PREVIEW_CHARS: usize = 100;
    pub const DETAIL_PREVIEW_CHARS: usize = 200;
}

/// Release-candidate expectations checked by the `release` suite.
pub struct ReleaseConfig;

impl ReleaseConfig {
    pub const EXPECTED_VERSION: &'static str = "1.0.0-rc.1";
    pub const READY_STATUS: &'static str = "READY_FOR_RC";
    pub const SW_VERSION_MARKER: &'static str = "spiread-v1";
    pub const PRODUCT_NAME: &'static str = "Spiread - Acelera tu lectura, mejora tu comprensión";
    pub const SHORT_NAME: &'static str = "Spiread";
    pub const MIN_SUCCESS_RATE: f64 = 90.0;
}

/// Thresholds for the `security` suite.
pub struct SecurityConfig;

impl SecurityConfig {
    /// Minimum weighted score, in percent, for the suite to pass.
    pub const MIN_SCORE: f64 = 80.0;
    pub const HSTS_MIN_DAYS: u64 = 180;
    pub const CSP_REPORT_CONTENT_TYPE: &'static str = "application/csp-report";
}

/// Latency budgets for the performance checks.
pub struct PerformanceConfig;

impl PerformanceConfig {
    pub const PAGE_LOAD_BUDGET: Duration = Duration::from_millis(2500);
    pub const API_LATENCY_BUDGET: Duration = Duration::from_millis(1000);
    pub const PAUSE_BETWEEN_CHECKS: Duration = Duration::from_millis(500);
}

/// How the test user id is chosen for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UserIdStrategy {
    /// Use the same id for every request.
    Fixed(String),
    /// Generate a UUID v4 once per run.
    #[default]
    Random,
}

impl UserIdStrategy {
    /// Resolve the strategy into a concrete id.
    pub fn resolve(&self) -> String {
        match self {
            UserIdStrategy::Fixed(id) => id.clone(),
            UserIdStrategy::Random => uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Per-run configuration.
#[derive(Debug, Clone)]
pub struct SmokeConfig {
    base_url: Url,
    pub api_prefix: String,
    pub timeout: Duration,
    pub user_id: UserIdStrategy,
    pub user_agent: String,
    pub pause_between_checks: Duration,
    pub expected_version: String,
    pub page_load_budget: Duration,
    pub api_latency_budget: Duration,
    pub output: Option<PathBuf>,
}

impl SmokeConfig {
    /// Start building a configuration for the given deployment.
    pub fn builder(base_url: impl Into<String>) -> SmokeConfigBuilder {
        SmokeConfigBuilder::new(base_url)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// URL of a path under the API prefix, e.g. `api_url("/health")`.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url(),
            self.api_prefix.trim_end_matches('/'),
            normalize_path(path)
        )
    }

    /// URL of a site path outside the API, e.g. `site_url("/sw.js")`.
    pub fn site_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), normalize_path(path))
    }
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self::builder(NetworkConfig::DEFAULT_BASE_URL)
            .build()
            .expect("Default base URL must be valid")
    }
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Builder for [`SmokeConfig`].
///
/// # Example
///
/// ```rust
/// use spiread_smoke::config::{SmokeConfig, UserIdStrategy};
/// use std::time::Duration;
///
/// let config = SmokeConfig::builder("http://localhost:3000")
///     .timeout(Duration::from_secs(5))
///     .user_id(UserIdStrategy::Fixed("qa-user".into()))
///     .build()
///     .unwrap();
/// assert_eq!(config.api_url("/health"), "http://localhost:3000/api/health");
/// ```
pub struct SmokeConfigBuilder {
    base_url: String,
    api_prefix: String,
    timeout: Duration,
    user_id: UserIdStrategy,
    user_agent: String,
    pause_between_checks: Duration,
    expected_version: String,
    page_load_budget: Duration,
    api_latency_budget: Duration,
    output: Option<PathBuf>,
}

impl SmokeConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_prefix: NetworkConfig::API_PREFIX.to_string(),
            timeout: NetworkConfig::REQUEST_TIMEOUT,
            user_id: UserIdStrategy::default(),
            user_agent: NetworkConfig::USER_AGENT.to_string(),
            pause_between_checks: PerformanceConfig::PAUSE_BETWEEN_CHECKS,
            expected_version: ReleaseConfig::EXPECTED_VERSION.to_string(),
            page_load_budget: PerformanceConfig::PAGE_LOAD_BUDGET,
            api_latency_budget: PerformanceConfig::API_LATENCY_BUDGET,
            output: None,
        }
    }

    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Per-request timeout.
    ///
    /// Default: 10 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_id(mut self, strategy: UserIdStrategy) -> Self {
        self.user_id = strategy;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Pause inserted between checks by suites that pace themselves.
    ///
    /// Default: 500 ms
    pub fn pause_between_checks(mut self, pause: Duration) -> Self {
        self.pause_between_checks = pause;
        self
    }

    pub fn expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = version.into();
        self
    }

    pub fn page_load_budget(mut self, budget: Duration) -> Self {
        self.page_load_budget = budget;
        self
    }

    pub fn api_latency_budget(mut self, budget: Duration) -> Self {
        self.api_latency_budget = budget;
        self
    }

    /// Write the JSON run report to this path.
    pub fn output(mut self, path: Option<PathBuf>) -> Self {
        self.output = path;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<SmokeConfig> {
        let base_url = Url::parse(&self.base_url).map_err(|e| SmokeError::InvalidUrl {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SmokeError::InvalidUrl {
                url: self.base_url,
                message: format!("unsupported scheme '{}'", base_url.scheme()),
            });
        }

        if self.timeout.is_zero() {
            return Err(SmokeError::Config {
                message: "timeout must be greater than zero".into(),
            });
        }

        if let UserIdStrategy::Fixed(id) = &self.user_id {
            if id.trim().is_empty() {
                return Err(SmokeError::Config {
                    message: "user id must not be empty".into(),
                });
            }
        }

        let api_prefix = if self.api_prefix.is_empty() {
            String::new()
        } else {
            normalize_path(&self.api_prefix)
        };

        Ok(SmokeConfig {
            base_url,
            api_prefix,
            timeout: self.timeout,
            user_id: self.user_id,
            user_agent: self.user_agent,
            pause_between_checks: self.pause_between_checks,
            expected_version: self.expected_version,
            page_load_budget: self.page_load_budget,
            api_latency_budget: self.api_latency_budget,
            output: self.output,
        })
    }
}
