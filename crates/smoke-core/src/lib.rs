//! Spiread Smoke - black-box HTTP smoke suites for the Spiread web API.
//!
//! Each suite probes one area of a running deployment (progress, game runs,
//! settings, session schedules, PWA assets, AI endpoints, release readiness,
//! security headers) and turns every response into a pass/warn/fail verdict.
//! Nothing here talks to the application's internals; only HTTP is used.
//!
//! # Example
//!
//! ```rust,ignore
//! use spiread_smoke::{CancellationToken, Runner, SmokeConfig, SuiteId};
//!
//! #[tokio::main]
//! async fn main() -> spiread_smoke::Result<()> {
//!     let config = SmokeConfig::builder("http://localhost:3000").build()?;
//!     let report = Runner::new(config)?
//!         .run(&[SuiteId::CoreUx, SuiteId::Release], CancellationToken::new())
//!         .await;
//!
//!     println!("{}", spiread_smoke::render_run(&report));
//!     std::process::exit(report.exit_code());
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod report;
pub mod suites;

mod runner;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use config::{SmokeConfig, SmokeConfigBuilder, UserIdStrategy};
pub use error::{Result, SmokeError};
pub use network::{HttpClient, Probe};
pub use report::{
    render_run, render_suite, CheckOutcome, CheckStatus, ExitCode, RunReport, SuiteReport,
    VerdictPolicy,
};
pub use runner::Runner;
pub use suites::{Suite, SuiteContext, SuiteId};
