//! Outcome model and summaries.

mod outcome;
mod render;
mod run;
mod suite;

pub use outcome::{CheckOutcome, CheckStatus};
pub use render::{render_run, render_suite};
pub use run::{ExitCode, RunReport};
pub use suite::{SuiteReport, VerdictPolicy};
