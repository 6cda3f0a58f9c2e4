//! Network layer for issuing probes against the deployment under test.

mod client;

pub use client::{extract_host, HttpClient, Probe};
