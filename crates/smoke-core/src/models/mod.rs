//! Data models for the payloads the suites send.
//!
//! These shapes are owned by the Spiread API; they are kept here as typed
//! structs so every suite sends exactly the same field names.

pub mod games;
mod payloads;

pub use payloads::*;
