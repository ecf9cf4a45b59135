// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod notify;
pub mod pack;
pub mod render;
pub mod select;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::NotifierConfig;
pub use crate::engine::{run_from_config, run_once, RunSummary};
pub use crate::error::NotifierError;
pub use crate::render::OutputFormat;
