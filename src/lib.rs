//! Whale Wallet Watcher
//!
//! Polls a large-transaction feed, a spot price feed, a search API and a
//! hosted LLM, then renders a fixed-template report:
//! - Every upstream call is retried with a fixed delay
//! - Failures degrade to sentinel values, never to errors
//! - LLM completions are cached by exact prompt text
//! - Reports are appended to a plain-text log
//!
//! PIPELINE:
//! TRANSACTIONS → PRICES → COMPLIANCE → DOBBY → CONTEXT → RENDER

pub mod cache;
pub mod completion;
pub mod compliance;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod report;
pub mod retry;
pub mod sources;
pub mod telemetry;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use config::Config;
pub use report::{ReportAssembler, WhaleReport};
