//! Structured logging setup and ndjson event output.

mod format;

pub use format::{AnomalyEvent, StructuredLogger};
