//! logsentry: batch log normalization, per-entity feature extraction and anomaly classification.
//!
//! Modular structure:
//! - [`parsers`]: Access-log grammar and key=value token extraction
//! - [`normalize`]: Raw file → typed table, with per-source coercion policies
//! - [`features`]: Per-entity aggregation and the merged feature table
//! - [`model`]: Random forest training, evaluation and inference
//! - [`storage`]: CSV artifacts between stages
//! - [`risk`]: Score → risk level
//! - [`report`]: Suspicious-log exports and the run report
//! - [`pipeline`]: Stage runners
//! - [`logging`]: Structured JSON logging

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod parsers;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod storage;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use features::{FeatureExtractor, FeatureTable, FeatureVector};
pub use logging::StructuredLogger;
pub use model::RandomForest;
pub use normalize::{NormalizedTable, Normalized};
pub use parsers::LogSource;
pub use risk::RiskEngine;
