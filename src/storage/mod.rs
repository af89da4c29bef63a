//! Persisted pipeline artifacts: normalized tables and the feature table as CSV with a header row.

mod tables;

pub use tables::{read_feature_table, read_table, write_feature_table, write_table};
