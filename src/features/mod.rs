//! Per-entity behavioral features aggregated from the three normalized tables.

mod aggregate;
mod merge;
mod pipeline;

pub use aggregate::{aggregate, Aggregate, AggregateProfile, Stat};
pub use merge::merge;
pub use pipeline::FeatureExtractor;

use serde::{Deserialize, Serialize};

/// Classifier input columns, in table order (the key and label are not features).
pub const FEATURE_COLUMNS: [&str; 7] = [
    "total_size",
    "avg_status",
    "avg_hour",
    "unique_ports",
    "deny_count",
    "event_count",
    "avg_severity",
];

/// One entity's merged features. Absent statistics are already zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub ip: String,
    pub total_size: f64,
    pub avg_status: f64,
    pub avg_hour: f64,
    pub unique_ports: f64,
    pub deny_count: f64,
    pub event_count: f64,
    pub avg_severity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<u8>,
}

impl FeatureVector {
    pub fn zeroed(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            total_size: 0.0,
            avg_status: 0.0,
            avg_hour: 0.0,
            unique_ports: 0.0,
            deny_count: 0.0,
            event_count: 0.0,
            avg_severity: 0.0,
            label: None,
        }
    }

    /// Values in [`FEATURE_COLUMNS`] order
    pub fn values(&self) -> [f64; 7] {
        [
            self.total_size,
            self.avg_status,
            self.avg_hour,
            self.unique_ports,
            self.deny_count,
            self.event_count,
            self.avg_severity,
        ]
    }

    /// Set a feature by column name; unknown names are ignored.
    pub fn set(&mut self, column: &str, value: f64) {
        let slot = match column {
            "total_size" => &mut self.total_size,
            "avg_status" => &mut self.avg_status,
            "avg_hour" => &mut self.avg_hour,
            "unique_ports" => &mut self.unique_ports,
            "deny_count" => &mut self.deny_count,
            "event_count" => &mut self.event_count,
            "avg_severity" => &mut self.avg_severity,
            _ => return,
        };
        *slot = value;
    }
}

/// The pipeline's terminal artifact: one row per entity, ascending by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureTable {
    rows: Vec<FeatureVector>,
    has_label: bool,
}

impl FeatureTable {
    pub fn from_rows(rows: Vec<FeatureVector>, has_label: bool) -> Self {
        Self { rows, has_label }
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [FeatureVector] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the table carries a label column (cells may still be empty).
    pub fn has_label(&self) -> bool {
        self.has_label
    }

    pub fn set_has_label(&mut self, has_label: bool) {
        self.has_label = has_label;
    }

    pub fn get(&self, ip: &str) -> Option<&FeatureVector> {
        self.rows.iter().find(|r| r.ip == ip)
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.ip.as_str())
    }

    /// Header row: key, features, then `label` when present.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut cols = Vec::with_capacity(9);
        cols.push("ip");
        cols.extend(FEATURE_COLUMNS);
        if self.has_label {
            cols.push("label");
        }
        cols
    }
}
