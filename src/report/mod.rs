//! Reporting: suspicious-log exports and a JSON summary of the run.

mod analysis;

pub use analysis::{hourly_request_trend, suspicious_entities, top_deny_entities, DenyCount};

use crate::error::{Error, Result};
use crate::model::{ClassificationReport, Prediction};
use crate::normalize::NormalizedTable;
use crate::parsers::LogSource;
use crate::storage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TOP_DENY_LIMIT: usize = 10;

/// File name of the suspicious-log export for `source`.
pub fn export_name(source: LogSource) -> &'static str {
    match source {
        LogSource::Access => "suspicious_apache_logs.csv",
        LogSource::Firewall => "suspicious_firewall_logs.csv",
        LogSource::System => "suspicious_system_logs.csv",
    }
}

/// Write each source's rows that belong to `entities` into `dir`, filtered on the source's
/// key column. Returns the written paths in source order.
pub fn export_suspicious_logs(
    tables: &[(LogSource, &NormalizedTable)],
    entities: &[String],
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(tables.len());
    for (source, table) in tables {
        let filtered = table.filter_by_key(source.key_column(), entities);
        let path = dir.join(export_name(*source));
        storage::write_table(&path, &filtered)?;
        info!(source = source.as_str(), path = %path.display(), rows = filtered.len(), "suspicious logs saved");
        written.push(path);
    }
    Ok(written)
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    /// Rule-based detections (any firewall deny)
    pub suspicious_entities: Vec<String>,
    /// Model-predicted anomalies
    pub anomalies: Vec<Prediction>,
    pub hourly_requests: Vec<u64>,
    pub top_deny: Vec<DenyCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<ClassificationReport>,
}

impl Report {
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
        }
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes).map_err(|e| Error::from_io(path, e))
    }
}
