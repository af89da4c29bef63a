//! Format normalizer: raw log file → parsed records → typed table, with per-file diagnostics.

mod policy;
mod table;

pub use policy::{
    parse_flexible_timestamp, Coercion, CoercionPolicy, FieldPolicy, OnFailure, TimeFormat,
    ACCESS_TIME_FORMAT,
};
pub use table::{Cell, NormalizedTable, Row, STORAGE_TIME_FORMAT};

use crate::error::Error;
use crate::parsers::{LineOutcome, LogSource, RawLogLine};
use crate::storage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, trace, warn};

/// Something that went wrong with one source file. None of these are fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum FileIssue {
    Missing,
    Unreadable { reason: String },
    NoValidEntries,
    TableInvalidated { column: String, value: String },
    ColumnCleared { column: String, value: String },
    CellsDegraded { column: String, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub source: LogSource,
    pub path: PathBuf,
    pub matched: usize,
    pub skipped: usize,
    pub issues: Vec<FileIssue>,
}

impl FileReport {
    pub(crate) fn new(source: LogSource, path: &Path) -> Self {
        Self {
            source,
            path: path.to_path_buf(),
            matched: 0,
            skipped: 0,
            issues: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, issue: FileIssue) {
        let source = self.source.as_str();
        let path = self.path.display();
        match &issue {
            FileIssue::Missing => error!(source, %path, "log file not found"),
            FileIssue::Unreadable { reason } => error!(source, %path, %reason, "error reading log file"),
            FileIssue::NoValidEntries => warn!(source, %path, "no valid log entries found"),
            FileIssue::TableInvalidated { column, value } => {
                error!(source, %path, %column, %value, "coercion failed; table discarded")
            }
            FileIssue::ColumnCleared { column, value } => {
                error!(source, %path, %column, %value, "coercion failed; column set to missing")
            }
            FileIssue::CellsDegraded { column, count } => {
                warn!(source, %path, %column, count, "non-conforming values set to missing")
            }
        }
        self.issues.push(issue);
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub source: LogSource,
    pub table: NormalizedTable,
    pub report: FileReport,
}

/// Normalize one raw log file. A missing or unreadable file yields an empty table.
pub fn normalize(path: &Path, source: LogSource) -> Normalized {
    match std::fs::read(path) {
        Ok(bytes) => normalize_text(&String::from_utf8_lossy(&bytes), path, source),
        Err(e) => {
            let mut report = FileReport::new(source, path);
            report.record(match Error::from_io(path, e) {
                Error::MissingInput(_) => FileIssue::Missing,
                other => FileIssue::Unreadable {
                    reason: other.to_string(),
                },
            });
            Normalized {
                source,
                table: NormalizedTable::default(),
                report,
            }
        }
    }
}

/// Normalize text already in memory; `path` is only used for diagnostics.
pub fn normalize_text(text: &str, path: &Path, source: LogSource) -> Normalized {
    let parser = source.parser();
    let mut report = FileReport::new(source, path);
    let mut records = Vec::new();

    for (i, text) in text.lines().enumerate() {
        let line = RawLogLine {
            text,
            path,
            line_no: i + 1,
        };
        match parser.parse(line.text) {
            LineOutcome::Matched(record) => records.push(record),
            LineOutcome::Skipped => {
                report.skipped += 1;
                trace!(
                    source = source.as_str(),
                    path = %line.path.display(),
                    line = line.line_no,
                    "line skipped"
                );
            }
        }
    }
    report.matched = records.len();

    if records.is_empty() {
        report.record(FileIssue::NoValidEntries);
        return Normalized {
            source,
            table: NormalizedTable::default(),
            report,
        };
    }

    let mut table = NormalizedTable::from_records(records, parser.fixed_columns());
    for issue in CoercionPolicy::for_source(source).apply(&mut table) {
        report.record(issue);
    }

    info!(
        source = source.as_str(),
        path = %path.display(),
        matched = report.matched,
        skipped = report.skipped,
        rows = table.len(),
        "parsed log entries"
    );
    Normalized {
        source,
        table,
        report,
    }
}

/// Reload a persisted table and re-apply the source's coercion policy.
/// A missing or unreadable artifact yields an empty table.
pub fn reload(path: &Path, source: LogSource) -> Normalized {
    let mut report = FileReport::new(source, path);
    let mut table = match storage::read_table(path) {
        Ok(t) => t,
        Err(e) => {
            report.record(match e {
                Error::MissingInput(_) => FileIssue::Missing,
                other => FileIssue::Unreadable {
                    reason: other.to_string(),
                },
            });
            return Normalized {
                source,
                table: NormalizedTable::default(),
                report,
            };
        }
    };
    report.matched = table.len();
    for issue in CoercionPolicy::for_source(source).apply(&mut table) {
        report.record(issue);
    }
    info!(source = source.as_str(), path = %path.display(), rows = table.len(), "loaded table");
    Normalized {
        source,
        table,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS: &str = "\
10.0.0.1 - - [15/Jan/2024:10:00:00 +0000] \"GET / HTTP/1.1\" 200 100 \"-\" \"curl\"
garbage line
10.0.0.1 - - [15/Jan/2024:12:00:00 +0000] \"GET /a HTTP/1.1\" 200 200 \"-\" \"curl\"
";

    #[test]
    fn counts_matched_and_skipped() {
        let n = normalize_text(ACCESS, Path::new("mem"), LogSource::Access);
        assert_eq!(n.report.matched, 2);
        assert_eq!(n.report.skipped, 1);
        assert!(n.report.issues.is_empty());
        assert_eq!(n.table.len(), 2);
        assert_eq!(n.table.cell(1, "size"), &Cell::Int(200));
    }

    #[test]
    fn missing_file_is_distinct_from_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = normalize(&dir.path().join("nope.log"), LogSource::Firewall);
        assert!(missing.table.is_empty());
        assert_eq!(missing.report.issues, vec![FileIssue::Missing]);

        let path = dir.path().join("empty.log");
        std::fs::write(&path, "nothing to see\n\n").unwrap();
        let empty = normalize(&path, LogSource::Firewall);
        assert!(empty.table.is_empty());
        assert_eq!(empty.report.skipped, 2);
        assert_eq!(empty.report.issues, vec![FileIssue::NoValidEntries]);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sys.log");
        std::fs::write(&path, b"user=al\xffice severity=3\n").unwrap();
        let n = normalize(&path, LogSource::System);
        assert_eq!(n.table.len(), 1);
        assert_eq!(n.table.cell(0, "severity"), &Cell::Text("3".into()));
    }

    #[test]
    fn reload_missing_artifact_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let n = reload(&dir.path().join("system.csv"), LogSource::System);
        assert!(n.table.is_empty());
        assert_eq!(n.report.issues, vec![FileIssue::Missing]);
    }
}
