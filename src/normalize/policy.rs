//! Per-source type coercion and what happens when it fails.
//!
//! The access table is all-or-nothing because hour bucketing needs every timestamp;
//! firewall ports degrade one cell at a time; a bad system timestamp clears only its column.

use super::table::{Cell, NormalizedTable, STORAGE_TIME_FORMAT};
use super::FileIssue;
use crate::parsers::LogSource;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

pub const ACCESS_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// A single strftime pattern with offset
    Exact(&'static str),
    /// RFC 3339 and the common ISO-like shapes; naive values are UTC
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Integer,
    Timestamp(TimeFormat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Discard every row of the table
    WholeTable,
    /// Only the failing cell becomes Missing
    PerRow,
    /// Every cell of the column becomes Missing
    WholeColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub column: &'static str,
    pub coercion: Coercion,
    pub on_failure: OnFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoercionPolicy {
    pub fields: &'static [FieldPolicy],
}

const ACCESS_FIELDS: &[FieldPolicy] = &[
    FieldPolicy {
        column: "time",
        coercion: Coercion::Timestamp(TimeFormat::Exact(ACCESS_TIME_FORMAT)),
        on_failure: OnFailure::WholeTable,
    },
    FieldPolicy {
        column: "status",
        coercion: Coercion::Integer,
        on_failure: OnFailure::WholeTable,
    },
    FieldPolicy {
        column: "size",
        coercion: Coercion::Integer,
        on_failure: OnFailure::WholeTable,
    },
];

const FIREWALL_FIELDS: &[FieldPolicy] = &[FieldPolicy {
    column: "port",
    coercion: Coercion::Integer,
    on_failure: OnFailure::PerRow,
}];

const SYSTEM_FIELDS: &[FieldPolicy] = &[FieldPolicy {
    column: "timestamp",
    coercion: Coercion::Timestamp(TimeFormat::Flexible),
    on_failure: OnFailure::WholeColumn,
}];

impl CoercionPolicy {
    pub fn for_source(source: LogSource) -> Self {
        let fields = match source {
            LogSource::Access => ACCESS_FIELDS,
            LogSource::Firewall => FIREWALL_FIELDS,
            LogSource::System => SYSTEM_FIELDS,
        };
        Self { fields }
    }

    /// Coerce `table` in place. Returns what degraded; the row count only changes when a
    /// whole-table field fails, in which case the table is left empty.
    pub fn apply(&self, table: &mut NormalizedTable) -> Vec<FileIssue> {
        let mut issues = Vec::new();
        for field in self.fields {
            if !table.has_column(field.column) {
                continue;
            }
            let mut coerced = Vec::with_capacity(table.len());
            let mut failures: Vec<usize> = Vec::new();
            for (i, cell) in table.column(field.column).enumerate() {
                match coerce(cell, field.coercion) {
                    Some(c) => coerced.push(c),
                    None => {
                        failures.push(i);
                        coerced.push(Cell::Missing);
                    }
                }
            }

            if let Some(&first) = failures.first() {
                let value = table.cell(first, field.column).to_string();
                match field.on_failure {
                    OnFailure::WholeTable => {
                        table.clear();
                        issues.push(FileIssue::TableInvalidated {
                            column: field.column.to_string(),
                            value,
                        });
                        return issues;
                    }
                    OnFailure::WholeColumn => {
                        coerced.iter_mut().for_each(|c| *c = Cell::Missing);
                        issues.push(FileIssue::ColumnCleared {
                            column: field.column.to_string(),
                            value,
                        });
                    }
                    OnFailure::PerRow => {
                        issues.push(FileIssue::CellsDegraded {
                            column: field.column.to_string(),
                            count: failures.len(),
                        });
                    }
                }
            }

            for (i, cell) in coerced.into_iter().enumerate() {
                table.set(i, field.column, cell);
            }
        }
        issues
    }
}

/// `None` means the value could not be converted. Missing stays Missing.
fn coerce(cell: &Cell, coercion: Coercion) -> Option<Cell> {
    match (cell, coercion) {
        (Cell::Missing, _) => Some(Cell::Missing),
        (Cell::Int(_), Coercion::Integer) | (Cell::Time(_), Coercion::Timestamp(_)) => {
            Some(cell.clone())
        }
        (Cell::Text(s), Coercion::Integer) => parse_integer(s).map(Cell::Int),
        (Cell::Text(s), Coercion::Timestamp(fmt)) => parse_timestamp(s, fmt).map(Cell::Time),
        _ => None,
    }
}

/// Integers, plus floats with no fractional part (`22.0` → 22).
fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    let f = s.parse::<f64>().ok()?;
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn parse_timestamp(s: &str, fmt: TimeFormat) -> Option<DateTime<FixedOffset>> {
    match fmt {
        TimeFormat::Exact(pattern) => DateTime::parse_from_str(s, pattern)
            .or_else(|_| DateTime::parse_from_str(s, STORAGE_TIME_FORMAT))
            .ok(),
        TimeFormat::Flexible => parse_flexible_timestamp(s),
    }
}

pub fn parse_flexible_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t);
    }
    for pattern in [STORAGE_TIME_FORMAT, "%Y-%m-%d %H:%M:%S%z", ACCESS_TIME_FORMAT] {
        if let Ok(t) = DateTime::parse_from_str(s, pattern) {
            return Some(t);
        }
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(t.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ParsedRecord;
    use chrono::Timelike;

    fn table(rows: &[&[(&str, &str)]]) -> NormalizedTable {
        let records = rows
            .iter()
            .map(|pairs| {
                let mut r = ParsedRecord::new();
                for (k, v) in *pairs {
                    r.insert(*k, *v);
                }
                r
            })
            .collect();
        NormalizedTable::from_records(records, &[])
    }

    #[test]
    fn access_bad_timestamp_discards_table() {
        let mut t = table(&[
            &[("ip", "a"), ("time", "10/Oct/2023:13:55:36 -0700"), ("status", "200"), ("size", "1")],
            &[("ip", "b"), ("time", "yesterday"), ("status", "200"), ("size", "1")],
        ]);
        let issues = CoercionPolicy::for_source(LogSource::Access).apply(&mut t);
        assert!(t.is_empty());
        assert_eq!(
            issues,
            vec![FileIssue::TableInvalidated {
                column: "time".into(),
                value: "yesterday".into()
            }]
        );
    }

    #[test]
    fn access_coerces_types() {
        let mut t = table(&[&[
            ("time", "10/Oct/2023:13:55:36 -0700"),
            ("status", "404"),
            ("size", "2326"),
        ]]);
        assert!(CoercionPolicy::for_source(LogSource::Access).apply(&mut t).is_empty());
        assert_eq!(t.cell(0, "status"), &Cell::Int(404));
        assert_eq!(t.cell(0, "size"), &Cell::Int(2326));
        let time = t.cell(0, "time").as_time().unwrap();
        assert_eq!(time.hour(), 13);
    }

    #[test]
    fn firewall_bad_port_degrades_one_cell() {
        let mut t = table(&[
            &[("source_ip", "a"), ("port", "22")],
            &[("source_ip", "a"), ("port", "ssh")],
            &[("source_ip", "b")],
        ]);
        let issues = CoercionPolicy::for_source(LogSource::Firewall).apply(&mut t);
        assert_eq!(t.len(), 3);
        assert_eq!(t.cell(0, "port"), &Cell::Int(22));
        assert_eq!(t.cell(1, "port"), &Cell::Missing);
        assert_eq!(
            issues,
            vec![FileIssue::CellsDegraded {
                column: "port".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn system_bad_timestamp_clears_column_only() {
        let mut t = table(&[
            &[("timestamp", "2024-01-15T10:00:00Z"), ("user", "alice")],
            &[("timestamp", "garbage"), ("user", "bob")],
        ]);
        let issues = CoercionPolicy::for_source(LogSource::System).apply(&mut t);
        assert_eq!(t.len(), 2);
        assert!(t.column("timestamp").all(Cell::is_missing));
        assert_eq!(t.cell(1, "user"), &Cell::Text("bob".into()));
        assert!(matches!(issues[0], FileIssue::ColumnCleared { .. }));
    }

    #[test]
    fn absent_column_is_not_a_failure() {
        let mut t = table(&[&[("user", "alice")]]);
        assert!(CoercionPolicy::for_source(LogSource::System).apply(&mut t).is_empty());
        assert!(CoercionPolicy::for_source(LogSource::Firewall).apply(&mut t).is_empty());
    }

    #[test]
    fn flexible_shapes() {
        for s in [
            "2024-01-15T10:00:00Z",
            "2024-01-15T10:00:00+02:00",
            "2024-01-15 10:00:00",
            "2024-01-15T10:00:00",
            "2024-01-15 10:00:00.250",
            "2024-01-15 10:00:00+00:00",
            "2024-01-15",
        ] {
            assert!(parse_flexible_timestamp(s).is_some(), "{s}");
        }
        assert!(parse_flexible_timestamp("15 Jan").is_none());
    }

    #[test]
    fn storage_rendering_reloads() {
        let t = DateTime::parse_from_str("10/Oct/2023:13:55:36 -0700", ACCESS_TIME_FORMAT).unwrap();
        let rendered = Cell::Time(t).to_string();
        assert_eq!(rendered, "2023-10-10 13:55:36-07:00");
        assert_eq!(
            parse_timestamp(&rendered, TimeFormat::Exact(ACCESS_TIME_FORMAT)),
            Some(t)
        );
    }

    #[test]
    fn integral_floats_count_as_integers() {
        let cell = |s: &str| coerce(&Cell::Text(s.into()), Coercion::Integer);
        assert_eq!(cell("22.0"), Some(Cell::Int(22)));
        assert_eq!(cell(" 443 "), Some(Cell::Int(443)));
        assert_eq!(cell("22.5"), None);
        assert_eq!(cell("NaN"), None);
        assert_eq!(cell("inf"), None);
        assert_eq!(cell("ssh"), None);
    }
}
