//! Group a normalized table by entity and summarize each group.

use crate::normalize::{Cell, NormalizedTable};
use crate::parsers::LogSource;
use chrono::Timelike;
use std::collections::{BTreeMap, HashSet};

/// Summary statistic over one group's rows. Missing and non-conforming cells are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    /// Zero when nothing is numeric
    Sum(&'static str),
    /// Absent when nothing is numeric
    Mean(&'static str),
    /// Mean hour-of-day of a timestamp column, in each timestamp's own offset
    MeanHour(&'static str),
    CountDistinct(&'static str),
    /// Rows whose cell equals the literal exactly
    CountEq(&'static str, &'static str),
    CountRows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateProfile {
    pub source: LogSource,
    pub key_column: &'static str,
    /// Name of the key in the merged namespace
    pub renamed_key: &'static str,
    pub outputs: &'static [(&'static str, Stat)],
}

const ACCESS: AggregateProfile = AggregateProfile {
    source: LogSource::Access,
    key_column: "ip",
    renamed_key: "ip",
    outputs: &[
        ("total_size", Stat::Sum("size")),
        ("avg_status", Stat::Mean("status")),
        ("avg_hour", Stat::MeanHour("time")),
    ],
};

const FIREWALL: AggregateProfile = AggregateProfile {
    source: LogSource::Firewall,
    key_column: "source_ip",
    renamed_key: "ip",
    outputs: &[
        ("unique_ports", Stat::CountDistinct("port")),
        ("deny_count", Stat::CountEq("action", "Deny")),
    ],
};

const SYSTEM: AggregateProfile = AggregateProfile {
    source: LogSource::System,
    key_column: "user",
    renamed_key: "ip",
    outputs: &[
        ("event_count", Stat::CountRows),
        ("avg_severity", Stat::Mean("severity")),
    ],
};

impl AggregateProfile {
    pub fn for_source(source: LogSource) -> Self {
        match source {
            LogSource::Access => ACCESS,
            LogSource::Firewall => FIREWALL,
            LogSource::System => SYSTEM,
        }
    }

    pub fn output_columns(&self) -> impl Iterator<Item = &'static str> {
        self.outputs.iter().map(|(name, _)| *name)
    }
}

/// Per-entity statistics for one source. The column list exists even with zero rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub profile: AggregateProfile,
    pub rows: BTreeMap<String, Vec<Option<f64>>>,
}

impl Aggregate {
    pub fn empty(profile: AggregateProfile) -> Self {
        Self {
            profile,
            rows: BTreeMap::new(),
        }
    }

    /// Key column first, then the profile's outputs
    pub fn columns(&self) -> Vec<&'static str> {
        std::iter::once(self.profile.renamed_key)
            .chain(self.profile.output_columns())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn value(&self, key: &str, column: &str) -> Option<f64> {
        let idx = self.profile.output_columns().position(|c| c == column)?;
        self.rows.get(key).and_then(|v| v[idx])
    }
}

pub fn aggregate(table: &NormalizedTable, profile: AggregateProfile) -> Aggregate {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, cell) in table.column(profile.key_column).enumerate() {
        let key = cell.to_string();
        if !key.is_empty() {
            groups.entry(key).or_default().push(i);
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, idx)| {
            let values = profile
                .outputs
                .iter()
                .map(|(_, stat)| compute(table, &idx, *stat))
                .collect();
            (key, values)
        })
        .collect();
    Aggregate { profile, rows }
}

fn compute(table: &NormalizedTable, rows: &[usize], stat: Stat) -> Option<f64> {
    let cells = |column: &'static str| rows.iter().map(move |&i| table.cell(i, column));
    match stat {
        Stat::Sum(col) => Some(cells(col).filter_map(Cell::as_f64).sum()),
        Stat::Mean(col) => mean(cells(col).filter_map(Cell::as_f64)),
        Stat::MeanHour(col) => mean(
            cells(col)
                .filter_map(Cell::as_time)
                .map(|t| f64::from(t.hour())),
        ),
        Stat::CountDistinct(col) => {
            let distinct: HashSet<String> = cells(col)
                .filter(|c| !c.is_missing())
                .map(Cell::to_string)
                .collect();
            Some(distinct.len() as f64)
        }
        Stat::CountEq(col, literal) => {
            Some(cells(col).filter(|c| c.as_text() == Some(literal)).count() as f64)
        }
        Stat::CountRows => Some(rows.len() as f64),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
