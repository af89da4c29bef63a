//! Sparse, column-ordered table of typed cells.

use crate::parsers::ParsedRecord;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::fmt;

/// Rendering used when tables are persisted; accepted back by every timestamp coercion.
pub const STORAGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

static MISSING: Cell = Cell::Missing;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Text(String),
    Int(i64),
    Time(DateTime<FixedOffset>),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric view; text is parsed leniently, timestamps are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Cell::Missing | Cell::Time(_) => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Cell::Time(t) => Some(*t),
            Cell::Text(s) => super::policy::parse_flexible_timestamp(s),
            Cell::Missing | Cell::Int(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Time(t) => write!(f, "{}", t.format(STORAGE_TIME_FORMAT)),
        }
    }
}

/// A row keeps only the cells it has; anything absent reads as [`Cell::Missing`].
pub type Row = HashMap<String, Cell>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl NormalizedTable {
    pub fn with_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a text-only table. `fixed` pins the column order; otherwise columns appear in
    /// first-seen order across records.
    pub fn from_records(records: Vec<ParsedRecord>, fixed: &[&str]) -> Self {
        let mut table = Self::with_columns(fixed.iter().copied());
        for record in records {
            let mut row = Row::with_capacity(record.len());
            for (key, value) in record {
                if !table.has_column(&key) {
                    table.columns.push(key.clone());
                }
                row.insert(key, Cell::Text(value));
            }
            table.rows.push(row);
        }
        table
    }

    pub fn push_row(&mut self, row: Row) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&MISSING)
    }

    pub fn set(&mut self, row: usize, column: &str, cell: Cell) {
        if let Some(r) = self.rows.get_mut(row) {
            r.insert(column.to_string(), cell);
        }
    }

    /// Every row's cell for `column`, Missing where absent.
    pub fn column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Cell> + 'a {
        self.rows
            .iter()
            .map(move |r| r.get(column).unwrap_or(&MISSING))
    }

    /// Keep rows whose `column` text is in `keys`; columns are unchanged.
    pub fn filter_by_key(&self, column: &str, keys: &[String]) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|r| {
                r.get(column)
                    .map(|c| keys.iter().any(|k| *k == c.to_string()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Drop all rows and columns.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, &str)]) -> ParsedRecord {
        let mut r = ParsedRecord::new();
        for (k, v) in pairs {
            r.insert(*k, *v);
        }
        r
    }

    #[test]
    fn columns_follow_first_appearance() {
        let t = NormalizedTable::from_records(
            vec![rec(&[("b", "1"), ("a", "2")]), rec(&[("c", "3"), ("a", "4")])],
            &[],
        );
        assert_eq!(t.columns(), &["b", "a", "c"]);
        assert_eq!(t.cell(1, "b"), &Cell::Missing);
        assert_eq!(t.cell(1, "c"), &Cell::Text("3".into()));
    }

    #[test]
    fn text_numbers_read_as_f64() {
        assert_eq!(Cell::Text(" 4 ".into()).as_f64(), Some(4.0));
        assert_eq!(Cell::Text("high".into()).as_f64(), None);
        assert_eq!(Cell::Text("NaN".into()).as_f64(), None);
        assert_eq!(Cell::Int(-3).as_f64(), Some(-3.0));
    }

    #[test]
    fn filter_keeps_matching_rows() {
        let t = NormalizedTable::from_records(
            vec![rec(&[("ip", "a")]), rec(&[("ip", "b")]), rec(&[("x", "a")])],
            &[],
        );
        let f = t.filter_by_key("ip", &["a".to_string()]);
        assert_eq!(f.len(), 1);
        assert_eq!(f.columns(), t.columns());
    }
}
