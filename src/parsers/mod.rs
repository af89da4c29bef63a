//! Line parsers: one grammar per log source, pure functions from a line to a record.

mod access;
mod keyvalue;

pub use access::AccessLogParser;
pub use keyvalue::KeyValueParser;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The three log streams the pipeline ingests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    Access,
    Firewall,
    System,
}

impl LogSource {
    pub const ALL: [LogSource; 3] = [LogSource::Access, LogSource::Firewall, LogSource::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Access => "access",
            LogSource::Firewall => "firewall",
            LogSource::System => "system",
        }
    }

    /// File name of the persisted normalized table
    pub fn artifact_name(&self) -> &'static str {
        match self {
            LogSource::Access => "apache_access.csv",
            LogSource::Firewall => "firewall.csv",
            LogSource::System => "system.csv",
        }
    }

    /// Column holding the entity key in this source's table
    pub fn key_column(&self) -> &'static str {
        match self {
            LogSource::Access => "ip",
            LogSource::Firewall => "source_ip",
            LogSource::System => "user",
        }
    }

    pub fn parser(&self) -> &'static dyn LineParser {
        static ACCESS: AccessLogParser = AccessLogParser;
        static KEY_VALUE: KeyValueParser = KeyValueParser;
        match self {
            LogSource::Access => &ACCESS,
            LogSource::Firewall | LogSource::System => &KEY_VALUE,
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of input, kept only long enough to parse it.
#[derive(Debug, Clone, Copy)]
pub struct RawLogLine<'a> {
    pub text: &'a str,
    pub path: &'a Path,
    /// 1-based
    pub line_no: usize,
}

/// Field name → raw string value, in first-seen order. Re-inserting a key overwrites its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    fields: Vec<(String, String)>,
}

impl ParsedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl IntoIterator for ParsedRecord {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Result of classifying one line against a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Matched(ParsedRecord),
    Skipped,
}

impl LineOutcome {
    pub fn into_record(self) -> Option<ParsedRecord> {
        match self {
            LineOutcome::Matched(r) => Some(r),
            LineOutcome::Skipped => None,
        }
    }
}

pub trait LineParser: Send + Sync {
    fn parse(&self, line: &str) -> LineOutcome;

    /// Columns this grammar always produces, in order. Empty for open schemas.
    fn fixed_columns(&self) -> &'static [&'static str] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_overwrites_in_place() {
        let mut r = ParsedRecord::new();
        r.insert("a", "1");
        r.insert("b", "2");
        r.insert("a", "3");
        assert_eq!(r.len(), 2);
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(r.get("a"), Some("3"));
    }

    #[test]
    fn sources_pick_their_grammar() {
        assert_eq!(LogSource::Access.parser().fixed_columns().len(), 7);
        assert!(LogSource::System.parser().fixed_columns().is_empty());
        assert_eq!(LogSource::Firewall.key_column(), "source_ip");
    }
}
