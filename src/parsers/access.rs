//! Combined access-log grammar (Apache/nginx "combined" format).

use super::{LineOutcome, LineParser, ParsedRecord};
use regex::Regex;
use std::sync::OnceLock;

pub const ACCESS_COLUMNS: [&str; 7] = [
    "ip",
    "time",
    "request",
    "status",
    "size",
    "referer",
    "user_agent",
];

static ACCESS_RE: OnceLock<Regex> = OnceLock::new();

fn access_re() -> &'static Regex {
    ACCESS_RE.get_or_init(|| {
        Regex::new(
            r#"^(?P<ip>\S+) \S+ \S+ \[(?P<time>.+?)\] "(?P<request>.+?)" (?P<status>\d+) (?P<size>\d+) "(?P<referer>.*?)" "(?P<user_agent>.*?)""#,
        )
        .expect("access log pattern")
    })
}

/// Matches the whole fielded shape or nothing; identity and user fields are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessLogParser;

impl LineParser for AccessLogParser {
    fn parse(&self, line: &str) -> LineOutcome {
        let Some(caps) = access_re().captures(line) else {
            return LineOutcome::Skipped;
        };
        let mut record = ParsedRecord::new();
        for name in ACCESS_COLUMNS {
            record.insert(name, caps.name(name).map_or("", |m| m.as_str()));
        }
        LineOutcome::Matched(record)
    }

    fn fixed_columns(&self) -> &'static [&'static str] {
        &ACCESS_COLUMNS
    }
}
