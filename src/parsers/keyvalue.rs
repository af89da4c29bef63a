//! Permissive `key=value` grammar shared by firewall and system logs.

use super::{LineOutcome, LineParser, ParsedRecord};
use regex::Regex;
use std::sync::OnceLock;

static PAIR_RE: OnceLock<Regex> = OnceLock::new();

fn pair_re() -> &'static Regex {
    PAIR_RE.get_or_init(|| Regex::new(r"(\w+)=(\S+)").expect("key=value pattern"))
}

/// Collects every `key=value` occurrence on the line. No key is mandatory.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyValueParser;

impl LineParser for KeyValueParser {
    fn parse(&self, line: &str) -> LineOutcome {
        let mut record = ParsedRecord::new();
        for caps in pair_re().captures_iter(line) {
            record.insert(&caps[1], &caps[2]);
        }
        if record.is_empty() {
            LineOutcome::Skipped
        } else {
            LineOutcome::Matched(record)
        }
    }
}
