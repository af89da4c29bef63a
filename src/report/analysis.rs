//! Rule-based detections and simple traffic statistics over the stage tables.

use crate::features::FeatureTable;
use crate::normalize::NormalizedTable;
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyCount {
    pub entity: String,
    pub denies: u64,
}

/// Entities with at least one firewall deny, ascending.
pub fn suspicious_entities(features: &FeatureTable) -> Vec<String> {
    let mut out: Vec<String> = features
        .rows()
        .iter()
        .filter(|r| r.deny_count > 0.0)
        .map(|r| r.ip.clone())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Requests per hour of day, taken in each timestamp's own offset. Rows without a valid time
/// are not counted.
pub fn hourly_request_trend(access: &NormalizedTable) -> [u64; 24] {
    let mut buckets = [0u64; 24];
    for hour in access.column("time").filter_map(|c| c.as_time()).map(|t| t.hour()) {
        buckets[hour as usize] += 1;
    }
    buckets
}

/// The `n` entities with the most `action=Deny` lines, most first; ties by key ascending.
pub fn top_deny_entities(firewall: &NormalizedTable, n: usize) -> Vec<DenyCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for i in 0..firewall.len() {
        if firewall.cell(i, "action").as_text() != Some("Deny") {
            continue;
        }
        if let Some(entity) = firewall.cell(i, "source_ip").as_text() {
            *counts.entry(entity).or_default() += 1;
        }
    }
    let mut ranked: Vec<DenyCount> = counts
        .into_iter()
        .map(|(entity, denies)| DenyCount {
            entity: entity.to_string(),
            denies,
        })
        .collect();
    ranked.sort_by(|a, b| b.denies.cmp(&a.denies).then_with(|| a.entity.cmp(&b.entity)));
    ranked.truncate(n);
    ranked
}
