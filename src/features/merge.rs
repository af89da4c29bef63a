//! Full outer join of the per-source aggregates on the entity key.

use super::{Aggregate, FeatureTable, FeatureVector};
use std::collections::BTreeSet;

/// Union of all keys, one row each. Any statistic a source did not provide for an entity is
/// zero, so "no data" and "zero activity" look the same downstream.
pub fn merge(access: &Aggregate, firewall: &Aggregate, system: &Aggregate) -> FeatureTable {
    let sources = [access, firewall, system];
    let keys: BTreeSet<&str> = sources.iter().flat_map(|a| a.keys()).collect();

    let rows = keys
        .into_iter()
        .map(|key| {
            let mut row = FeatureVector::zeroed(key);
            for agg in sources {
                for column in agg.profile.output_columns() {
                    row.set(column, agg.value(key, column).unwrap_or(0.0));
                }
            }
            row
        })
        .collect();
    FeatureTable::from_rows(rows, false)
}
