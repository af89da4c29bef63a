//! Feature extraction pipeline: normalized tables → per-source aggregates → merged feature table.

use super::{aggregate, merge, Aggregate, AggregateProfile, FeatureTable};
use crate::normalize::NormalizedTable;
use crate::parsers::LogSource;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate one source; an empty table yields an empty aggregate with its schema intact.
    pub fn aggregate_source(&self, source: LogSource, table: &NormalizedTable) -> Aggregate {
        let profile = AggregateProfile::for_source(source);
        if table.is_empty() {
            warn!(source = source.as_str(), "table is empty; skipping feature extraction");
            return Aggregate::empty(profile);
        }
        let agg = aggregate(table, profile);
        info!(source = source.as_str(), entities = agg.len(), "aggregated");
        agg
    }

    pub fn extract(
        &self,
        access: &NormalizedTable,
        firewall: &NormalizedTable,
        system: &NormalizedTable,
    ) -> FeatureTable {
        info!("extracting features from logs");
        let a = self.aggregate_source(LogSource::Access, access);
        let f = self.aggregate_source(LogSource::Firewall, firewall);
        let s = self.aggregate_source(LogSource::System, system);
        let table = merge(&a, &f, &s);
        info!(entities = table.len(), "feature extraction complete");
        table
    }
}
