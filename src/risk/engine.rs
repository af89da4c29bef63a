//! Maps an entity's anomaly score to a risk level using configurable thresholds.

use crate::config::RiskConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f32, config: &RiskConfig) -> Self {
        if score >= config.high_threshold {
            RiskLevel::High
        } else if score >= config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Risk result for a single entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub entity: String,
    pub score: f32,
    pub level: RiskLevel,
}

pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, entity: impl Into<String>, raw_score: f32) -> RiskResult {
        let score = raw_score.clamp(0.0, 1.0);
        RiskResult {
            entity: entity.into(),
            score,
            level: RiskLevel::from_score(score, &self.config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        let engine = RiskEngine::new(RiskConfig::default());
        assert_eq!(engine.score("a", 0.3).level, RiskLevel::Low);
        assert_eq!(engine.score("b", 0.5).level, RiskLevel::Medium);
        assert_eq!(engine.score("c", 0.9).level, RiskLevel::High);
        assert_eq!(engine.score("d", 1.7).score, 1.0);
    }
}
