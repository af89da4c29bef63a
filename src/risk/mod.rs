//! Grades classifier scores into risk levels.

mod engine;

pub use engine::{RiskEngine, RiskLevel, RiskResult};
