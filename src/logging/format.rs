//! JSON log lines: one JSON object per line (ndjson) for anomalies and run diagnostics.

use crate::model::Prediction;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// One detected anomaly as printed by `predict`.
#[derive(Debug, Serialize)]
pub struct AnomalyEvent<'a> {
    pub ts: String,
    pub kind: &'a str,
    pub entity: &'a str,
    pub risk_score: f32,
    pub risk_level: &'a str,
}

impl<'a> AnomalyEvent<'a> {
    pub fn from_prediction(p: &'a Prediction) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            kind: "anomaly",
            entity: &p.ip,
            risk_score: p.score,
            risk_level: p.level.as_str(),
        }
    }
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber writing to stdout; `RUST_LOG` overrides `default_level`.
    /// A second call is a no-op.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stdout);
            let _ = tracing_subscriber::registry().with(filter).with(fmt).try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .try_init();
        }
    }

    /// Emit a single structured line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}
