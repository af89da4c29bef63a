//! logsentry entrypoint: runs one stage or the whole batch pipeline over the configured logs.

use clap::{Parser, Subcommand};
use logsentry::{
    config::PipelineConfig,
    logging::{AnomalyEvent, StructuredLogger},
    pipeline,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "logsentry", version, about = "Log normalization and anomaly detection pipeline")]
struct Cli {
    /// JSON config file (default: $LOGSENTRY_CONFIG_PATH, then ./logsentry.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resolve every default path under this directory when no config file is found
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[arg(long, global = true)]
    access_log: Option<PathBuf>,

    #[arg(long, global = true)]
    firewall_log: Option<PathBuf>,

    #[arg(long, global = true)]
    system_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Normalize raw logs into processed tables
    Preprocess,
    /// Build the per-entity feature table
    Features,
    /// Train and evaluate the classifier
    Train,
    /// Score entities with the saved model
    Predict,
    /// Export suspicious logs and write report.json
    Report,
    /// All stages in order
    Run,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let path = self.config.clone().unwrap_or_else(|| {
            std::env::var("LOGSENTRY_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logsentry.json"))
        });
        let mut config = match &self.root {
            Some(root) if !path.exists() => PipelineConfig::rooted(root),
            _ => PipelineConfig::load(&path),
        };
        let overrides: [(&Option<PathBuf>, &mut PathBuf); 3] = [
            (&self.access_log, &mut config.inputs.access_log),
            (&self.firewall_log, &mut config.inputs.firewall_log),
            (&self.system_log, &mut config.inputs.system_log),
        ];
        for (flag, slot) in overrides {
            if let Some(p) = flag {
                *slot = p.clone();
            }
        }
        config
    }
}

fn print_anomalies(predictions: &[logsentry::model::Prediction]) {
    let mut out = std::io::stdout().lock();
    for p in predictions.iter().filter(|p| p.predicted_label == 1) {
        StructuredLogger::emit_json(&AnomalyEvent::from_prediction(p), &mut out);
    }
}

fn log_failure(stage: &str, e: &logsentry::Error) {
    error!(stage, error = %e, "stage failed");
}

async fn dispatch(command: Command, config: &PipelineConfig) {
    match command {
        Command::Preprocess => {
            pipeline::preprocess(config).await;
        }
        Command::Features => {
            if let Err(e) = pipeline::build_features(config) {
                log_failure("features", &e);
            }
        }
        Command::Train => {
            if let Err(e) = pipeline::train(config) {
                log_failure("train", &e);
            }
        }
        Command::Predict => match pipeline::predict(config) {
            Ok(predictions) => print_anomalies(&predictions),
            Err(e) => log_failure("predict", &e),
        },
        Command::Report => {
            if let Err(e) = pipeline::report(config, None, None) {
                log_failure("report", &e);
            }
        }
        Command::Run => {
            let summary = pipeline::run(config).await;
            if let Some(predictions) = &summary.predictions {
                print_anomalies(predictions);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = cli.pipeline_config();

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(processed_dir = %config.processed_dir.display(), "logsentry starting");
    dispatch(cli.command, &config).await;
    info!("logsentry done");

    Ok(())
}
