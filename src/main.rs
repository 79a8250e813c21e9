//! Pod failure analysis CLI
//!
//! Offline stand-in for the HTTP surface that is out of scope for this
//! crate: loads a pattern directory (and optionally a YAML config
//! overriding scoring knobs), reads a log file (or stdin) plus a pod name,
//! runs one analysis, and prints the resulting `AnalysisResult` as pretty
//! JSON.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use podmortem_pattern_engine::config::EngineConfig;
use podmortem_pattern_engine::orchestrator::PodFailureData;
use podmortem_pattern_engine::scoring::{FrequencyTracker, ScoringConfig, ScoringPipeline};
use podmortem_pattern_engine::{AnalysisOrchestrator, PatternRegistry};

#[derive(Parser, Debug)]
#[command(
    name = "podmortem-analyze",
    version,
    about = "Diagnose a failed container workload from its captured logs"
)]
struct Cli {
    /// Directory of pattern-set YAML files
    #[arg(long)]
    patterns: PathBuf,

    /// Optional YAML config overriding scoring defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the pod the logs were captured from
    #[arg(long)]
    pod_name: String,

    /// Log file to analyze; reads stdin if omitted
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => podmortem_pattern_engine::config::load_config(path)
            .context("failed to load config file")?,
        None => EngineConfig {
            pattern_directory: cli.patterns.clone(),
            ..Default::default()
        },
    };

    tracing::info!(patterns_dir = %cli.patterns.display(), "loading pattern registry");
    let registry = Arc::new(
        PatternRegistry::load_directory(&cli.patterns)
            .context("failed to load pattern registry")?,
    );
    tracing::info!(pattern_count = registry.len(), "pattern registry loaded");

    let scoring_config = ScoringConfig {
        chronological: config.chronological_config(),
        proximity: config.proximity_config(),
        context_scorer: config.context_scorer_variant(),
    };
    let frequency = Arc::new(FrequencyTracker::new(config.frequency_config()));
    let pipeline = ScoringPipeline::new(scoring_config, frequency);
    let orchestrator = AnalysisOrchestrator::new(registry, pipeline);

    let logs = read_logs(cli.log_file.as_deref())?;
    let input = PodFailureData::new(logs, cli.pod_name);

    let result = orchestrator
        .analyze(&input)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("analysis failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn read_logs(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read log file {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read logs from stdin")?;
            Ok(buf)
        }
    }
}
