use anyhow::Result;
use clap::Parser;
use nhlscraper::{Pipeline, PipelineConfig};
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Scrape every page of the NHL team stats listing into a zip archive and
/// an xlsx workbook, then add a winner/loser sheet per year.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// YAML file overriding the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let start = Instant::now();

    // ─── 2) configure ────────────────────────────────────────────────
    let config = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path)?,
        None => PipelineConfig::default(),
    };
    info!(
        base = %config.source.base_url,
        archive = %config.output.archive_path.display(),
        workbook = %config.output.workbook_path.display(),
        "startup"
    );

    // ─── 3) run ──────────────────────────────────────────────────────
    let pipeline = Pipeline::from_config(config)?;
    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, elapsed = ?start.elapsed(), "run failed");
            return Err(e.into());
        }
    };

    info!(
        groups = report.aggregate.len(),
        elapsed = ?start.elapsed(),
        "all done"
    );
    Ok(())
}
