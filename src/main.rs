use anyhow::Result;
use clap::Parser;
use plastic_fates::{
    config::{Config, Overrides},
    output::OutputFormat,
    pipeline,
};
use std::{env, path::PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Estimate plastic polymer mass per end-of-life fate by region and year"
)]
struct Args {
    /// YAML run configuration; compiled defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Simulation output table (path or http(s) URL)
    #[arg(long)]
    simulation: Option<String>,
    /// Static polymer matrix (path or http(s) URL)
    #[arg(long)]
    polymer_matrix: Option<String>,
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Spread output groups over all cores
    #[arg(long)]
    parallel: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("").add_directive(log_level.parse().unwrap_or(Level::INFO.into()))
    });
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) resolve configuration ────────────────────────────────────
    let args = Args::parse();
    let overrides = Overrides {
        simulation: args.simulation,
        polymer_matrix: args.polymer_matrix,
        output: args.output,
        format: args.format,
        parallel: args.parallel,
    };
    let config = Config::load(args.config.as_deref(), &overrides)?;
    info!(
        simulation = %config.simulation,
        polymer_matrix = %config.polymer_matrix,
        output = %config.output.display(),
        regions = ?config.regions,
        years = ?(config.start_year..=config.end_year),
        "configured"
    );

    // ─── 3) fetch, allocate, write ───────────────────────────────────
    let summary = pipeline::run(&config).await?;
    info!(
        simulation_rows = summary.simulation_rows,
        polymer_rows = summary.polymer_rows,
        records = summary.records,
        "all done"
    );
    Ok(())
}
