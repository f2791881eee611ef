// src/pipeline.rs

use anyhow::Context;
use reqwest::Client;
use std::{path::PathBuf, time::Instant};
use tracing::{info, warn};

use crate::{
    aggregate::{aggregate, aggregate_parallel, conservation_gaps},
    allocate::Allocator,
    config::Config,
    error::Result,
    fetch,
    index::Index,
    input::{read_polymer_rows, read_simulation_rows, RawPolymerRow, RawSimulationRow},
    model::OutputRecord,
    output::write_output,
};

const CONSERVATION_TOLERANCE: f64 = 1e-9;

/// Index the raw rows, allocate over the configured space and sum over
/// sectors. No I/O happens here.
#[tracing::instrument(level = "info", skip_all, fields(parallel = config.parallel))]
pub fn compute(
    simulation: &[RawSimulationRow],
    polymers: &[RawPolymerRow],
    config: &Config,
) -> Result<Vec<OutputRecord>> {
    let index = Index::build(simulation, polymers, config.duplicates)?;
    let space = config.space();
    let allocator = Allocator::new(&index);

    let records = if config.parallel {
        aggregate_parallel(&allocator, &space)?
    } else {
        aggregate(allocator.estimates(&space))?
    };
    info!(
        estimates = space.estimate_count(),
        records = records.len(),
        "allocated and aggregated"
    );

    for gap in conservation_gaps(&records, &index.total_waste, CONSERVATION_TOLERANCE) {
        warn!(key = %gap.key, expected = gap.expected, actual = gap.actual, "output does not sum to total waste");
    }
    Ok(records)
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub simulation_rows: usize,
    pub polymer_rows: usize,
    pub records: usize,
    pub output: PathBuf,
}

/// Resolve both inputs, compute and write the output file.
pub async fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let start = Instant::now();
    let client = Client::new();

    let simulation_path =
        fetch::resolve(&client, &config.simulation, &config.cache_dir, "simulation")
            .await
            .with_context(|| format!("resolving simulation table {}", config.simulation))?;
    let polymer_path = fetch::resolve(
        &client,
        &config.polymer_matrix,
        &config.cache_dir,
        "polymer_matrix",
    )
    .await
    .with_context(|| format!("resolving polymer matrix {}", config.polymer_matrix))?;

    // offload the parse + allocation to the blocking pool
    let config = config.clone();
    let summary = tokio::task::spawn_blocking(move || -> anyhow::Result<RunSummary> {
        let simulation = read_simulation_rows(&simulation_path)
            .with_context(|| format!("reading {}", simulation_path.display()))?;
        let polymers = read_polymer_rows(&polymer_path)
            .with_context(|| format!("reading {}", polymer_path.display()))?;

        let records = compute(&simulation, &polymers, &config)?;
        write_output(&config.output, &records, config.format)
            .with_context(|| format!("writing {}", config.output.display()))?;

        Ok(RunSummary {
            simulation_rows: simulation.len(),
            polymer_rows: polymers.len(),
            records: records.len(),
            output: config.output.clone(),
        })
    })
    .await??;

    info!(
        records = summary.records,
        output = %summary.output.display(),
        elapsed = ?start.elapsed(),
        "run complete"
    );
    Ok(summary)
}
