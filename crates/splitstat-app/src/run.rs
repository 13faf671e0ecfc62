// Batch orchestration: load inputs, assemble the result table, write it out.

use crate::config::Config;
use crate::input;
use crate::output;
use anyhow::Context;
use splitstat_core::{Assembler, EventTable, Request, ResultTable};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub events: usize,
    pub requests: usize,
    pub rows: usize,
}

/// Build the assembler described by `config`.
pub fn assembler_for(config: &Config) -> Assembler {
    Assembler::new()
        .with_min_pa(config.stats.min_pa)
        .with_subject_order(config.output.subject_order)
}

/// Evaluate each request on its own blocking task.
///
/// All requests are validated before any task is spawned, so a bad manifest
/// line fails the same way it does in a sequential run. Results are merged
/// by the table sort, independent of completion order.
pub async fn assemble_parallel(
    assembler: Assembler,
    requests: &[Request],
    table: Arc<EventTable>,
) -> anyhow::Result<ResultTable> {
    let combinations = assembler.validate(requests, &table)?;

    let handles: Vec<_> = combinations
        .into_iter()
        .map(|combination| {
            let table = Arc::clone(&table);
            tokio::task::spawn_blocking(move || assembler.evaluate(&combination, &table))
        })
        .collect();

    let mut parts = Vec::with_capacity(handles.len());
    for handle in handles {
        parts.push(handle.await.context("stat task failed to complete")??);
    }

    let result = assembler.finish(parts);
    info!(
        "assembled {} rows from {} requests in parallel",
        result.len(),
        requests.len()
    );
    Ok(result)
}

/// Run one batch as described by `config`.
pub async fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let table = input::load_events(Path::new(&config.paths.events))
        .context("failed to load event table")?;
    let requests = input::load_manifest(Path::new(&config.paths.combinations))
        .context("failed to load combinations manifest")?;
    info!(
        "Evaluating {} requests over {} events (min PA {}, {:?} subject order)",
        requests.len(),
        table.len(),
        config.stats.min_pa,
        config.output.subject_order
    );

    let events = table.len();
    let assembler = assembler_for(config);
    let result = if config.run.parallel {
        assemble_parallel(assembler, &requests, Arc::new(table)).await?
    } else {
        assembler
            .assemble(&requests, &table)
            .context("failed to assemble results")?
    };

    output::write_results(Path::new(&config.paths.output), &result)
        .context("failed to write results")?;

    Ok(RunSummary {
        events,
        requests: requests.len(),
        rows: result.len(),
    })
}
