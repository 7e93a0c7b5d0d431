//! Batch inspections: many observations against one GIS table.
//!
//! Inspections of different assets share no mutable state, so each runs as
//! its own blocking task. One asset's failure does not stop the others.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use polepad_core::{ObservationRecord, Reconciler};
use polepad_store::{GisTable, InspectError, Inspection, ReportDir, inspect};
use tokio::task::JoinSet;
use tracing::{error, info};

pub struct BatchStats {
    pub inspected: usize,
    pub missing_reference: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
}

/// Read observations from a JSON Lines file; blank lines are skipped.
pub fn read_observations(path: &Path) -> anyhow::Result<Vec<ObservationRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening observations {}", path.display()))?;
    let mut out = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let obs: ObservationRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid observation", path.display(), n + 1))?;
        out.push(obs);
    }
    Ok(out)
}

/// Run every observation through the inspection pipeline concurrently.
/// Results are returned in input order.
pub async fn run_batch(
    reconciler: Arc<Reconciler>,
    table: Arc<GisTable>,
    reports: Arc<ReportDir>,
    observations: Vec<ObservationRecord>,
) -> anyhow::Result<(Vec<(ObservationRecord, Result<Inspection, InspectError>)>, BatchStats)> {
    let start = Instant::now();
    let total = observations.len();

    let mut tasks = JoinSet::new();
    for (index, obs) in observations.into_iter().enumerate() {
        let reconciler = Arc::clone(&reconciler);
        let table = Arc::clone(&table);
        let reports = Arc::clone(&reports);
        tasks.spawn_blocking(move || {
            let result = inspect(&reconciler, table.as_ref(), reports.as_ref(), &obs, Utc::now());
            (index, obs, result)
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("inspection task panicked")?);
    }
    results.sort_by_key(|(index, _, _)| *index);

    let mut stats = BatchStats {
        inspected: 0,
        missing_reference: 0,
        failed: 0,
        elapsed_secs: 0.0,
    };
    let results: Vec<_> = results
        .into_iter()
        .map(|(_, obs, result)| {
            match &result {
                Ok(_) => stats.inspected += 1,
                Err(e) if e.missing_reference().is_some() => stats.missing_reference += 1,
                Err(e) => {
                    error!(asset = %obs.asset_id, error = %e, "inspection failed");
                    stats.failed += 1;
                }
            }
            (obs, result)
        })
        .collect();
    stats.elapsed_secs = start.elapsed().as_secs_f64();

    info!(
        total,
        inspected = stats.inspected,
        missing_reference = stats.missing_reference,
        failed = stats.failed,
        "batch complete"
    );
    Ok((results, stats))
}
