use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use polepad_core::{AssetId, ObservationRecord, ReconcileConfig, Reconciler};
use polepad_detect::{AssetSource, DetectorOutput, Interpretation, LabelRules};
use polepad_store::{DetectionLedger, GisTable, LedgerEntry, ReportDir, inspect};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod batch;
mod display;

#[derive(Parser, Debug)]
#[command(name = "polepad")]
#[command(about = "Reconcile field observations of utility poles against GIS records")]
#[command(version)]
struct Cli {
    /// Reconciliation settings (TOML); defaults apply when omitted
    #[arg(long, global = true, env = "POLEPAD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile one observation and save its report
    Inspect {
        /// GIS reference table (CSV)
        #[arg(long, env = "POLEPAD_GIS")]
        gis: PathBuf,

        /// Observation record (JSON)
        #[arg(long)]
        observation: PathBuf,

        /// Report directory
        #[arg(long, env = "POLEPAD_REPORTS", default_value = "reports")]
        reports: PathBuf,

        /// Print the report as JSON instead of a card
        #[arg(long)]
        json: bool,
    },
    /// Reconcile many observations (JSON Lines) concurrently
    Batch {
        #[arg(long, env = "POLEPAD_GIS")]
        gis: PathBuf,

        #[arg(long)]
        observations: PathBuf,

        #[arg(long, env = "POLEPAD_REPORTS", default_value = "reports")]
        reports: PathBuf,
    },
    /// Turn detector output into an observation record
    Detect {
        /// Asset the image was captured for; overrides `pole_id` in the output
        #[arg(long)]
        asset: Option<String>,

        /// Detector output (JSON)
        #[arg(long)]
        detections: PathBuf,

        /// Upsert the derived attributes into this ledger (CSV)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Check the resolved asset against this GIS table (CSV)
        #[arg(long, env = "POLEPAD_GIS")]
        gis: Option<PathBuf>,
    },
    /// List saved reports for an asset, oldest first
    History {
        #[arg(long, env = "POLEPAD_REPORTS", default_value = "reports")]
        reports: PathBuf,

        asset: String,
    },
    /// Load a GIS table and report pole types that do not resolve exactly
    CheckGis {
        #[arg(long, env = "POLEPAD_GIS")]
        gis: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("polepad=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Inspect {
            gis,
            observation,
            reports,
            json,
        } => {
            let reconciler = Reconciler::new(load_config(cli.config.as_deref())?)?;
            let table = GisTable::load_csv(&gis)?;
            let reports = ReportDir::create(reports)?;
            let text = std::fs::read_to_string(&observation)
                .with_context(|| format!("reading {}", observation.display()))?;
            let obs: ObservationRecord = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", observation.display()))?;

            match inspect(&reconciler, &table, &reports, &obs, Utc::now()) {
                Ok(done) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&done.report)?);
                    } else {
                        display::print_report_card(&done.report, Some(&done.location));
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => match e.missing_reference() {
                    Some(id) => {
                        eprintln!("no reference record for asset {id}");
                        Ok(ExitCode::from(2))
                    }
                    None => Err(e.into()),
                },
            }
        }

        Command::Batch {
            gis,
            observations,
            reports,
        } => {
            let reconciler = Reconciler::new(load_config(cli.config.as_deref())?)?;
            let table = GisTable::load_csv(&gis)?;
            let reports = ReportDir::create(reports)?;
            let observations = batch::read_observations(&observations)?;
            info!(count = observations.len(), "starting batch");

            let (results, stats) = batch::run_batch(
                Arc::new(reconciler),
                Arc::new(table),
                Arc::new(reports),
                observations,
            )
            .await?;

            for (obs, result) in &results {
                match result {
                    Ok(done) => println!("{}", display::summary_line(&done.report, &done.location)),
                    Err(e) => match e.missing_reference() {
                        Some(id) => println!("{:<12} no reference record", id.as_str()),
                        None => println!("{:<12} failed: {e}", obs.asset_id.as_str()),
                    },
                }
            }
            eprintln!(
                "{} inspected, {} without reference, {} failed in {:.2}s",
                stats.inspected, stats.missing_reference, stats.failed, stats.elapsed_secs
            );
            Ok(if stats.failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }

        Command::Detect {
            asset,
            detections,
            ledger,
            gis,
        } => {
            let text = std::fs::read_to_string(&detections)
                .with_context(|| format!("reading {}", detections.display()))?;
            let output = DetectorOutput::from_json(&text)?;
            let asset = asset.as_deref().map(AssetId::new);
            let interpretation = output.interpret(asset, &LabelRules::default())?;

            if let Some(gis) = gis {
                let table = GisTable::load_csv(&gis)?;
                if let Some(note) = unknown_asset_note(&table, &interpretation) {
                    eprintln!("{note}");
                }
            }

            if let Some(path) = ledger {
                let ledger = DetectionLedger::new(path);
                let outcome =
                    ledger.upsert(&LedgerEntry::from_observation(&interpretation.observation))?;
                info!(
                    ledger = %ledger.path().display(),
                    asset = %interpretation.observation.asset_id,
                    ?outcome,
                    "ledger updated"
                );
            }
            eprintln!(
                "tag reading: {} ({:?})",
                interpretation.tag.tag.as_deref().unwrap_or("-"),
                interpretation.tag.confidence
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&interpretation.observation)?
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::History { reports, asset } => {
            let reports = ReportDir::create(reports)?;
            let asset = AssetId::new(&asset);
            let paths = reports.history(&asset)?;
            if paths.is_empty() {
                eprintln!("no reports for asset {asset}");
            }
            for path in paths {
                let report = ReportDir::load(&path)?;
                println!("{}", display::summary_line(&report, &path));
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::CheckGis { gis } => {
            let reconciler = Reconciler::new(load_config(cli.config.as_deref())?)?;
            let table = GisTable::load_csv(&gis)?;
            let mut inexact = 0usize;
            for id in table.asset_ids() {
                let Some(record) = table.get(id) else {
                    continue;
                };
                let resolved = reconciler.normalizer().category(&record.pole_type);
                if !resolved.is_empty() && resolved.confidence < 1.0 {
                    inexact += 1;
                    println!(
                        "{:<12} pole_type {:?} -> {} (conf {:.2})",
                        id.as_str(),
                        record.pole_type,
                        resolved.canonical,
                        resolved.confidence
                    );
                }
            }
            println!("{} records, {} inexact pole types", table.len(), inexact);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Message for an interpreted asset the GIS table does not know.
fn unknown_asset_note(table: &GisTable, interpretation: &Interpretation) -> Option<String> {
    let id = &interpretation.observation.asset_id;
    if table.get(id).is_some() {
        return None;
    }
    Some(match interpretation.asset_source {
        AssetSource::Tag => format!("tag {id} not found in GIS table"),
        _ => format!("asset {id} not found in GIS table"),
    })
}

/// Read `path` as a [`ReconcileConfig`]; no path means defaults.
fn load_config(path: Option<&Path>) -> Result<ReconcileConfig> {
    let Some(path) = path else {
        return Ok(ReconcileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = ReconcileConfig::from_toml_str(&text)
        .with_context(|| format!("loading config {}", path.display()))?;
    if config == ReconcileConfig::default() {
        warn!(config = %path.display(), "config file sets nothing; using defaults");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn tag_read_asset_is_checked_against_gis() {
        let table = GisTable::from_records([polepad_core::GisRecord::new("P0010")]).unwrap();
        let read = |text: &str| {
            DetectorOutput::from_json(&format!(
                r#"{{"ocr": [{{"text": "{text}", "confidence": 0.93}}]}}"#
            ))
            .unwrap()
            .interpret(None, &LabelRules::default())
            .unwrap()
        };

        assert_eq!(unknown_asset_note(&table, &read("P0010")), None);
        assert_eq!(
            unknown_asset_note(&table, &read("P0404")).as_deref(),
            Some("tag P0404 not found in GIS table")
        );
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), ReconcileConfig::default());
    }

    #[test]
    fn config_file_is_validated() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("polepad.toml");
        std::fs::write(&path, "[weights]\nper_mismatch = 30.0\n").unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().weights.per_mismatch, 30.0);

        std::fs::write(&path, "[normalizer]\nfuzzy_cutoff = 2.0\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
