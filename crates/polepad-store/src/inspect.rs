//! One inspection: look up the reference, reconcile, persist.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use polepad_core::{AssetId, ObservationRecord, ReconcileError, Reconciler, Report};
use thiserror::Error;
use tracing::warn;

use crate::{RecordStore, ReportSink, StoreError};

#[derive(Debug, Error)]
pub enum InspectError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl InspectError {
    /// The asset has no GIS reference record; distinct from a clean match.
    pub fn missing_reference(&self) -> Option<&AssetId> {
        match self {
            Self::Store(StoreError::NotFound(id)) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Inspection {
    pub report: Report,
    pub location: PathBuf,
}

/// Reconcile `observation` against its GIS record and save the report.
///
/// A missing GIS record ends the inspection with
/// [`StoreError::NotFound`]; nothing is written in that case.
pub fn inspect<S, K>(
    reconciler: &Reconciler,
    records: &S,
    sink: &K,
    observation: &ObservationRecord,
    at: DateTime<Utc>,
) -> Result<Inspection, InspectError>
where
    S: RecordStore + ?Sized,
    K: ReportSink + ?Sized,
{
    let reference = records
        .get_by_asset_id(&observation.asset_id)
        .inspect_err(|e| {
            if let StoreError::NotFound(id) = e {
                warn!(asset = %id, "no reference record for asset");
            }
        })?;
    let report = reconciler.reconcile(observation, &reference, at)?;
    let location = sink.save(&report)?;
    Ok(Inspection { report, location })
}
