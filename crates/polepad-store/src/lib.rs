//! Record Store Adapter: GIS reference table (CSV via Arrow), detection
//! ledger, JSON report directory, and the lookup → reconcile → persist
//! pipeline built on them.

use std::path::PathBuf;

use polepad_core::{AssetId, GisRecord, Report};

mod error;
pub use error::StoreError;

pub mod gis;
pub mod inspect;
pub mod ledger;
pub mod reports;
pub mod table;

pub use gis::GisTable;
pub use inspect::{InspectError, Inspection, inspect};
pub use ledger::{DetectionLedger, LedgerEntry, Upsert};
pub use reports::ReportDir;

/// Source of authoritative GIS records.
pub trait RecordStore {
    /// Fails with [`StoreError::NotFound`] when the asset has no record.
    fn get_by_asset_id(&self, id: &AssetId) -> Result<GisRecord, StoreError>;
}

/// Destination for finished reports.
pub trait ReportSink {
    /// Persist `report`, returning where it was written.
    fn save(&self, report: &Report) -> Result<PathBuf, StoreError>;
}
