use std::path::PathBuf;

use polepad_core::AssetId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no reference record for asset {0}")]
    NotFound(AssetId),

    #[error("{origin}: missing required columns: {}", missing.join(", "))]
    MissingColumns { origin: String, missing: Vec<String> },

    #[error("duplicate GIS record for asset {0}")]
    DuplicateAsset(AssetId),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("report already exists: {0}")]
    ReportExists(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("persist error: {0}")]
    Persist(#[from] tempfile::PersistError),
}
