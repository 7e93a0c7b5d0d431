//! GIS reference table keyed by asset identifier.

use std::collections::BTreeMap;
use std::path::Path;

use polepad_core::record::{parse_count, parse_score};
use polepad_core::{AssetId, GisRecord, gis};
use tracing::{debug, info, warn};

use crate::table::{self, Table};
use crate::{RecordStore, StoreError};

/// In-memory GIS reference table, one record per asset.
///
/// Loaded once, then read-only; lookups are by normalised [`AssetId`].
#[derive(Debug, Clone, Default)]
pub struct GisTable {
    records: BTreeMap<AssetId, GisRecord>,
}

impl GisTable {
    /// Load a GIS CSV export.
    ///
    /// Fails with [`StoreError::MissingColumns`] before reading any record if
    /// the header lacks a required column, and with
    /// [`StoreError::DuplicateAsset`] if two rows share an asset identifier.
    /// Rows with a blank `pole_id` are skipped.
    pub fn load_csv(path: &Path) -> Result<Self, StoreError> {
        let table = table::read_csv(path)?;
        let loaded = Self::from_table(&table, &path.display().to_string())?;
        info!(path = %path.display(), count = loaded.len(), "loaded GIS reference table");
        Ok(loaded)
    }

    pub fn from_table(table: &Table, origin: &str) -> Result<Self, StoreError> {
        let missing = gis::missing_columns(&table.schema());
        if !missing.is_empty() {
            return Err(StoreError::MissingColumns {
                origin: origin.to_string(),
                missing,
            });
        }

        let text = |row: usize, col: &str| table.cell(row, col).unwrap_or_default().to_string();

        let mut records = Vec::with_capacity(table.rows.len());
        for row in 0..table.rows.len() {
            let Some(id) = table
                .cell(row, gis::POLE_ID)
                .map(AssetId::new)
                .filter(|id| !id.is_empty())
            else {
                warn!(origin, row, "skipping GIS row without pole_id");
                continue;
            };
            records.push(GisRecord {
                expected_vegetation: text(row, "expected_vegetation"),
                expected_guy_guard: text(row, "expected_guy_guard"),
                pole_type: text(row, "pole_type"),
                has_conduit_riser: text(row, "has_conduit_riser"),
                tag_name: table.cell(row, "tag_name").map(str::to_string),
                wire_count: table.cell(row, "wire_count").and_then(parse_count),
                vegetation_score: table.cell(row, "vegetation_score").and_then(parse_score),
                ..GisRecord::new(id)
            });
        }
        Self::from_records(records)
    }

    pub fn from_records(records: impl IntoIterator<Item = GisRecord>) -> Result<Self, StoreError> {
        let mut map = BTreeMap::new();
        for record in records {
            let id = record.asset_id.clone();
            if map.insert(id.clone(), record).is_some() {
                return Err(StoreError::DuplicateAsset(id));
            }
        }
        Ok(Self { records: map })
    }

    pub fn get(&self, id: &AssetId) -> Option<&GisRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn asset_ids(&self) -> impl Iterator<Item = &AssetId> {
        self.records.keys()
    }
}

impl RecordStore for GisTable {
    fn get_by_asset_id(&self, id: &AssetId) -> Result<GisRecord, StoreError> {
        self.get(id).cloned().ok_or_else(|| {
            debug!(asset = %id, "asset not in GIS table");
            StoreError::NotFound(id.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "pole_id,expected_vegetation,expected_guy_guard,pole_type,has_conduit_riser";

    fn write(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("gis_records.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_required_and_optional_columns() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            &format!(
                "{HEADER},wire_count,tag_name\n\
                 P0010,No,Yes,Wood,No,3.0,T-100\n\
                 p0011,,Yes,Steel,,,\n"
            ),
        );
        let table = GisTable::load_csv(&path).unwrap();
        assert_eq!(table.len(), 2);

        let rec = table.get_by_asset_id(&AssetId::new("P0010")).unwrap();
        assert_eq!(rec.expected_vegetation, "No");
        assert_eq!(rec.wire_count, Some(3));
        assert_eq!(rec.tag_name.as_deref(), Some("T-100"));

        let rec = table.get_by_asset_id(&AssetId::new(" P0011")).unwrap();
        assert_eq!(rec.expected_vegetation, "");
        assert_eq!(rec.pole_type, "Steel");
        assert_eq!(rec.wire_count, None);
    }

    #[test]
    fn missing_columns_fail_at_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(tmp.path(), "pole_id,pole_type\nP1,Wood\n");
        match GisTable::load_csv(&path) {
            Err(StoreError::MissingColumns { missing, .. }) => {
                assert_eq!(
                    missing,
                    ["expected_vegetation", "expected_guy_guard", "has_conduit_riser"]
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn header_only_table_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(tmp.path(), &format!("{HEADER}\n"));
        assert!(GisTable::load_csv(&path).unwrap().is_empty());
    }

    #[test]
    fn duplicate_assets_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(tmp.path(), &format!("{HEADER}\nP1,No,Yes,Wood,No\np1,Yes,Yes,Wood,No\n"));
        assert!(matches!(
            GisTable::load_csv(&path),
            Err(StoreError::DuplicateAsset(_))
        ));
    }

    #[test]
    fn blank_ids_skipped() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write(tmp.path(), &format!("{HEADER}\n,No,Yes,Wood,No\nP2,No,Yes,Wood,No\n"));
        let table = GisTable::load_csv(&path).unwrap();
        let ids: Vec<&str> = table.asset_ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, ["P2"]);
    }

    #[test]
    fn unknown_asset_is_not_found() {
        let table = GisTable::from_records([GisRecord::new("P1")]).unwrap();
        let err = table.get_by_asset_id(&AssetId::new("P9")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id.as_str() == "P9"));
    }
}
