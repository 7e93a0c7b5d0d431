//! Detection-derived attribute ledger.
//!
//! A CSV keyed by `pole_id` that accumulates what detection runs derived for
//! each asset (OCR tag, pole type, vegetation). Updates are read-modify-write
//! of the whole file, serialised by an in-process lock and committed with an
//! atomic rename, so concurrent upserts never interleave into a corrupted row.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use polepad_core::{AssetId, ObservationRecord, gis};
use tracing::info;

use crate::StoreError;
use crate::table::{self, Table};

/// One ledger row. `None` fields are left untouched on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerEntry {
    pub asset_id: AssetId,
    pub tag_name: Option<String>,
    pub pole_type: Option<String>,
    pub vegetation_encroachment: Option<String>,
    pub from_ocr: Option<String>,
}

impl LedgerEntry {
    /// Derived attributes carried by an observation; blank values are omitted.
    pub fn from_observation(obs: &ObservationRecord) -> Self {
        let present = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        Self {
            asset_id: obs.asset_id.clone(),
            tag_name: obs.tag_name.as_deref().and_then(present),
            pole_type: present(&obs.pole_type),
            vegetation_encroachment: present(&obs.vegetation),
            from_ocr: obs.from_ocr.as_deref().and_then(present),
        }
    }

    fn values(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("tag_name", self.tag_name.as_deref()),
            ("pole_type", self.pole_type.as_deref()),
            ("vegetation_encroachment", self.vegetation_encroachment.as_deref()),
            ("from_ocr", self.from_ocr.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

pub struct DetectionLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DetectionLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Update the asset's row with the entry's present fields, or append a
    /// new row. Columns the file has beyond the ledger's own are preserved.
    pub fn upsert(&self, entry: &LedgerEntry) -> Result<Upsert, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut table = self.read_table()?;
        for column in gis::LEDGER_COLUMNS {
            table.ensure_column(column);
        }
        let id_col = table.ensure_column(gis::POLE_ID);

        let existing = table.rows.iter().position(|row| {
            row[id_col]
                .as_deref()
                .is_some_and(|id| AssetId::new(id) == entry.asset_id)
        });

        let outcome = match existing {
            Some(i) => {
                for (column, value) in entry.values() {
                    if let Some(value) = value {
                        let c = table.ensure_column(column);
                        table.rows[i][c] = Some(value.to_string());
                    }
                }
                Upsert::Updated
            }
            None => {
                let mut row = vec![None; table.columns.len()];
                row[id_col] = Some(entry.asset_id.to_string());
                for (column, value) in entry.values() {
                    if let Some(c) = table.column_index(column) {
                        row[c] = value.map(str::to_string);
                    }
                }
                table.rows.push(row);
                Upsert::Inserted
            }
        };

        table::write_csv_atomic(&self.path, &table)?;
        info!(asset = %entry.asset_id, ?outcome, path = %self.path.display(), "ledger upsert");
        Ok(outcome)
    }

    /// All rows, in file order.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        let table = {
            let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.read_table()?
        };
        let text = |row: usize, col: &str| table.cell(row, col).map(str::to_string);
        Ok((0..table.rows.len())
            .filter_map(|row| {
                let id = table.cell(row, gis::POLE_ID)?;
                Some(LedgerEntry {
                    asset_id: AssetId::new(id),
                    tag_name: text(row, "tag_name"),
                    pole_type: text(row, "pole_type"),
                    vegetation_encroachment: text(row, "vegetation_encroachment"),
                    from_ocr: text(row, "from_ocr"),
                })
            })
            .collect())
    }

    pub fn get(&self, id: &AssetId) -> Result<Option<LedgerEntry>, StoreError> {
        Ok(self.entries()?.into_iter().find(|e| &e.asset_id == id))
    }

    fn read_table(&self) -> Result<Table, StoreError> {
        if self.path.exists() {
            table::read_csv(&self.path)
        } else {
            Ok(Table::new(
                gis::LEDGER_COLUMNS.iter().map(|c| c.to_string()).collect(),
            ))
        }
    }
}
