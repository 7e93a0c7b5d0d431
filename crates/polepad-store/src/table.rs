//! Untyped CSV tables read and written through Arrow.
//!
//! Every column is treated as nullable `Utf8`. Writes go to a temporary file
//! in the destination directory which is then renamed over the target, so a
//! reader never observes a half-written table.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, LargeStringArray, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tempfile::NamedTempFile;

use crate::StoreError;

/// Rows schema-inference looks at; only the header matters since every
/// column is read back as text.
const INFER_RECORDS: usize = 1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append `name` if the table does not have it yet; returns its index.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(i) = self.column_index(name) {
            return i;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
        self.columns.len() - 1
    }

    /// Cell text; `None` for null, empty, or an unknown column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows
            .get(row)?
            .get(idx)?
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    pub fn schema(&self) -> Schema {
        text_schema(self.columns.iter())
    }

    /// Build from Arrow batches sharing one schema.
    pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Self {
        let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        let mut rows = Vec::new();
        for batch in batches {
            for row in 0..batch.num_rows() {
                rows.push(
                    (0..batch.num_columns())
                        .map(|c| get_string(batch.column(c).as_ref(), row))
                        .collect(),
                );
            }
        }
        Self { columns, rows }
    }

    pub fn to_batch(&self) -> Result<RecordBatch, StoreError> {
        let arrays: Vec<ArrayRef> = (0..self.columns.len())
            .map(|c| {
                let values: Vec<Option<&str>> = self
                    .rows
                    .iter()
                    .map(|r| r.get(c).and_then(|v| v.as_deref()))
                    .collect();
                Arc::new(StringArray::from(values)) as ArrayRef
            })
            .collect();
        Ok(RecordBatch::try_new(Arc::new(self.schema()), arrays)?)
    }
}

/// Read a CSV file with a header row. Every column comes back as text.
pub fn read_csv(path: &Path) -> Result<Table, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }

    let format = Format::default().with_header(true);
    let (inferred, _) = format.infer_schema(BufReader::new(File::open(path)?), Some(INFER_RECORDS))?;
    let schema = Arc::new(text_schema(inferred.fields().iter().map(|f| f.name())));
    if schema.fields().is_empty() {
        return Ok(Table::default());
    }

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(File::open(path)?)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(Table::from_batches(&schema, &batches))
}

/// Write `table` to `path`, replacing any existing file atomically.
pub fn write_csv_atomic(path: &Path, table: &Table) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut tmp);
        writer.write(&table.to_batch()?)?;
    }
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

fn text_schema<I, S>(names: I) -> Schema
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Schema::new(
        names
            .into_iter()
            .map(|n| Field::new(n.as_ref(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    )
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}
