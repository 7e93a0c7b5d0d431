/// Arrow schemas for the tabular GIS sources.
///
/// Every column is read as `Utf8`; attribute values are normalised later, so
/// the loader never guesses types from cell contents.
pub mod gis {
    use arrow::datatypes::{DataType, Field, Schema};

    pub const POLE_ID: &str = "pole_id";

    /// Columns a GIS reference table must carry.
    pub const REQUIRED_COLUMNS: &[&str] = &[
        POLE_ID,
        "expected_vegetation",
        "expected_guy_guard",
        "pole_type",
        "has_conduit_riser",
    ];

    /// Columns read when present.
    pub const OPTIONAL_COLUMNS: &[&str] = &["tag_name", "wire_count", "vegetation_score"];

    /// Columns of the detection-derived attribute ledger.
    pub const LEDGER_COLUMNS: &[&str] = &[
        POLE_ID,
        "tag_name",
        "pole_type",
        "vegetation_encroachment",
        "from_ocr",
    ];

    /// Schema for GIS reference records.
    pub fn reference_schema() -> Schema {
        utf8_schema(REQUIRED_COLUMNS.iter().chain(OPTIONAL_COLUMNS))
    }

    /// Schema for the detection-derived attribute ledger.
    pub fn ledger_schema() -> Schema {
        utf8_schema(LEDGER_COLUMNS)
    }

    /// All-`Utf8` schema with the given column names. `pole_id` is the only
    /// non-nullable column.
    pub fn utf8_schema<I, S>(names: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Schema::new(
            names
                .into_iter()
                .map(|name| {
                    let name = name.as_ref();
                    Field::new(name, DataType::Utf8, name != POLE_ID)
                })
                .collect::<Vec<_>>(),
        )
    }

    /// Required columns absent from `schema`, in declaration order.
    pub fn missing_columns(schema: &Schema) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| schema.field_with_name(c).is_err())
            .map(|c| c.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::gis;
    use arrow::datatypes::{DataType, Field, Schema};

    #[test]
    fn reference_schema_has_expected_fields() {
        let schema = gis::reference_schema();
        assert_eq!(schema.fields().len(), 8);
        assert!(schema.field_with_name("expected_guy_guard").is_ok());
        assert!(!schema.field_with_name("pole_id").unwrap().is_nullable());
        assert!(schema.field_with_name("wire_count").unwrap().is_nullable());
    }

    #[test]
    fn ledger_schema_has_expected_fields() {
        let schema = gis::ledger_schema();
        assert_eq!(schema.fields().len(), 5);
        assert!(schema.field_with_name("from_ocr").is_ok());
    }

    #[test]
    fn missing_columns_reported_in_order() {
        let schema = Schema::new(vec![
            Field::new("pole_id", DataType::Utf8, false),
            Field::new("pole_type", DataType::Utf8, true),
        ]);
        assert_eq!(
            gis::missing_columns(&schema),
            ["expected_vegetation", "expected_guy_guard", "has_conduit_riser"]
        );
        assert!(gis::missing_columns(&gis::reference_schema()).is_empty());
    }
}
