//! GIS reference rows and AI observation records.
//!
//! Attribute values are kept as raw text exactly as the source supplied them;
//! normalisation happens later, in [`crate::normalize`]. An empty string means
//! the source had no value.

use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::compare::Field;

/// Authoritative GIS reference record for one asset.
///
/// Serialises with the GIS table's column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GisRecord {
    #[serde(rename = "pole_id")]
    pub asset_id: AssetId,
    #[serde(default, deserialize_with = "raw::text")]
    pub expected_vegetation: String,
    #[serde(default, deserialize_with = "raw::text")]
    pub expected_guy_guard: String,
    #[serde(default, deserialize_with = "raw::text")]
    pub pole_type: String,
    #[serde(default, deserialize_with = "raw::text")]
    pub has_conduit_riser: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, deserialize_with = "raw::count", skip_serializing_if = "Option::is_none")]
    pub wire_count: Option<u32>,
    #[serde(default, deserialize_with = "raw::score", skip_serializing_if = "Option::is_none")]
    pub vegetation_score: Option<f64>,
}

/// What the detection pipeline saw in the current image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(rename = "pole_id")]
    pub asset_id: AssetId,
    #[serde(default, deserialize_with = "raw::text")]
    pub vegetation: String,
    #[serde(default, deserialize_with = "raw::text")]
    pub guy_guard: String,
    #[serde(default, deserialize_with = "raw::text")]
    pub pole_type: String,
    #[serde(default, deserialize_with = "raw::text")]
    pub has_conduit_riser: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, deserialize_with = "raw::count", skip_serializing_if = "Option::is_none")]
    pub wire_count: Option<u32>,
    #[serde(default, deserialize_with = "raw::score", skip_serializing_if = "Option::is_none")]
    pub vegetation_score: Option<f64>,
    /// OCR provenance, e.g. `"P0010 (Conf: 0.93)"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_ocr: Option<String>,
}

impl GisRecord {
    pub fn new(asset_id: impl Into<AssetId>) -> Self {
        Self {
            asset_id: asset_id.into(),
            ..Self::default()
        }
    }

    /// Raw value of a compared field.
    pub fn raw(&self, field: Field) -> &str {
        match field {
            Field::Vegetation => &self.expected_vegetation,
            Field::GuyGuard => &self.expected_guy_guard,
            Field::PoleType => &self.pole_type,
            Field::ConduitRiser => &self.has_conduit_riser,
        }
    }
}

impl ObservationRecord {
    pub fn new(asset_id: impl Into<AssetId>) -> Self {
        Self {
            asset_id: asset_id.into(),
            ..Self::default()
        }
    }

    /// Raw value of a compared field.
    pub fn raw(&self, field: Field) -> &str {
        match field {
            Field::Vegetation => &self.vegetation,
            Field::GuyGuard => &self.guy_guard,
            Field::PoleType => &self.pole_type,
            Field::ConduitRiser => &self.has_conduit_riser,
        }
    }
}

/// Whole, non-negative counts; accepts `"3"` and spreadsheet-style `"3.0"`.
pub fn parse_count(s: &str) -> Option<u32> {
    let s = s.trim();
    s.parse::<u32>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v as u32)
    })
}

/// Finite decimal scores; anything else is treated as absent.
pub fn parse_score(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lenient intake of scalar attribute values.
///
/// Detectors emit booleans, CSV exports emit text and spreadsheets emit
/// numbers; all of them are kept as their textual form so that the normaliser
/// sees one token vocabulary. `null` becomes the empty string. Numeric
/// attributes go through the same intake and become `None` when unparseable.
pub(crate) mod raw {
    use std::fmt;

    use serde::Deserializer;
    use serde::de::{self, Visitor};

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        deserializer.deserialize_any(RawText)
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        Ok(super::parse_count(&text(deserializer)?))
    }

    pub fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(super::parse_score(&text(deserializer)?))
    }

    struct RawText;

    impl<'de> Visitor<'de> for RawText {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string, boolean, number or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<String, D::Error> {
            deserializer.deserialize_any(RawText)
        }
    }
}
