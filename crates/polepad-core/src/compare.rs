//! Field-by-field comparison of an observation against its GIS reference.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::{NormalizedValue, Normalizer};
use crate::record::{GisRecord, ObservationRecord};

/// A compared attribute. [`Field::ORDER`] is the evaluation order and hence
/// the order of mismatches in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Vegetation,
    GuyGuard,
    PoleType,
    #[serde(rename = "has_conduit_riser")]
    ConduitRiser,
}

impl Field {
    pub const ORDER: [Field; 4] = [
        Field::Vegetation,
        Field::GuyGuard,
        Field::PoleType,
        Field::ConduitRiser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vegetation => "vegetation",
            Self::GuyGuard => "guy_guard",
            Self::PoleType => "pole_type",
            Self::ConduitRiser => "has_conduit_riser",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Vegetation | Self::PoleType => Severity::Medium,
            Self::GuyGuard => Severity::High,
            Self::ConduitRiser => Severity::Low,
        }
    }

    fn is_categorical(self) -> bool {
        matches!(self, Self::PoleType)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One disagreeing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: Field,
    /// Raw GIS value.
    pub gis: String,
    /// Raw observed value.
    pub ai: String,
    pub gis_normalized: NormalizedValue,
    pub ai_normalized: NormalizedValue,
    pub severity: Severity,
}

/// Compare `observation` against `reference` over [`Field::ORDER`].
///
/// A field only produces a mismatch when both sides normalise to a known
/// value and those values differ; a missing or unparseable value on either
/// side suppresses the check for that field.
pub fn compare(
    normalizer: &Normalizer,
    observation: &ObservationRecord,
    reference: &GisRecord,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    for field in Field::ORDER {
        let gis_raw = reference.raw(field);
        let ai_raw = observation.raw(field);

        let (gis_normalized, ai_normalized) = if field.is_categorical() {
            let gis = normalizer.category(gis_raw);
            let ai = normalizer.category(ai_raw);
            if gis.is_empty() || ai.is_empty() {
                debug!(asset = %reference.asset_id, %field, "skipped: empty category");
                continue;
            }
            if gis.canonical == ai.canonical {
                continue;
            }
            (NormalizedValue::Category(gis), NormalizedValue::Category(ai))
        } else {
            let gis = normalizer.boolean(gis_raw);
            let ai = normalizer.boolean(ai_raw);
            if !gis.is_known() || !ai.is_known() {
                debug!(asset = %reference.asset_id, %field, "skipped: unknown value");
                continue;
            }
            if gis == ai {
                continue;
            }
            (NormalizedValue::Flag(gis), NormalizedValue::Flag(ai))
        };

        mismatches.push(Mismatch {
            field,
            gis: gis_raw.to_string(),
            ai: ai_raw.to_string(),
            gis_normalized,
            ai_normalized,
            severity: field.severity(),
        });
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::TriState;

    fn gis(veg: &str, gg: &str, pole: &str, riser: &str) -> GisRecord {
        GisRecord {
            expected_vegetation: veg.into(),
            expected_guy_guard: gg.into(),
            pole_type: pole.into(),
            has_conduit_riser: riser.into(),
            ..GisRecord::new("P0010")
        }
    }

    fn obs(veg: &str, gg: &str, pole: &str, riser: &str) -> ObservationRecord {
        ObservationRecord {
            vegetation: veg.into(),
            guy_guard: gg.into(),
            pole_type: pole.into(),
            has_conduit_riser: riser.into(),
            ..ObservationRecord::new("P0010")
        }
    }

    #[test]
    fn identical_records_have_no_mismatches() {
        let n = Normalizer::default();
        let out = compare(&n, &obs("No", "Yes", "Wood", "No"), &gis("No", "Yes", "Wood", "No"));
        assert!(out.is_empty());
    }

    #[test]
    fn spelling_variants_are_not_mismatches() {
        let n = Normalizer::default();
        let out = compare(&n, &obs("n", "TRUE", "wooden", "0"), &gis("No", "Yes", "Wood", "f"));
        assert!(out.is_empty());
    }

    #[test]
    fn every_field_in_order_with_fixed_severity() {
        let n = Normalizer::default();
        let out = compare(&n, &obs("Yes", "No", "Steel", "Yes"), &gis("No", "Yes", "Wood", "No"));
        let fields: Vec<Field> = out.iter().map(|m| m.field).collect();
        assert_eq!(fields, Field::ORDER);
        let severities: Vec<Severity> = out.iter().map(|m| m.severity).collect();
        assert_eq!(
            severities,
            [Severity::Medium, Severity::High, Severity::Medium, Severity::Low]
        );
    }

    #[test]
    fn mismatch_carries_raw_and_normalized_values() {
        let n = Normalizer::default();
        let out = compare(&n, &obs("Y", "", "", ""), &gis("no", "", "", ""));
        assert_eq!(out.len(), 1);
        let m = &out[0];
        assert_eq!(m.gis, "no");
        assert_eq!(m.ai, "Y");
        assert_eq!(m.gis_normalized, NormalizedValue::Flag(TriState::No));
        assert_eq!(m.ai_normalized, NormalizedValue::Flag(TriState::Yes));
    }

    #[test]
    fn pole_type_mismatch_carries_confidences() {
        let n = Normalizer::default();
        let out = compare(&n, &obs("", "", "Steal", ""), &gis("", "", "Wood", ""));
        assert_eq!(out.len(), 1);
        match (&out[0].gis_normalized, &out[0].ai_normalized) {
            (NormalizedValue::Category(g), NormalizedValue::Category(a)) => {
                assert_eq!(g.canonical, "wood");
                assert_eq!(g.confidence, 1.0);
                assert_eq!(a.canonical, "steel");
                assert!(a.confidence < 1.0);
            }
            other => panic!("expected categories, got {other:?}"),
        }
    }

    #[test]
    fn missing_values_on_either_side_are_skipped() {
        let n = Normalizer::default();
        let full = gis("No", "Yes", "Wood", "No");
        let blank = obs("", "", "", "");
        assert!(compare(&n, &blank, &full).is_empty());

        let garbage = obs("maybe", "??", "", "n/a");
        assert!(compare(&n, &garbage, &full).is_empty());

        let full_obs = obs("Yes", "No", "Steel", "Yes");
        assert!(compare(&n, &full_obs, &gis("", "", "", "")).is_empty());
    }

    #[test]
    fn unmatched_categories_compare_by_passthrough() {
        let n = Normalizer::default();
        assert!(compare(&n, &obs("", "", "Concrete", ""), &gis("", "", "concrete", "")).is_empty());
        let out = compare(&n, &obs("", "", "Concrete", ""), &gis("", "", "Wood", ""));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].field, Field::PoleType);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let n = Normalizer::default();
        let o = obs("Yes", "No", "Steel", "No");
        let g = gis("No", "Yes", "Wood", "No");
        assert_eq!(compare(&n, &o, &g), compare(&n, &o, &g));
    }

    #[test]
    fn field_names_serialise_like_columns() {
        assert_eq!(serde_json::to_value(Field::ConduitRiser).unwrap(), "has_conduit_riser");
        assert_eq!(serde_json::to_value(Field::GuyGuard).unwrap(), "guy_guard");
    }
}
