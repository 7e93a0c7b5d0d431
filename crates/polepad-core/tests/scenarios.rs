//! End-to-end reconciliation scenarios over the public API.

use chrono::{TimeZone, Utc};
use polepad_core::{
    AliasTable, DataStatus, Field, GisRecord, ObservationRecord, ReconcileConfig, Reconciler,
    RiskLevel, Severity, Status, normalize::normalize_category,
};

fn reference() -> GisRecord {
    GisRecord {
        expected_vegetation: "No".into(),
        expected_guy_guard: "Yes".into(),
        pole_type: "Wood".into(),
        has_conduit_riser: "No".into(),
        ..GisRecord::new("P0010")
    }
}

fn observed(veg: &str, gg: &str, pole: &str, riser: &str) -> ObservationRecord {
    ObservationRecord {
        vegetation: veg.into(),
        guy_guard: gg.into(),
        pole_type: pole.into(),
        has_conduit_riser: riser.into(),
        ..ObservationRecord::new("P0010")
    }
}

#[test]
fn matching_observation_is_verified() {
    let r = Reconciler::default();
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
    let report = r
        .reconcile(&observed("No", "Yes", "Wood", "No"), &reference(), at)
        .unwrap();

    assert!(report.mismatches.is_empty());
    assert_eq!(report.risk_score, 100);
    assert_eq!(report.status, Status::Ok);
    assert_eq!(report.assessment.risk_level, RiskLevel::Safe);
    assert_eq!(report.assessment.data_status, DataStatus::Verified);
    assert_eq!(report.assessment.action, "No review required");
    assert_eq!(report.timestamp, at);
}

#[test]
fn disagreeing_observation_is_high_risk() {
    let r = Reconciler::default();
    let report = r
        .reconcile(&observed("Yes", "No", "Steel", "No"), &reference(), Utc::now())
        .unwrap();

    let got: Vec<(Field, Severity)> = report
        .mismatches
        .iter()
        .map(|m| (m.field, m.severity))
        .collect();
    assert_eq!(
        got,
        [
            (Field::Vegetation, Severity::Medium),
            (Field::GuyGuard, Severity::High),
            (Field::PoleType, Severity::Medium),
        ]
    );
    // 100 - 15 - 35 - 25 - 37.5 - 25 clamps to 0.
    assert_eq!(report.risk_score, 0);
    assert_eq!(report.status, Status::HighRisk);
    assert_eq!(report.assessment.risk_level, RiskLevel::HighRisk);
    assert_eq!(report.assessment.data_status, DataStatus::SignificantDiscrepancy);
    assert_eq!(report.penalties.len(), 5);
}

#[test]
fn compare_is_idempotent() {
    let r = Reconciler::default();
    let obs = observed("yes", "n", "metal", "1");
    assert_eq!(r.compare(&obs, &reference()), r.compare(&obs, &reference()));
}

#[test]
fn unknown_on_either_side_never_mismatches() {
    let r = Reconciler::default();
    for field in Field::ORDER {
        let mut obs = observed("Yes", "No", "Steel", "Yes");
        match field {
            Field::Vegetation => obs.vegetation = "unsure".into(),
            Field::GuyGuard => obs.guy_guard.clear(),
            Field::PoleType => obs.pole_type = "   ".into(),
            Field::ConduitRiser => obs.has_conduit_riser = "?".into(),
        }
        let mismatches = r.compare(&obs, &reference());
        assert!(
            mismatches.iter().all(|m| m.field != field),
            "{field} should be skipped"
        );
        assert_eq!(mismatches.len(), 3);
    }
}

#[test]
fn conditions_never_raise_the_score() {
    let r = Reconciler::default();
    let base = observed("No", "Yes", "Wood", "No");
    let veg = observed("Yes", "Yes", "Wood", "No");
    let gg = observed("No", "No", "Wood", "No");
    let base_score = r.score(&base, &[]).score;
    assert!(r.score(&veg, &[]).score <= base_score);
    assert!(r.score(&gg, &[]).score <= base_score);
}

#[test]
fn category_normalisation_exactness() {
    let table = AliasTable::default();
    let m = normalize_category("Wooden", &table, 0.6, 0.2);
    assert_eq!((m.canonical.as_str(), m.confidence), ("wood", 1.0));
    let m = normalize_category("stl", &table, 0.6, 0.2);
    assert_eq!((m.canonical.as_str(), m.confidence), ("steel", 1.0));
    let m = normalize_category("", &table, 0.6, 0.2);
    assert_eq!((m.canonical.as_str(), m.confidence), ("", 0.0));
}

#[test]
fn report_json_uses_field_names() {
    let r = Reconciler::default();
    let report = r
        .reconcile(&observed("Yes", "Yes", "Wood", "No"), &reference(), Utc::now())
        .unwrap();
    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["pole_id"], "P0010");
    assert_eq!(v["risk_score"], 60);
    assert_eq!(v["status"], "WARNING");
    assert_eq!(v["mismatches"][0]["field"], "vegetation");
    assert_eq!(v["mismatches"][0]["ai_normalized"], "yes");
    assert_eq!(v["gis"]["expected_vegetation"], "No");
    assert_eq!(v["ai"]["vegetation"], "Yes");

    let back: polepad_core::Report = serde_json::from_value(v).unwrap();
    assert_eq!(back, report);
}

#[test]
fn config_from_toml_changes_weights() {
    let config = ReconcileConfig::from_toml_str("[weights]\nvegetation_present = 40.0\n").unwrap();
    let r = Reconciler::new(config).unwrap();
    assert_eq!(r.score(&observed("Yes", "Yes", "", ""), &[]).score, 60);
}
