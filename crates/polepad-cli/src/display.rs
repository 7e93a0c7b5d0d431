//! Vertical card display for reconciliation reports.

use std::path::Path;

use polepad_core::{CategoryMatch, Field, Mismatch, NormalizedValue, PenaltyReason, Report};

const LABEL_WIDTH: usize = 26;

// ── Public API ──

/// Print a report as a vertical card grouped by section.
pub fn print_report_card(report: &Report, location: Option<&Path>) {
    println!("=== {} ===", report.asset_id);
    println!("{}", report.timestamp.to_rfc3339());
    println!();

    println!("GIS record");
    for field in Field::ORDER {
        row(field.as_str(), report.gis.raw(field));
    }
    optional_row("tag_name", report.gis.tag_name.as_deref());
    println!();

    println!("AI detected");
    for field in Field::ORDER {
        row(field.as_str(), report.ai.raw(field));
    }
    optional_row("tag_name", report.ai.tag_name.as_deref());
    optional_row("from_ocr", report.ai.from_ocr.as_deref());
    println!();

    println!("Mismatches");
    if report.mismatches.is_empty() {
        println!("  none");
    }
    for m in &report.mismatches {
        print_mismatch(m);
    }
    println!();

    println!("Score");
    row("risk_score", &report.risk_score.to_string());
    row("status", report.status.as_str());
    for p in &report.penalties {
        row(&penalty_label(&p.reason), &format!("-{}", p.points));
    }
    println!();

    println!("System assessment");
    row("risk_level", report.assessment.risk_level.as_str());
    row("data_status", report.assessment.data_status.as_str());
    row("action", &report.assessment.action);
    row("confidence", report.assessment.confidence.as_str());

    if let Some(path) = location {
        println!();
        println!("Report saved to: {}", path.display());
    }
}

/// One-line summary used by batch runs.
pub fn summary_line(report: &Report, location: &Path) -> String {
    format!(
        "{:<12} {:>3}  {:<9} {:<9} {} mismatch(es)  {}",
        report.asset_id.as_str(),
        report.risk_score,
        report.status.as_str(),
        report.assessment.risk_level.as_str(),
        report.mismatches.len(),
        location.display()
    )
}

// ── Rows ──

fn row(label: &str, value: &str) {
    let value = if value.trim().is_empty() { "-" } else { value };
    println!("  {:<width$} {}", label, value, width = LABEL_WIDTH);
}

fn optional_row(label: &str, value: Option<&str>) {
    if let Some(v) = value {
        row(label, v);
    }
}

fn print_mismatch(m: &Mismatch) {
    let label = format!("{} [{}]", m.field, m.severity);
    let detail = format!(
        "GIS={} ({}) vs AI={} ({})",
        m.gis,
        normalized(&m.gis_normalized),
        m.ai,
        normalized(&m.ai_normalized)
    );
    row(&label, &detail);
}

fn normalized(value: &NormalizedValue) -> String {
    match value {
        NormalizedValue::Flag(t) => t.to_string(),
        NormalizedValue::Category(CategoryMatch {
            canonical,
            confidence,
        }) => format!("{canonical}, conf {confidence:.2}"),
    }
}

fn penalty_label(reason: &PenaltyReason) -> String {
    match reason {
        PenaltyReason::VegetationPresent => "vegetation present".into(),
        PenaltyReason::GuyGuardMissing => "guy guard missing".into(),
        PenaltyReason::Mismatch { field, severity } => format!("{field} mismatch ({severity})"),
    }
}
