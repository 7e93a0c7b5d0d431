//! Linear risk model.
//!
//! Score starts at 100 and loses fixed, configurable penalties for observed
//! conditions and for each mismatch (scaled by severity). The result is
//! rounded half-to-even, clamped to `[0, 100]` and classified twice: a coarse
//! [`Status`] and a richer [`Assessment`], each with its own thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compare::{Field, Mismatch, Severity};
use crate::config::{Thresholds, Weights};
use crate::normalize::TriState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "HIGH RISK")]
    HighRisk,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::HighRisk => "HIGH RISK",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "SAFE")]
    Safe,
    #[serde(rename = "CAUTION")]
    Caution,
    #[serde(rename = "HIGH RISK")]
    HighRisk,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Caution => "CAUTION",
            Self::HighRisk => "HIGH RISK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataStatus {
    #[serde(rename = "VERIFIED")]
    Verified,
    #[serde(rename = "Minor discrepancies")]
    MinorDiscrepancies,
    #[serde(rename = "Significant discrepancy")]
    SignificantDiscrepancy,
}

impl DataStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::MinorDiscrepancies => "Minor discrepancies",
            Self::SignificantDiscrepancy => "Significant discrepancy",
        }
    }
}

/// How much a reviewer can rely on the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewConfidence {
    High,
    Medium,
    Low,
}

impl ReviewConfidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub risk_level: RiskLevel,
    pub data_status: DataStatus,
    pub action: String,
    pub confidence: ReviewConfidence,
}

impl Assessment {
    fn new(
        risk_level: RiskLevel,
        data_status: DataStatus,
        action: &str,
        confidence: ReviewConfidence,
    ) -> Self {
        Self {
            risk_level,
            data_status,
            action: action.to_string(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PenaltyReason {
    VegetationPresent,
    GuyGuardMissing,
    Mismatch { field: Field, severity: Severity },
}

/// One deduction applied to the score, in application order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub reason: PenaltyReason,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub score: u8,
    pub status: Status,
    pub assessment: Assessment,
    pub penalties: Vec<Penalty>,
}

#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    weights: Weights,
    thresholds: Thresholds,
}

impl RiskScorer {
    pub fn new(weights: Weights, thresholds: Thresholds) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    /// Score an observation given its normalised vegetation and guy-guard
    /// values and the mismatches found against the reference.
    pub fn score(
        &self,
        vegetation: TriState,
        guy_guard: TriState,
        mismatches: &[Mismatch],
    ) -> RiskScore {
        let mut penalties = Vec::with_capacity(mismatches.len() + 2);

        if vegetation == TriState::Yes {
            penalties.push(Penalty {
                reason: PenaltyReason::VegetationPresent,
                points: self.weights.vegetation_present,
            });
        }
        if guy_guard == TriState::No {
            penalties.push(Penalty {
                reason: PenaltyReason::GuyGuardMissing,
                points: self.weights.guy_guard_missing,
            });
        }
        for m in mismatches {
            penalties.push(Penalty {
                reason: PenaltyReason::Mismatch {
                    field: m.field,
                    severity: m.severity,
                },
                points: self.weights.per_mismatch * self.multiplier(m.severity),
            });
        }

        let raw = 100.0 - penalties.iter().map(|p| p.points).sum::<f64>();
        let score = raw.round_ties_even().clamp(0.0, 100.0) as u8;

        RiskScore {
            score,
            status: self.status(score),
            assessment: self.assess(score, !mismatches.is_empty()),
            penalties,
        }
    }

    pub fn multiplier(&self, severity: Severity) -> f64 {
        match severity {
            Severity::High => self.weights.high_multiplier,
            Severity::Medium => self.weights.medium_multiplier,
            Severity::Low => self.weights.low_multiplier,
        }
    }

    pub fn status(&self, score: u8) -> Status {
        if score >= self.thresholds.status_ok {
            Status::Ok
        } else if score >= self.thresholds.status_warning {
            Status::Warning
        } else {
            Status::HighRisk
        }
    }

    /// Classify on score and presence of mismatches; independent of [`Status`].
    pub fn assess(&self, score: u8, has_mismatches: bool) -> Assessment {
        if score >= self.thresholds.assessment_safe && !has_mismatches {
            Assessment::new(
                RiskLevel::Safe,
                DataStatus::Verified,
                "No review required",
                ReviewConfidence::High,
            )
        } else if score >= self.thresholds.assessment_caution {
            Assessment::new(
                RiskLevel::Caution,
                DataStatus::MinorDiscrepancies,
                "Community validation suggested",
                ReviewConfidence::Medium,
            )
        } else {
            Assessment::new(
                RiskLevel::HighRisk,
                DataStatus::SignificantDiscrepancy,
                "Field inspection recommended",
                ReviewConfidence::Low,
            )
        }
    }
}
