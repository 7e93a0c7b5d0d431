use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::compare::Mismatch;
use crate::record::{GisRecord, ObservationRecord};
use crate::risk::{Assessment, Penalty, RiskScore, Status};

/// Outcome of one reconciliation run for one asset. Written once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "pole_id")]
    pub asset_id: AssetId,
    pub timestamp: DateTime<Utc>,
    pub gis: GisRecord,
    pub ai: ObservationRecord,
    pub mismatches: Vec<Mismatch>,
    pub risk_score: u8,
    pub status: Status,
    pub assessment: Assessment,
    #[serde(default)]
    pub penalties: Vec<Penalty>,
}

impl Report {
    pub fn new(
        timestamp: DateTime<Utc>,
        gis: GisRecord,
        ai: ObservationRecord,
        mismatches: Vec<Mismatch>,
        risk: RiskScore,
    ) -> Self {
        Self {
            asset_id: gis.asset_id.clone(),
            timestamp,
            gis,
            ai,
            mismatches,
            risk_score: risk.score,
            status: risk.status,
            assessment: risk.assessment,
            penalties: risk.penalties,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}
