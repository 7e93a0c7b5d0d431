//! The reconciliation entry point: normalise, compare, score.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::asset::AssetId;
use crate::compare::{self, Mismatch};
use crate::config::{ConfigError, ReconcileConfig};
use crate::normalize::Normalizer;
use crate::record::{GisRecord, ObservationRecord};
use crate::report::Report;
use crate::risk::{RiskScore, RiskScorer};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("observation for {observation} cannot be reconciled against GIS record {reference}")]
    AssetMismatch {
        observation: AssetId,
        reference: AssetId,
    },
}

/// Owns a validated configuration and runs the pure reconciliation steps.
///
/// Holds no mutable state; one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    normalizer: Normalizer,
    scorer: RiskScorer,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ReconcileConfig {
            normalizer,
            weights,
            thresholds,
        } = config;
        Ok(Self {
            normalizer: Normalizer::new(normalizer),
            scorer: RiskScorer::new(weights, thresholds),
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    pub fn compare(&self, observation: &ObservationRecord, reference: &GisRecord) -> Vec<Mismatch> {
        compare::compare(&self.normalizer, observation, reference)
    }

    pub fn score(&self, observation: &ObservationRecord, mismatches: &[Mismatch]) -> RiskScore {
        self.scorer.score(
            self.normalizer.boolean(&observation.vegetation),
            self.normalizer.boolean(&observation.guy_guard),
            mismatches,
        )
    }

    /// Compare and score, producing a report stamped with `at`.
    pub fn reconcile(
        &self,
        observation: &ObservationRecord,
        reference: &GisRecord,
        at: DateTime<Utc>,
    ) -> Result<Report, ReconcileError> {
        if observation.asset_id != reference.asset_id {
            return Err(ReconcileError::AssetMismatch {
                observation: observation.asset_id.clone(),
                reference: reference.asset_id.clone(),
            });
        }

        let mismatches = self.compare(observation, reference);
        let risk = self.score(observation, &mismatches);
        info!(
            asset = %reference.asset_id,
            mismatches = mismatches.len(),
            score = risk.score,
            status = %risk.status,
            "reconciled"
        );

        Ok(Report::new(
            at,
            reference.clone(),
            observation.clone(),
            mismatches,
            risk,
        ))
    }
}
