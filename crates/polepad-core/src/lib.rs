pub mod asset;
pub mod compare;
pub mod config;
pub mod normalize;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod risk;
pub mod schema;

pub use asset::AssetId;
pub use compare::{Field, Mismatch, Severity, compare};
pub use config::{AliasTable, ConfigError, NormalizerConfig, ReconcileConfig, Thresholds, Weights};
pub use normalize::{CategoryMatch, NormalizedValue, Normalizer, TriState};
pub use reconcile::{ReconcileError, Reconciler};
pub use record::{GisRecord, ObservationRecord};
pub use report::Report;
pub use risk::{
    Assessment, DataStatus, Penalty, PenaltyReason, ReviewConfidence, RiskLevel, RiskScore,
    RiskScorer, Status,
};
pub use schema::gis;
