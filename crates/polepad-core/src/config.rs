//! Reconciliation configuration: normalisation vocabularies, penalty weights
//! and classification thresholds.
//!
//! A [`ReconcileConfig`] is handed to [`crate::Reconciler::new`]; nothing in
//! the crate reads configuration from global state. Every section carries
//! `#[serde(default)]`, so a TOML file only needs the keys it overrides:
//!
//! ```toml
//! [weights]
//! per_mismatch = 30.0
//!
//! [normalizer.pole_type_aliases]
//! concrete = ["concrete", "cement"]
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub normalizer: NormalizerConfig,
    pub weights: Weights,
    pub thresholds: Thresholds,
}

impl ReconcileConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.normalizer.validate()?;
        self.weights.validate()?;
        self.thresholds.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Tokens read as `yes` (compared lowercased and trimmed).
    pub true_tokens: BTreeSet<String>,
    /// Tokens read as `no`.
    pub false_tokens: BTreeSet<String>,
    pub pole_type_aliases: AliasTable,
    /// Minimum similarity ratio for a fuzzy alias match.
    pub fuzzy_cutoff: f64,
    /// Confidence reported when no alias clears the cutoff.
    pub passthrough_confidence: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            true_tokens: tokens(&["yes", "y", "true", "1", "t"]),
            false_tokens: tokens(&["no", "n", "false", "0", "f"]),
            pole_type_aliases: AliasTable::default(),
            fuzzy_cutoff: 0.6,
            passthrough_confidence: 0.2,
        }
    }
}

impl NormalizerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("normalizer.fuzzy_cutoff", self.fuzzy_cutoff)?;
        unit_interval(
            "normalizer.passthrough_confidence",
            self.passthrough_confidence,
        )?;

        let true_lower: BTreeSet<String> =
            self.true_tokens.iter().map(|t| t.trim().to_lowercase()).collect();
        if let Some(both) = self
            .false_tokens
            .iter()
            .map(|t| t.trim().to_lowercase())
            .find(|t| true_lower.contains(t))
        {
            return Err(ConfigError::Invalid(format!(
                "token {both:?} is listed as both true and false"
            )));
        }

        self.pole_type_aliases.validate()
    }
}

/// Canonical category → accepted spellings.
///
/// Backed by a `BTreeMap`, so iteration (and therefore fuzzy tie-breaking) is
/// in canonical-name order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(BTreeMap<String, Vec<String>>);

impl Default for AliasTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.extend("wood", ["wood", "wooden"]);
        table.extend("steel", ["steel", "stl", "metal"]);
        table.extend("composite", ["composite", "fiberglass", "fibreglass"]);
        table
    }
}

impl AliasTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Add aliases to a canonical category, creating it if needed.
    /// Aliases are stored lowercased; duplicates are ignored.
    pub fn extend<I, S>(&mut self, canonical: &str, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.0.entry(canonical.to_string()).or_default();
        for alias in aliases {
            let alias = alias.as_ref().trim().to_lowercase();
            if !alias.is_empty() && !entry.contains(&alias) {
                entry.push(alias);
            }
        }
    }

    /// Exact, case-insensitive alias lookup. `needle` must already be lowercased.
    pub fn exact(&self, needle: &str) -> Option<&str> {
        self.0.iter().find_map(|(canonical, aliases)| {
            aliases
                .iter()
                .any(|a| a.to_lowercase() == needle)
                .then_some(canonical.as_str())
        })
    }

    /// Every `(alias, canonical)` pair in table order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(canonical, aliases)| {
            aliases
                .iter()
                .map(move |alias| (alias.as_str(), canonical.as_str()))
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut owner: BTreeMap<String, &str> = BTreeMap::new();
        for (alias, canonical) in self.pairs() {
            let alias = alias.to_lowercase();
            if let Some(prev) = owner.insert(alias.clone(), canonical)
                && prev != canonical
            {
                return Err(ConfigError::Invalid(format!(
                    "alias {alias:?} maps to both {prev:?} and {canonical:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Penalty weights of the linear risk model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub vegetation_present: f64,
    pub guy_guard_missing: f64,
    pub per_mismatch: f64,
    pub high_multiplier: f64,
    pub medium_multiplier: f64,
    pub low_multiplier: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            vegetation_present: 15.0,
            guy_guard_missing: 35.0,
            per_mismatch: 25.0,
            high_multiplier: 1.5,
            medium_multiplier: 1.0,
            low_multiplier: 0.5,
        }
    }
}

impl Weights {
    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("weights.vegetation_present", self.vegetation_present),
            ("weights.guy_guard_missing", self.guy_guard_missing),
            ("weights.per_mismatch", self.per_mismatch),
            ("weights.high_multiplier", self.high_multiplier),
            ("weights.medium_multiplier", self.medium_multiplier),
            ("weights.low_multiplier", self.low_multiplier),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Score cut-offs. The status pair and the assessment pair are independent
/// classifications and are not derived from each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// `score >= status_ok` → OK.
    pub status_ok: u8,
    /// `score >= status_warning` → WARNING, below → HIGH RISK.
    pub status_warning: u8,
    /// `score >= assessment_safe` with no mismatches → SAFE.
    pub assessment_safe: u8,
    /// `score >= assessment_caution` → CAUTION, below → HIGH RISK.
    pub assessment_caution: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            status_ok: 80,
            status_warning: 50,
            assessment_safe: 90,
            assessment_caution: 70,
        }
    }
}

impl Thresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.status_warning > self.status_ok {
            return Err(ConfigError::Invalid(format!(
                "thresholds.status_warning ({}) exceeds thresholds.status_ok ({})",
                self.status_warning, self.status_ok
            )));
        }
        if self.assessment_caution > self.assessment_safe {
            return Err(ConfigError::Invalid(format!(
                "thresholds.assessment_caution ({}) exceeds thresholds.assessment_safe ({})",
                self.assessment_caution, self.assessment_safe
            )));
        }
        if self.status_ok > 100 || self.assessment_safe > 100 {
            return Err(ConfigError::Invalid("thresholds must not exceed 100".into()));
        }
        Ok(())
    }
}

fn tokens(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}
