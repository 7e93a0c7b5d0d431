//! Canonicalisation of raw attribute values.
//!
//! Boolean attributes collapse to a [`TriState`]; categorical attributes
//! (pole type) resolve through an [`AliasTable`] to a canonical name with a
//! confidence. Normalisation never fails: anything unrecognised degrades to
//! `Unknown` (booleans) or an empty/low-confidence category, and the
//! comparator treats those as "no evidence" rather than as a discrepancy.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AliasTable, NormalizerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    Yes,
    No,
    Unknown,
}

impl TriState {
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving a categorical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub canonical: String,
    /// 1.0 for an exact alias hit, the similarity ratio for a fuzzy hit,
    /// the passthrough confidence when nothing matched, 0.0 for empty input.
    pub confidence: f64,
}

impl CategoryMatch {
    pub fn empty() -> Self {
        Self {
            canonical: String::new(),
            confidence: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

/// Normalised form of one side of a compared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Flag(TriState),
    Category(CategoryMatch),
}

/// Applies a [`NormalizerConfig`] to raw values.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn boolean(&self, raw: &str) -> TriState {
        normalize_boolean(raw, &self.config.true_tokens, &self.config.false_tokens)
    }

    /// Resolve a pole type through the configured alias table.
    pub fn category(&self, raw: &str) -> CategoryMatch {
        normalize_category(
            raw,
            &self.config.pole_type_aliases,
            self.config.fuzzy_cutoff,
            self.config.passthrough_confidence,
        )
    }
}

/// Case-insensitive, trimmed token lookup. Empty or unrecognised → `Unknown`.
pub fn normalize_boolean(
    raw: &str,
    true_tokens: &BTreeSet<String>,
    false_tokens: &BTreeSet<String>,
) -> TriState {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return TriState::Unknown;
    }
    let hit = |set: &BTreeSet<String>| set.iter().any(|t| t.trim().to_lowercase() == s);
    if hit(true_tokens) {
        TriState::Yes
    } else if hit(false_tokens) {
        TriState::No
    } else {
        TriState::Unknown
    }
}

/// Resolve `raw` to a canonical category.
///
/// 1. Empty input → `("", 0.0)`.
/// 2. Exact alias (case-insensitive) → `(canonical, 1.0)`.
/// 3. Best fuzzy alias with similarity ≥ `cutoff` → `(canonical, similarity)`.
///    Ties keep the earliest alias in table order.
/// 4. Otherwise the lowercased input itself with `passthrough` confidence, so
///    an unlisted value can still equal an identical unlisted value.
pub fn normalize_category(
    raw: &str,
    table: &AliasTable,
    cutoff: f64,
    passthrough: f64,
) -> CategoryMatch {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return CategoryMatch::empty();
    }

    if let Some(canonical) = table.exact(&s) {
        return CategoryMatch {
            canonical: canonical.to_string(),
            confidence: 1.0,
        };
    }

    let mut best: Option<(&str, &str, f64)> = None;
    for (alias, canonical) in table.pairs() {
        let ratio = similarity(&s, &alias.to_lowercase());
        if best.is_none_or(|(_, _, r)| ratio > r) {
            best = Some((alias, canonical, ratio));
        }
    }

    match best {
        Some((alias, canonical, ratio)) if ratio >= cutoff => {
            debug!(input = %s, alias, canonical, ratio, "fuzzy category match");
            CategoryMatch {
                canonical: canonical.to_string(),
                confidence: ratio,
            }
        }
        _ => CategoryMatch {
            canonical: s,
            confidence: passthrough,
        },
    }
}

/// Normalised Levenshtein similarity in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::default()
    }

    #[test]
    fn boolean_tokens() {
        let n = normalizer();
        for raw in ["Yes", " y ", "TRUE", "1", "t"] {
            assert_eq!(n.boolean(raw), TriState::Yes, "{raw:?}");
        }
        for raw in ["No", "n", "False", "0", " F"] {
            assert_eq!(n.boolean(raw), TriState::No, "{raw:?}");
        }
        for raw in ["", "   ", "maybe", "2", "yess"] {
            assert_eq!(n.boolean(raw), TriState::Unknown, "{raw:?}");
        }
    }

    #[test]
    fn boolean_tokens_are_configurable() {
        let mut config = NormalizerConfig::default();
        config.true_tokens.insert("present".into());
        config.false_tokens.insert("Absent".into());
        let n = Normalizer::new(config);
        assert_eq!(n.boolean("PRESENT"), TriState::Yes);
        assert_eq!(n.boolean("absent"), TriState::No);
    }

    #[test]
    fn category_exact_aliases() {
        let n = normalizer();
        let m = n.category("Wooden");
        assert_eq!(m.canonical, "wood");
        assert_eq!(m.confidence, 1.0);

        let m = n.category("stl");
        assert_eq!(m.canonical, "steel");
        assert_eq!(m.confidence, 1.0);

        let m = n.category("  FIBERGLASS ");
        assert_eq!(m.canonical, "composite");
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn category_empty() {
        let m = normalizer().category("");
        assert_eq!(m, CategoryMatch::empty());
        assert!(normalizer().category("   ").is_empty());
    }

    #[test]
    fn category_fuzzy_match_reports_ratio() {
        let m = normalizer().category("Steal");
        assert_eq!(m.canonical, "steel");
        assert!((m.confidence - 0.8).abs() < 1e-9, "{}", m.confidence);

        let m = normalizer().category("wod");
        assert_eq!(m.canonical, "wood");
        assert!(m.confidence >= 0.6 && m.confidence < 1.0);
    }

    #[test]
    fn category_passthrough_below_cutoff() {
        let m = normalizer().category("Concrete");
        assert_eq!(m.canonical, "concrete");
        assert_eq!(m.confidence, 0.2);
    }

    #[test]
    fn category_cutoff_is_configurable() {
        let mut config = NormalizerConfig::default();
        config.fuzzy_cutoff = 0.95;
        let m = Normalizer::new(config).category("Steal");
        assert_eq!(m.canonical, "steal");
        assert_eq!(m.confidence, 0.2);
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("wood", "wood"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn normalized_value_serialises_flat() {
        let flag = serde_json::to_value(NormalizedValue::Flag(TriState::Yes)).unwrap();
        assert_eq!(flag, serde_json::json!("yes"));

        let cat = serde_json::to_value(NormalizedValue::Category(CategoryMatch {
            canonical: "wood".into(),
            confidence: 1.0,
        }))
        .unwrap();
        assert_eq!(cat["canonical"], "wood");
    }
}
