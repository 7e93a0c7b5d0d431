//! Detector class labels → pole attributes.
//!
//! Labels come from an object detector trained on pole imagery. Matching is
//! case-insensitive; pole material uses exact label lists, the remaining
//! attributes use substring keywords since detector vocabularies vary
//! (`vegetation`, `vegetation_encroachment`, `tree-vegetation`, ...).

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One detector hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

/// Attributes inferred from one image's detections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedAttributes {
    /// Material of the first detection that names one.
    pub pole_type: Option<String>,
    pub vegetation: bool,
    pub guy_guard: bool,
    pub conduit_riser: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelRules {
    /// `(material, labels)` in priority order.
    pub materials: Vec<(String, Vec<String>)>,
    pub vegetation_keywords: Vec<String>,
    pub guy_guard_keywords: Vec<String>,
    pub riser_keywords: Vec<String>,
    /// Detections below this confidence are ignored.
    pub min_confidence: f32,
}

impl Default for LabelRules {
    fn default() -> Self {
        let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            materials: vec![
                ("wood".into(), strings(&["wood", "wooden", "composite"])),
                ("metal".into(), strings(&["steel", "metal"])),
            ],
            vegetation_keywords: strings(&["vegetation"]),
            guy_guard_keywords: strings(&["guy_guard", "guy guard", "guy-guard", "guyguard"]),
            riser_keywords: strings(&["riser", "conduit"]),
            min_confidence: 0.0,
        }
    }
}

impl LabelRules {
    pub fn interpret(&self, detections: &[Detection]) -> DetectedAttributes {
        let mut attrs = DetectedAttributes::default();

        for d in detections.iter().filter(|d| d.confidence >= self.min_confidence) {
            let label = d.label.trim().to_lowercase();

            if attrs.pole_type.is_none()
                && let Some(material) = self.material(&label)
            {
                debug!(label = %d.label, material, "pole material detected");
                attrs.pole_type = Some(material.to_string());
            }
            attrs.vegetation |= contains_any(&label, &self.vegetation_keywords);
            attrs.guy_guard |= contains_any(&label, &self.guy_guard_keywords);
            attrs.conduit_riser |= contains_any(&label, &self.riser_keywords);
        }

        attrs
    }

    fn material(&self, label: &str) -> Option<&str> {
        self.materials.iter().find_map(|(material, labels)| {
            labels
                .iter()
                .any(|l| l.to_lowercase() == label)
                .then_some(material.as_str())
        })
    }
}

fn contains_any(label: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| label.contains(&k.to_lowercase()))
}
