//! Assembly of an [`ObservationRecord`] from one image's detector output.

use polepad_core::{AssetId, ObservationRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::labels::{Detection, LabelRules};
use crate::ocr::{self, OcrCandidate, TagConfidence, TagReading};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no asset supplied, named in the detector output, or read from a tag")]
    MissingAsset,
}

/// Raw output of the detection stage for one image.
///
/// ```json
/// {
///   "pole_id": "P0010",
///   "detections": [{"label": "wood", "confidence": 0.91}],
///   "ocr": [{"text": "P0010", "confidence": 0.93}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorOutput {
    #[serde(default, rename = "pole_id", skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<AssetId>,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub ocr: Vec<OcrCandidate>,
}

/// Where the observation's asset id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    Supplied,
    Output,
    /// A high-confidence OCR tag reading.
    Tag,
}

/// An observation plus the graded tag reading that accompanied it.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub observation: ObservationRecord,
    pub tag: TagReading,
    pub asset_source: AssetSource,
}

impl DetectorOutput {
    pub fn from_json(s: &str) -> Result<Self, DetectError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Interpret the output. `asset` overrides the `pole_id` in the output
    /// (operators usually select the asset before capturing the image). With
    /// neither, the asset is identified from a [`TagConfidence::High`] tag
    /// reading; a low-confidence reading is not trusted as an id.
    ///
    /// Vegetation is reported `yes`/`no` since the detector looks for it in
    /// every image; guy guard and conduit riser are only reported `yes` when
    /// seen and otherwise left blank, so an undetected fixture is never
    /// scored as missing. Pole type stays blank when no material was detected.
    pub fn interpret(
        &self,
        asset: Option<AssetId>,
        rules: &LabelRules,
    ) -> Result<Interpretation, DetectError> {
        let tag = ocr::read_tag(&self.ocr);
        let tagged = match (&tag.tag, tag.confidence) {
            (Some(text), TagConfidence::High) => Some(AssetId::new(text)),
            _ => None,
        };
        let known = |id: &Option<AssetId>| id.clone().filter(|id| !id.is_empty());
        let (asset_id, asset_source) = known(&asset)
            .map(|id| (id, AssetSource::Supplied))
            .or_else(|| known(&self.asset_id).map(|id| (id, AssetSource::Output)))
            .or_else(|| known(&tagged).map(|id| (id, AssetSource::Tag)))
            .ok_or(DetectError::MissingAsset)?;

        let attrs = rules.interpret(&self.detections);
        let yes_or_blank = |seen: bool| if seen { "yes" } else { "" }.to_string();
        let longest = ocr::longest_tag(&self.ocr);

        let observation = ObservationRecord {
            vegetation: if attrs.vegetation { "yes" } else { "no" }.to_string(),
            guy_guard: yes_or_blank(attrs.guy_guard),
            pole_type: attrs.pole_type.unwrap_or_default(),
            has_conduit_riser: yes_or_blank(attrs.conduit_riser),
            tag_name: longest.as_ref().map(|c| c.text.clone()),
            from_ocr: longest.as_ref().map(ocr::provenance),
            ..ObservationRecord::new(asset_id)
        };
        info!(
            asset = %observation.asset_id,
            source = ?asset_source,
            detections = self.detections.len(),
            ocr_candidates = self.ocr.len(),
            pole_type = %observation.pole_type,
            tag = ?tag.tag,
            "interpreted detector output"
        );
        Ok(Interpretation {
            observation,
            tag,
            asset_source,
        })
    }
}
