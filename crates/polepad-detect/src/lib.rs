//! Detection output interpretation: detector class labels and OCR text
//! candidates, already computed upstream, become an `ObservationRecord`.

pub mod labels;
pub mod observation;
pub mod ocr;

pub use labels::{DetectedAttributes, Detection, LabelRules};
pub use observation::{AssetSource, DetectError, DetectorOutput, Interpretation};
pub use ocr::{OcrCandidate, TagConfidence, TagReading, clean_tag, longest_tag, read_tag};
