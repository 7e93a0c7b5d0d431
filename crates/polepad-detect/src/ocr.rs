//! Asset tag selection from OCR text candidates.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum cleaned length for a candidate to count as a tag.
pub const MIN_TAG_LEN: usize = 4;
/// Confidence above which a well-formed tag is trusted.
pub const HIGH_CONFIDENCE: f32 = 0.6;
/// Confidence above which a well-formed tag is still reported, flagged low.
pub const LOW_CONFIDENCE: f32 = 0.4;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9\-]{4,10}$").expect("valid tag pattern"));

/// One OCR reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrCandidate {
    pub text: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagConfidence {
    High,
    Low,
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagReading {
    pub tag: Option<String>,
    pub confidence: TagConfidence,
}

/// Keep ASCII alphanumerics and `-`.
pub fn clean_tag(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Longest cleaned candidate of at least [`MIN_TAG_LEN`] characters; equal
/// lengths are decided by confidence. The returned candidate holds the
/// cleaned text.
pub fn longest_tag(candidates: &[OcrCandidate]) -> Option<OcrCandidate> {
    candidates
        .iter()
        .map(|c| OcrCandidate {
            text: clean_tag(&c.text),
            confidence: c.confidence,
        })
        .filter(|c| c.text.len() >= MIN_TAG_LEN)
        .reduce(|best, c| {
            let longer = c.text.len() > best.text.len();
            let surer = c.text.len() == best.text.len() && c.confidence > best.confidence;
            if longer || surer { c } else { best }
        })
}

/// First well-formed tag in descending confidence order, graded by
/// [`HIGH_CONFIDENCE`] / [`LOW_CONFIDENCE`].
pub fn read_tag(candidates: &[OcrCandidate]) -> TagReading {
    let mut ordered: Vec<&OcrCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    for c in ordered {
        let cleaned: String = c.text.trim().chars().filter(|ch| *ch != ' ').collect();
        if !TAG_PATTERN.is_match(&cleaned) {
            continue;
        }
        if c.confidence > HIGH_CONFIDENCE {
            return TagReading {
                tag: Some(cleaned),
                confidence: TagConfidence::High,
            };
        }
        if c.confidence > LOW_CONFIDENCE {
            return TagReading {
                tag: Some(cleaned),
                confidence: TagConfidence::Low,
            };
        }
    }

    TagReading {
        tag: None,
        confidence: TagConfidence::Unreadable,
    }
}

/// Human-readable provenance, e.g. `"P0010 (Conf: 0.93)"`.
pub fn provenance(candidate: &OcrCandidate) -> String {
    format!("{} (Conf: {:.2})", candidate.text, candidate.confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(text: &str, confidence: f32) -> OcrCandidate {
        OcrCandidate {
            text: text.into(),
            confidence,
        }
    }

    #[test]
    fn clean_strips_punctuation() {
        assert_eq!(clean_tag("P-00 10."), "P-0010");
        assert_eq!(clean_tag("#AB_12"), "AB12");
    }

    #[test]
    fn longest_wins_then_confidence() {
        let picked = longest_tag(&[c("P001", 0.99), c("P00123", 0.5), c("X00123", 0.7)]).unwrap();
        assert_eq!(picked.text, "X00123");
        assert_eq!(picked.confidence, 0.7);
    }

    #[test]
    fn short_candidates_ignored() {
        assert!(longest_tag(&[c("AB", 0.9), c("A.B.C", 0.9)]).is_none());
        assert!(longest_tag(&[]).is_none());
    }

    #[test]
    fn read_tag_grades_confidence() {
        let r = read_tag(&[c("P0010", 0.93)]);
        assert_eq!(r.tag.as_deref(), Some("P0010"));
        assert_eq!(r.confidence, TagConfidence::High);

        let r = read_tag(&[c("P 0010", 0.5)]);
        assert_eq!(r.tag.as_deref(), Some("P0010"));
        assert_eq!(r.confidence, TagConfidence::Low);

        let r = read_tag(&[c("P0010", 0.3)]);
        assert_eq!(r, TagReading { tag: None, confidence: TagConfidence::Unreadable });
    }

    #[test]
    fn read_tag_prefers_most_confident_well_formed() {
        let r = read_tag(&[c("DANGER HIGH VOLTAGE", 0.99), c("T-4471", 0.45), c("T-4470", 0.8)]);
        assert_eq!(r.tag.as_deref(), Some("T-4470"));
        assert_eq!(r.confidence, TagConfidence::High);
    }

    #[test]
    fn read_tag_rejects_lowercase_and_long() {
        assert_eq!(read_tag(&[c("p0010", 0.9)]).confidence, TagConfidence::Unreadable);
        assert_eq!(read_tag(&[c("P00000000001", 0.9)]).confidence, TagConfidence::Unreadable);
    }

    #[test]
    fn provenance_format() {
        assert_eq!(provenance(&c("P0010", 0.931)), "P0010 (Conf: 0.93)");
    }
}
