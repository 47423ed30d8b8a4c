use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::EvidenceError;

/// Governed trust level of one extracted field, ordered by severity.
///
/// Only `Ok` and `LowConfidence` may support a finding; `Abstained` and
/// `Illegible` always degrade any dependent finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    /// Value present, provenance complete, confidence at or above the floor.
    Ok,
    /// Value present with full provenance, but confidence below the floor.
    LowConfidence,
    /// Evidence withheld: provenance or confidence missing. Never asserted.
    Abstained,
    /// No value could be read at all.
    Illegible,
}

impl EvidenceStatus {
    /// Whether a record with this status may back a finding.
    pub fn may_support_finding(self) -> bool {
        matches!(self, Self::Ok | Self::LowConfidence)
    }
}

impl fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::LowConfidence => write!(f, "low_confidence"),
            Self::Abstained => write!(f, "abstained"),
            Self::Illegible => write!(f, "illegible"),
        }
    }
}

/// How a value was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMethod {
    /// Embedded text layer read directly. Zero transcription risk.
    NativeText,
    OcrEngineA,
    OcrEngineB,
    VisionModel,
    /// Queued for a human transcriber; no confidence until resolved.
    Manual,
}

impl fmt::Display for SourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NativeText => write!(f, "native_text"),
            Self::OcrEngineA => write!(f, "ocr_engine_a"),
            Self::OcrEngineB => write!(f, "ocr_engine_b"),
            Self::VisionModel => write!(f, "vision_model"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Bounding box of a text region on the source page (for review highlighting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The triple substantiating any high-severity finding: source file, page,
/// literal excerpt. `file_id` is an opaque content-addressed identifier
/// issued by the chain-of-custody module; the core never computes hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub file_id: String,
    /// 1-indexed page number. 0 means "unknown" and is incomplete.
    pub page_number: u32,
    /// Literal excerpt from the source, sanitized and length-bounded.
    pub literal_snippet: String,
    pub bounding_box: Option<BoundingBox>,
}

impl Provenance {
    pub fn new(file_id: impl Into<String>, page_number: u32, snippet: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            page_number,
            literal_snippet: super::snippet::sanitize_snippet(&snippet.into()),
            bounding_box: None,
        }
    }

    /// Complete provenance requires file, a 1-indexed page, and an excerpt.
    /// A record without all three can never carry an assertable status.
    pub fn is_complete(&self) -> bool {
        !self.file_id.trim().is_empty()
            && self.page_number >= 1
            && !self.literal_snippet.trim().is_empty()
    }
}

/// One extracted value plus its provenance and confidence metadata.
///
/// Immutable after creation. When a fallback engine re-extracts the same
/// field, a NEW record is created with `supersedes` pointing at the prior
/// record, which is retained for audit — never overwritten in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEvidenceRecord {
    pub record_id: Uuid,
    /// Semantic field identifier, e.g. "ruc_emisor", "fecha_emision".
    pub field_name: String,
    /// The extracted value, or `None`. Never fabricated.
    pub raw_value: Option<String>,
    pub source_method: SourceMethod,
    /// In [0.0, 1.0]. `None` while a manual transcription is pending.
    pub confidence: Option<f32>,
    pub provenance: Provenance,
    pub status: EvidenceStatus,
    pub extracted_at: DateTime<Utc>,
    /// Prior record replaced by this fallback re-extraction, if any.
    pub supersedes: Option<Uuid>,
}

impl FieldEvidenceRecord {
    /// Whether this record satisfies the no-fabrication property: an `Ok`
    /// status implies complete provenance and a present confidence.
    pub fn is_well_formed(&self) -> bool {
        if self.status.may_support_finding() {
            self.provenance.is_complete() && self.raw_value.is_some()
        } else {
            true
        }
    }
}

/// Uniform result shape every extraction backend must produce.
///
/// The core does not care which engine produced this, only that the shape
/// is honored. Tesseract, PaddleOCR and the native text layer all reduce
/// to this struct at the adapter boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionBackendResult {
    pub text: String,
    /// Mean recognition confidence in [0.0, 1.0]; `None` for engines that
    /// do not report one (native text layers).
    pub confidence: Option<f32>,
    pub word_count: usize,
    pub char_count: usize,
    pub engine_name: String,
}

impl ExtractionBackendResult {
    /// Build a result from raw text, deriving the counts.
    pub fn from_text(text: impl Into<String>, confidence: Option<f32>, engine: &str) -> Self {
        let text = text.into();
        Self {
            word_count: text.split_whitespace().count(),
            char_count: text.chars().count(),
            confidence,
            engine_name: engine.to_string(),
            text,
        }
    }
}

/// Native text-layer extraction abstraction (allows mocking for tests).
pub trait TextBackend {
    fn page_count(&self) -> Result<u32, EvidenceError>;

    /// Extract the embedded text of one 1-indexed page.
    fn extract_page(&self, page_number: u32) -> Result<ExtractionBackendResult, EvidenceError>;
}

/// OCR engine abstraction. Timeouts and retries on the engine call are the
/// adapter's responsibility; the core treats this as a bounded synchronous
/// call returning a result or an error.
pub trait OcrBackend {
    fn engine_name(&self) -> &str;

    /// OCR one 1-indexed page.
    fn ocr_page(&self, page_number: u32) -> Result<ExtractionBackendResult, EvidenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_provenance() -> Provenance {
        Provenance::new("sha256:abc123", 1, "RUC: 20100070970")
    }

    #[test]
    fn status_ordering_by_severity() {
        assert!(EvidenceStatus::Ok < EvidenceStatus::LowConfidence);
        assert!(EvidenceStatus::LowConfidence < EvidenceStatus::Abstained);
        assert!(EvidenceStatus::Abstained < EvidenceStatus::Illegible);
    }

    #[test]
    fn only_ok_and_low_confidence_support_findings() {
        assert!(EvidenceStatus::Ok.may_support_finding());
        assert!(EvidenceStatus::LowConfidence.may_support_finding());
        assert!(!EvidenceStatus::Abstained.may_support_finding());
        assert!(!EvidenceStatus::Illegible.may_support_finding());
    }

    #[test]
    fn provenance_complete_with_all_three() {
        assert!(complete_provenance().is_complete());
    }

    #[test]
    fn provenance_incomplete_without_file_id() {
        let p = Provenance::new("", 1, "snippet");
        assert!(!p.is_complete());
    }

    #[test]
    fn provenance_incomplete_with_page_zero() {
        let p = Provenance::new("sha256:abc", 0, "snippet");
        assert!(!p.is_complete());
    }

    #[test]
    fn provenance_incomplete_with_blank_snippet() {
        let p = Provenance::new("sha256:abc", 1, "   ");
        assert!(!p.is_complete());
    }

    #[test]
    fn backend_result_derives_counts() {
        let r = ExtractionBackendResult::from_text("uno dos tres", Some(0.8), "tesseract");
        assert_eq!(r.word_count, 3);
        assert_eq!(r.char_count, 12);
        assert_eq!(r.engine_name, "tesseract");
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&EvidenceStatus::LowConfidence).unwrap();
        assert_eq!(json, "\"low_confidence\"");
    }

    #[test]
    fn source_method_serializes_snake_case() {
        let json = serde_json::to_string(&SourceMethod::NativeText).unwrap();
        assert_eq!(json, "\"native_text\"");
    }
}
