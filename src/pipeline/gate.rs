//! Extraction Gate — decides, per document, whether to trust direct text
//! extraction, invoke OCR, or fall back to manual-review marking.
//!
//! Native text is authoritative when available (zero transcription risk);
//! OCR is trusted only above an empirically set confidence floor; below
//! that floor the system refuses to guess. This is the root of the
//! "abstain rather than invent" principle propagating through the core.
//!
//! The `reason` string on every decision embeds the literal numeric
//! comparisons ("chars=180 < 200"). That is an auditability contract, not
//! cosmetic: a reviewing officer must be able to reconstruct the decision
//! from the reason alone.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::GateConfig;
use crate::pipeline::evidence::{EvidenceError, OcrBackend, SourceMethod, TextBackend};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Extraction method decided by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidedMethod {
    /// Embedded text layer is adequate; no transcription involved.
    NativeText,
    /// OCR output clears the confidence and word-count floors.
    OcrEngine,
    /// Neither source is trustworthy; a human must transcribe.
    ManualFallback,
}

impl DecidedMethod {
    /// The source method recorded on evidence produced under this decision.
    pub fn source_method(self) -> SourceMethod {
        match self {
            Self::NativeText => SourceMethod::NativeText,
            Self::OcrEngine => SourceMethod::OcrEngineA,
            Self::ManualFallback => SourceMethod::Manual,
        }
    }
}

impl fmt::Display for DecidedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NativeText => write!(f, "native_text"),
            Self::OcrEngine => write!(f, "ocr_engine"),
            Self::ManualFallback => write!(f, "manual_fallback"),
        }
    }
}

/// Measured values the decision was compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateMetrics {
    pub chars: usize,
    pub words: usize,
    /// Mean OCR confidence over sampled pages; `None` when no engine
    /// reported one.
    pub confidence: Option<f32>,
}

/// Outcome of the gate for one document. "Failure" is a first-class,
/// inspectable value here, never an exception or a magic `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionDecision {
    pub method: DecidedMethod,
    /// Human-readable reason citing the exact metric values compared.
    pub reason: String,
    /// Metrics of the attempt that decided the outcome.
    pub metrics: GateMetrics,
    pub pages_sampled: usize,
}

// ═══════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════

/// Decide the extraction method for a document by probing `sample_pages`.
///
/// Never returns an error: an unreadable or corrupt document yields
/// `ManualFallback` with `reason = "unreadable: <error class>"`. A hard
/// failure to classify is itself a valid, reportable outcome — never a
/// crash that loses the case.
pub fn decide_extraction_method(
    text: &dyn TextBackend,
    ocr: &dyn OcrBackend,
    cfg: &GateConfig,
) -> ExtractionDecision {
    let page_count = match text.page_count() {
        Ok(n) => n,
        Err(e) => return unreadable_decision(&e, cfg.sample_pages),
    };
    if page_count == 0 {
        return unreadable_decision(&EvidenceError::Corrupt("zero pages".into()), 0);
    }

    let pages_sampled = cfg.sample_pages.min(page_count as usize);

    // Probe 1: native text layer.
    let native = sample_native(text, pages_sampled);
    let native_ok = native.chars >= cfg.direct_text_min_chars
        && native.words >= cfg.direct_text_min_words;

    if native_ok {
        let reason = format!(
            "native text accepted: chars={} >= {}, words={} >= {}",
            native.chars, cfg.direct_text_min_chars, native.words, cfg.direct_text_min_words
        );
        return log_and_build(DecidedMethod::NativeText, reason, native, pages_sampled);
    }
    let native_rejected = native_rejection(&native, cfg);

    // Probe 2: OCR on the same sample.
    let ocr_metrics = match sample_ocr(ocr, pages_sampled) {
        Ok(m) => m,
        Err(e) => {
            let reason = format!("unreadable: {} ({native_rejected})", e.class());
            return log_and_build(DecidedMethod::ManualFallback, reason, native, pages_sampled);
        }
    };

    match ocr_metrics.confidence {
        Some(conf) if conf >= cfg.ocr_min_confidence => {
            if ocr_metrics.words >= cfg.ocr_min_words {
                let reason = format!(
                    "ocr accepted: confidence={conf:.2} >= {:.2}, words={} >= {} ({native_rejected})",
                    cfg.ocr_min_confidence, ocr_metrics.words, cfg.ocr_min_words
                );
                log_and_build(DecidedMethod::OcrEngine, reason, ocr_metrics, pages_sampled)
            } else {
                let reason = format!(
                    "manual fallback: ocr words={} < {} ({native_rejected})",
                    ocr_metrics.words, cfg.ocr_min_words
                );
                log_and_build(DecidedMethod::ManualFallback, reason, ocr_metrics, pages_sampled)
            }
        }
        Some(conf) => {
            let reason = format!(
                "manual fallback: ocr confidence={conf:.2} < {:.2} ({native_rejected})",
                cfg.ocr_min_confidence
            );
            log_and_build(DecidedMethod::ManualFallback, reason, ocr_metrics, pages_sampled)
        }
        None => {
            let reason = format!("manual fallback: ocr confidence unavailable ({native_rejected})");
            log_and_build(DecidedMethod::ManualFallback, reason, ocr_metrics, pages_sampled)
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Sampling
// ═══════════════════════════════════════════════════════════

/// Accumulate native-text metrics over the sampled page prefix.
///
/// A page the backend cannot read contributes zero text: partial
/// readability is reflected in the counts, not surfaced as an error.
fn sample_native(text: &dyn TextBackend, pages: usize) -> GateMetrics {
    let mut chars = 0;
    let mut words = 0;
    for page in 1..=pages as u32 {
        match text.extract_page(page) {
            Ok(result) => {
                chars += result.char_count;
                words += result.word_count;
            }
            Err(e) => {
                tracing::debug!(page, error = %e, "gate: native probe failed for page");
            }
        }
    }
    GateMetrics { chars, words, confidence: None }
}

/// Accumulate OCR metrics over the sampled page prefix.
///
/// Confidence is the mean over pages that reported one. Errors on every
/// sampled page propagate (the document is unreadable to the engine);
/// partial errors contribute nothing.
fn sample_ocr(ocr: &dyn OcrBackend, pages: usize) -> Result<GateMetrics, EvidenceError> {
    let mut chars = 0;
    let mut words = 0;
    let mut confidences = Vec::new();
    let mut last_error = None;
    let mut any_ok = false;

    for page in 1..=pages as u32 {
        match ocr.ocr_page(page) {
            Ok(result) => {
                any_ok = true;
                chars += result.char_count;
                words += result.word_count;
                if let Some(c) = result.confidence {
                    confidences.push(c);
                }
            }
            Err(e) => {
                tracing::debug!(page, error = %e, "gate: ocr probe failed for page");
                last_error = Some(e);
            }
        }
    }

    if !any_ok {
        return Err(last_error.unwrap_or_else(|| EvidenceError::Engine("no pages sampled".into())));
    }

    let confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
    };

    Ok(GateMetrics { chars, words, confidence })
}

// ═══════════════════════════════════════════════════════════
// Reason assembly
// ═══════════════════════════════════════════════════════════

/// The failing native comparisons, in threshold order.
fn native_rejection(native: &GateMetrics, cfg: &GateConfig) -> String {
    let mut failed = Vec::new();
    if native.chars < cfg.direct_text_min_chars {
        failed.push(format!("chars={} < {}", native.chars, cfg.direct_text_min_chars));
    }
    if native.words < cfg.direct_text_min_words {
        failed.push(format!("words={} < {}", native.words, cfg.direct_text_min_words));
    }
    format!("native rejected: {}", failed.join(", "))
}

fn unreadable_decision(error: &EvidenceError, pages_sampled: usize) -> ExtractionDecision {
    let decision = ExtractionDecision {
        method: DecidedMethod::ManualFallback,
        reason: format!("unreadable: {}", error.class()),
        metrics: GateMetrics { chars: 0, words: 0, confidence: None },
        pages_sampled,
    };
    tracing::warn!(
        method = %decision.method,
        reason = %decision.reason,
        "gate: document unreadable"
    );
    decision
}

fn log_and_build(
    method: DecidedMethod,
    reason: String,
    metrics: GateMetrics,
    pages_sampled: usize,
) -> ExtractionDecision {
    tracing::info!(
        method = %method,
        chars = metrics.chars,
        words = metrics.words,
        confidence = ?metrics.confidence,
        pages_sampled,
        reason = %reason,
        "gate: extraction method decided"
    );
    ExtractionDecision { method, reason, metrics, pages_sampled }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::evidence::ExtractionBackendResult;

    /// Text backend serving the same page text for every page.
    struct FakeText {
        pages: u32,
        page_text: String,
        fail: bool,
    }

    impl TextBackend for FakeText {
        fn page_count(&self) -> Result<u32, EvidenceError> {
            if self.fail {
                Err(EvidenceError::Corrupt("bad xref table".into()))
            } else {
                Ok(self.pages)
            }
        }

        fn extract_page(&self, page: u32) -> Result<ExtractionBackendResult, EvidenceError> {
            if page > self.pages {
                return Err(EvidenceError::PageOutOfRange(page));
            }
            Ok(ExtractionBackendResult::from_text(self.page_text.clone(), None, "pdf_text_layer"))
        }
    }

    /// OCR backend with a fixed confidence and per-page text.
    struct FakeOcr {
        page_text: String,
        confidence: Option<f32>,
        fail: bool,
    }

    impl OcrBackend for FakeOcr {
        fn engine_name(&self) -> &str {
            "tesseract"
        }

        fn ocr_page(&self, _page: u32) -> Result<ExtractionBackendResult, EvidenceError> {
            if self.fail {
                return Err(EvidenceError::Engine("engine crashed".into()));
            }
            Ok(ExtractionBackendResult::from_text(
                self.page_text.clone(),
                self.confidence,
                "tesseract",
            ))
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("wrd{i:03}")).collect::<Vec<_>>().join(" ")
    }

    fn one_page_cfg() -> GateConfig {
        GateConfig { sample_pages: 1, ..Default::default() }
    }

    // ── Native text path ────────────────────────────────────

    #[test]
    fn adequate_native_text_accepted() {
        // 45 words of 4-5 chars each: >= 200 chars, >= 30 words.
        let text = FakeText { pages: 1, page_text: words(45), fail: false };
        let ocr = FakeOcr { page_text: String::new(), confidence: None, fail: false };

        let d = decide_extraction_method(&text, &ocr, &one_page_cfg());

        assert_eq!(d.method, DecidedMethod::NativeText);
        assert_eq!(d.metrics.words, 45);
        assert!(d.metrics.chars >= 200);
        assert!(d.reason.contains(&format!("chars={} >= 200", d.metrics.chars)));
        assert!(d.reason.contains("words=45 >= 30"));
    }

    #[test]
    fn native_metrics_accumulate_across_sampled_pages() {
        // 20 words/page over 3 pages clears the 30-word floor only in aggregate.
        let text = FakeText {
            pages: 3,
            page_text: "palabra larga de prueba ".repeat(5).trim().to_string(),
            fail: false,
        };
        let ocr = FakeOcr { page_text: String::new(), confidence: None, fail: false };
        let cfg = GateConfig { sample_pages: 3, ..Default::default() };

        let d = decide_extraction_method(&text, &ocr, &cfg);

        assert_eq!(d.method, DecidedMethod::NativeText);
        assert_eq!(d.pages_sampled, 3);
        assert_eq!(d.metrics.words, 60);
    }

    // ── OCR path ────────────────────────────────────────────

    #[test]
    fn thin_native_text_falls_through_to_ocr() {
        let text = FakeText { pages: 1, page_text: "casi nada".into(), fail: false };
        let ocr = FakeOcr { page_text: words(25), confidence: Some(0.72), fail: false };

        let d = decide_extraction_method(&text, &ocr, &one_page_cfg());

        assert_eq!(d.method, DecidedMethod::OcrEngine);
        assert!(d.reason.contains("confidence=0.72 >= 0.60"));
        assert!(d.reason.contains("words=25 >= 20"));
        assert!(d.reason.contains("native rejected"));
    }

    #[test]
    fn low_ocr_confidence_forces_manual_fallback() {
        // Adequate word count does not rescue a failed confidence floor.
        let text = FakeText { pages: 1, page_text: "corto".into(), fail: false };
        let ocr = FakeOcr { page_text: words(25), confidence: Some(0.45), fail: false };

        let d = decide_extraction_method(&text, &ocr, &one_page_cfg());

        assert_eq!(d.method, DecidedMethod::ManualFallback);
        assert!(d.reason.contains("confidence=0.45 < 0.60"));
    }

    #[test]
    fn sparse_ocr_words_force_manual_fallback() {
        let text = FakeText { pages: 1, page_text: "corto".into(), fail: false };
        let ocr = FakeOcr { page_text: words(5), confidence: Some(0.90), fail: false };

        let d = decide_extraction_method(&text, &ocr, &one_page_cfg());

        assert_eq!(d.method, DecidedMethod::ManualFallback);
        assert!(d.reason.contains("words=5 < 20"));
    }

    #[test]
    fn missing_ocr_confidence_forces_manual_fallback() {
        let text = FakeText { pages: 1, page_text: "corto".into(), fail: false };
        let ocr = FakeOcr { page_text: words(25), confidence: None, fail: false };

        let d = decide_extraction_method(&text, &ocr, &one_page_cfg());

        assert_eq!(d.method, DecidedMethod::ManualFallback);
        assert!(d.reason.contains("confidence unavailable"));
    }

    // ── Unreadable documents ────────────────────────────────

    #[test]
    fn corrupt_document_never_panics() {
        let text = FakeText { pages: 0, page_text: String::new(), fail: true };
        let ocr = FakeOcr { page_text: String::new(), confidence: None, fail: true };

        let d = decide_extraction_method(&text, &ocr, &GateConfig::default());

        assert_eq!(d.method, DecidedMethod::ManualFallback);
        assert!(d.reason.starts_with("unreadable: corrupt"));
    }

    #[test]
    fn ocr_engine_failure_reports_error_class() {
        let text = FakeText { pages: 1, page_text: "corto".into(), fail: false };
        let ocr = FakeOcr { page_text: String::new(), confidence: None, fail: true };

        let d = decide_extraction_method(&text, &ocr, &one_page_cfg());

        assert_eq!(d.method, DecidedMethod::ManualFallback);
        assert!(d.reason.contains("unreadable: engine_failure"));
    }

    #[test]
    fn zero_page_document_is_manual_fallback() {
        let text = FakeText { pages: 0, page_text: String::new(), fail: false };
        let ocr = FakeOcr { page_text: String::new(), confidence: None, fail: false };

        let d = decide_extraction_method(&text, &ocr, &GateConfig::default());

        assert_eq!(d.method, DecidedMethod::ManualFallback);
        assert!(d.reason.starts_with("unreadable:"));
    }

    // ── Decision → source method ────────────────────────────

    #[test]
    fn decided_methods_map_to_source_methods() {
        assert_eq!(DecidedMethod::NativeText.source_method(), SourceMethod::NativeText);
        assert_eq!(DecidedMethod::OcrEngine.source_method(), SourceMethod::OcrEngineA);
        assert_eq!(DecidedMethod::ManualFallback.source_method(), SourceMethod::Manual);
    }

    #[test]
    fn decision_serializes() {
        let text = FakeText { pages: 1, page_text: words(45), fail: false };
        let ocr = FakeOcr { page_text: String::new(), confidence: None, fail: false };
        let d = decide_extraction_method(&text, &ocr, &one_page_cfg());

        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"native_text\""));
        assert!(json.contains("\"reason\""));
    }
}
