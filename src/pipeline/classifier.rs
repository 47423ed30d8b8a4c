//! Abstention Classifier — converts a raw extraction result into a governed
//! [`EvidenceStatus`].
//!
//! This is the single choke point enforcing "never fabricate": any caller
//! that needs to treat a field as ground truth goes through `classify`
//! first. The function is pure and total — malformed input maps to
//! `Abstained`/`Illegible`, it never panics and never errors.

use chrono::Utc;
use uuid::Uuid;

use crate::pipeline::evidence::{EvidenceStatus, FieldEvidenceRecord, Provenance, SourceMethod};

/// Classify one extraction result. Decision table, evaluated top-down,
/// first match wins:
///
/// 1. empty/`None` raw value → `Illegible`
/// 2. incomplete provenance → `Abstained` (regardless of confidence —
///    evidentiary weight cannot be asserted without file, page, excerpt)
/// 3. absent confidence → `Abstained`
/// 4. confidence below the field-type floor → `LowConfidence`
/// 5. otherwise → `Ok`
///
/// A confidence outside [0.0, 1.0] or NaN is treated as absent: a
/// malformed backend value must never pass a floor comparison by accident.
pub fn classify(
    raw_value: Option<&str>,
    confidence: Option<f32>,
    provenance: &Provenance,
    floor: f32,
) -> EvidenceStatus {
    match raw_value {
        None => return EvidenceStatus::Illegible,
        Some(v) if v.trim().is_empty() => return EvidenceStatus::Illegible,
        Some(_) => {}
    }

    if !provenance.is_complete() {
        return EvidenceStatus::Abstained;
    }

    let confidence = match confidence {
        Some(c) if c.is_finite() && (0.0..=1.0).contains(&c) => c,
        _ => return EvidenceStatus::Abstained,
    };

    if confidence < floor {
        EvidenceStatus::LowConfidence
    } else {
        EvidenceStatus::Ok
    }
}

/// Build a classified evidence record from one extraction attempt.
///
/// The record is immutable after creation; its status is computed here and
/// never recomputed in place.
pub fn build_record(
    field_name: impl Into<String>,
    raw_value: Option<String>,
    source_method: SourceMethod,
    confidence: Option<f32>,
    provenance: Provenance,
    floor: f32,
) -> FieldEvidenceRecord {
    let field_name = field_name.into();
    let status = classify(raw_value.as_deref(), confidence, &provenance, floor);

    tracing::debug!(
        field = %field_name,
        status = %status,
        confidence = ?confidence,
        floor,
        source = %source_method,
        "classifier: field classified"
    );

    FieldEvidenceRecord {
        record_id: Uuid::new_v4(),
        field_name,
        raw_value,
        source_method,
        confidence,
        provenance,
        status,
        extracted_at: Utc::now(),
        supersedes: None,
    }
}

/// Build a record for a fallback re-extraction of the same field.
///
/// The prior record is retained for audit; the new record points back at
/// it via `supersedes`. Nothing is overwritten in place.
pub fn build_superseding_record(
    prior: &FieldEvidenceRecord,
    raw_value: Option<String>,
    source_method: SourceMethod,
    confidence: Option<f32>,
    provenance: Provenance,
    floor: f32,
) -> FieldEvidenceRecord {
    let mut record = build_record(
        prior.field_name.clone(),
        raw_value,
        source_method,
        confidence,
        provenance,
        floor,
    );
    record.supersedes = Some(prior.record_id);
    record
}
