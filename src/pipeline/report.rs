//! Read-only case result handed to the external Reporter.
//!
//! Rendering to Excel or any other human-facing format is entirely the
//! Reporter's concern; the core only guarantees the structured shape and
//! that a reviewing officer never sees an abstention as a system failure —
//! each field carries an explicit insufficient-evidence marker instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::checkpoint::CheckpointDecision;
use super::evidence::{EvidenceStatus, FieldEvidenceRecord};
use super::gate::ExtractionDecision;
use super::router::IntegrityVerdict;

/// The full structured result of one case evaluation. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub verdict: IntegrityVerdict,
    /// Every evidence record produced during evaluation, including
    /// superseded ones — the audit trail is complete by construction.
    pub records: Vec<FieldEvidenceRecord>,
    /// Per-document gate decisions, keyed by file id.
    pub extraction_decisions: BTreeMap<String, ExtractionDecision>,
    pub checkpoint: CheckpointDecision,
}

/// Per-field summary for the report front page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMarker {
    pub field_name: String,
    /// Best status any record achieved for this field.
    pub status: EvidenceStatus,
    /// True when no record for this field may support a finding — rendered
    /// as an explicit "insufficient evidence" marker, never as an error.
    pub insufficient_evidence: bool,
}

impl CaseReport {
    /// Derive one marker per distinct field, taking the best status across
    /// that field's records (a fallback re-extraction that succeeded
    /// clears the marker its abstained predecessor would have set).
    pub fn field_markers(&self) -> Vec<FieldMarker> {
        let mut best: BTreeMap<&str, EvidenceStatus> = BTreeMap::new();
        for record in &self.records {
            best.entry(record.field_name.as_str())
                .and_modify(|s| *s = (*s).min(record.status))
                .or_insert(record.status);
        }

        best.into_iter()
            .map(|(field_name, status)| FieldMarker {
                field_name: field_name.to_string(),
                status,
                insufficient_evidence: !status.may_support_finding(),
            })
            .collect()
    }
}
