//! Structured audit events for every pipeline transition.
//!
//! The core defines the event *shape* and emits each event once through
//! `tracing`; storage, JSONL encoding, and rotation belong to the excluded
//! logger. Every event carries the case-scoped correlation id so a
//! reviewing engineer can reconstruct one case's full decision trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::checkpoint::CheckpointDecision;
use super::gate::ExtractionDecision;
use super::router::{FindingSeverity, IntegrityVerdict};

/// Pipeline transitions that produce exactly one audit event each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ExtractionDecision,
    FieldClassified,
    CaseRouted,
    CheckpointChecked,
    /// Category-4 invariant violation, self-healed by degradation.
    /// Alertable for engineering follow-up, not a user error.
    FindingDegraded,
}

/// One structured audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: EventType,
    pub case_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl AuditEvent {
    pub fn new(event_type: EventType, case_id: Uuid, payload: serde_json::Value) -> Self {
        Self { event_type, case_id, timestamp: Utc::now(), payload }
    }

    pub fn extraction_decision(case_id: Uuid, file_id: &str, decision: &ExtractionDecision) -> Self {
        Self::new(
            EventType::ExtractionDecision,
            case_id,
            json!({
                "file_id": file_id,
                "method": decision.method,
                "reason": decision.reason,
                "metrics": decision.metrics,
                "pages_sampled": decision.pages_sampled,
            }),
        )
    }

    pub fn field_classified(case_id: Uuid, field_name: &str, record_id: Uuid, status: &str) -> Self {
        Self::new(
            EventType::FieldClassified,
            case_id,
            json!({
                "field_name": field_name,
                "record_id": record_id,
                "status": status,
            }),
        )
    }

    pub fn case_routed(verdict: &IntegrityVerdict) -> Self {
        Self::new(
            EventType::CaseRouted,
            verdict.case_id,
            json!({
                "integrity_status": verdict.integrity_status,
                "action": verdict.action,
                "findings": verdict.contributing_findings.len(),
            }),
        )
    }

    pub fn checkpoint_checked(case_id: Uuid, decision: &CheckpointDecision) -> Self {
        Self::new(
            EventType::CheckpointChecked,
            case_id,
            json!({
                "proceed": decision.proceed,
                "reason": decision.reason,
            }),
        )
    }

    pub fn finding_degraded(
        case_id: Uuid,
        rule_id: &str,
        from: FindingSeverity,
        cause: &str,
    ) -> Self {
        Self::new(
            EventType::FindingDegraded,
            case_id,
            json!({
                "rule_id": rule_id,
                "degraded_from": from,
                "cause": cause,
            }),
        )
    }

    /// Emit the event through `tracing`. One call per transition.
    pub fn emit(&self) {
        tracing::info!(
            target: "veedor::audit",
            event_type = ?self.event_type,
            case_id = %self.case_id,
            timestamp = %self.timestamp,
            payload = %self.payload,
            "audit event"
        );
    }
}
