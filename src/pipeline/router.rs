//! Confidence Router — aggregates field evidence and findings into a single
//! case-level [`IntegrityVerdict`].
//!
//! The router is the last line of defense: it re-validates every incoming
//! finding against the degradation invariant even when the finding was
//! constructed correctly elsewhere, trusting no upstream caller. A
//! degraded finding indicates an upstream bug, so it is logged at WARN and
//! emitted as an alertable audit event — but it never fails the case.
//!
//! The status→action mapping is fixed and deliberately not configurable
//! per case. Making it configurable would undermine the evidentiary
//! guarantee the whole system exists to provide.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RouterConfig;
use crate::pipeline::evidence::{EvidenceStatus, FieldEvidenceRecord};
use crate::pipeline::events::AuditEvent;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Severity of a finding. `Uncertain` is the forced destination of any
/// high-severity finding whose evidence does not hold up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Critical,
    Major,
    Minor,
    Informational,
    Uncertain,
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Informational => write!(f, "informational"),
            Self::Uncertain => write!(f, "uncertain"),
        }
    }
}

/// A structured observation about a case, severity-tagged and
/// evidence-linked. The `rule_id` is opaque to the core: the core enforces
/// the evidence contract, not rule semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Business rule that produced this finding (e.g. "VIAT-007").
    pub rule_id: String,
    pub severity: FindingSeverity,
    pub description: String,
    /// Ordered references to [`FieldEvidenceRecord`]s. Must be non-empty
    /// for `Critical`/`Major` — enforced here, not left to callers.
    pub supporting_evidence: Vec<Uuid>,
    /// Original severity when the router degraded this finding.
    pub degraded_from: Option<FindingSeverity>,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        severity: FindingSeverity,
        description: impl Into<String>,
        supporting_evidence: Vec<Uuid>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            description: description.into(),
            supporting_evidence,
            degraded_from: None,
        }
    }
}

/// Case-level aggregate trust status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    Ok,
    Warning,
    Critical,
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// What the pipeline does next with the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointAction {
    Continue,
    FlagForReview,
    Halt,
}

impl fmt::Display for CheckpointAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::FlagForReview => write!(f, "flag_for_review"),
            Self::Halt => write!(f, "halt"),
        }
    }
}

/// The case-level decision driving continue/flag/halt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityVerdict {
    pub case_id: Uuid,
    pub integrity_status: IntegrityStatus,
    pub action: CheckpointAction,
    pub contributing_findings: Vec<Finding>,
    pub evaluated_at: DateTime<Utc>,
}

impl IntegrityVerdict {
    /// Count of surviving (undegraded) findings at the given severity.
    pub fn count_severity(&self, severity: FindingSeverity) -> usize {
        self.contributing_findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

// ═══════════════════════════════════════════════════════════
// Routing
// ═══════════════════════════════════════════════════════════

/// Aggregate all evidence records and findings for one case into a verdict.
///
/// Absence of any evidence is never silently treated as success: an empty
/// `records` slice routes to `Warning`/`FlagForReview`, as does a case
/// where every field abstained.
pub fn route(
    case_id: Uuid,
    records: &[FieldEvidenceRecord],
    findings: Vec<Finding>,
    cfg: &RouterConfig,
) -> IntegrityVerdict {
    let by_id: HashMap<Uuid, &FieldEvidenceRecord> =
        records.iter().map(|r| (r.record_id, r)).collect();

    let findings: Vec<Finding> = findings
        .into_iter()
        .map(|f| enforce_degradation(case_id, f, &by_id))
        .collect();

    let integrity_status = aggregate_status(records, &findings, cfg);
    let action = action_for(integrity_status);

    let verdict = IntegrityVerdict {
        case_id,
        integrity_status,
        action,
        contributing_findings: findings,
        evaluated_at: Utc::now(),
    };

    tracing::info!(
        case_id = %case_id,
        integrity_status = %integrity_status,
        action = %action,
        findings = verdict.contributing_findings.len(),
        records = records.len(),
        "router: case routed"
    );
    AuditEvent::case_routed(&verdict).emit();

    verdict
}

/// Fixed status→action table. Critical ⇒ Halt, deterministically; there is
/// no per-case override of this mapping.
pub fn action_for(status: IntegrityStatus) -> CheckpointAction {
    match status {
        IntegrityStatus::Ok => CheckpointAction::Continue,
        IntegrityStatus::Warning => CheckpointAction::FlagForReview,
        IntegrityStatus::Critical => CheckpointAction::Halt,
    }
}

// ═══════════════════════════════════════════════════════════
// Degradation
// ═══════════════════════════════════════════════════════════

/// Why a high-severity finding could not stand.
enum DegradeCause {
    EmptyEvidence,
    UnresolvedReference(Uuid),
    NonAssertableEvidence(Uuid, EvidenceStatus),
    IncompleteProvenance(Uuid),
}

impl fmt::Display for DegradeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEvidence => write!(f, "no supporting evidence"),
            Self::UnresolvedReference(id) => write!(f, "evidence reference {id} not found"),
            Self::NonAssertableEvidence(id, status) => {
                write!(f, "evidence {id} has status {status}")
            }
            Self::IncompleteProvenance(id) => write!(f, "evidence {id} lacks file/page/snippet"),
        }
    }
}

/// Enforce the degradation invariant on one finding.
///
/// `Critical`/`Major` findings whose evidence set is empty, references an
/// unknown record, contains an `Abstained`/`Illegible` record, or rests on
/// incomplete provenance are degraded to `Uncertain` before surfacing.
fn enforce_degradation(
    case_id: Uuid,
    finding: Finding,
    by_id: &HashMap<Uuid, &FieldEvidenceRecord>,
) -> Finding {
    if !matches!(finding.severity, FindingSeverity::Critical | FindingSeverity::Major) {
        return finding;
    }

    let Some(cause) = degrade_cause(&finding, by_id) else {
        return finding;
    };

    tracing::warn!(
        case_id = %case_id,
        rule_id = %finding.rule_id,
        from = %finding.severity,
        cause = %cause,
        "router: finding degraded to uncertain"
    );
    AuditEvent::finding_degraded(case_id, &finding.rule_id, finding.severity, &cause.to_string())
        .emit();

    Finding {
        degraded_from: Some(finding.severity),
        severity: FindingSeverity::Uncertain,
        ..finding
    }
}

fn degrade_cause(
    finding: &Finding,
    by_id: &HashMap<Uuid, &FieldEvidenceRecord>,
) -> Option<DegradeCause> {
    if finding.supporting_evidence.is_empty() {
        return Some(DegradeCause::EmptyEvidence);
    }
    for id in &finding.supporting_evidence {
        let Some(record) = by_id.get(id) else {
            return Some(DegradeCause::UnresolvedReference(*id));
        };
        if !record.status.may_support_finding() {
            return Some(DegradeCause::NonAssertableEvidence(*id, record.status));
        }
        if !record.provenance.is_complete() {
            return Some(DegradeCause::IncompleteProvenance(*id));
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════
// Aggregation
// ═══════════════════════════════════════════════════════════

fn aggregate_status(
    records: &[FieldEvidenceRecord],
    findings: &[Finding],
    cfg: &RouterConfig,
) -> IntegrityStatus {
    // A valid, undegraded critical finding decides the case.
    if findings.iter().any(|f| f.severity == FindingSeverity::Critical) {
        return IntegrityStatus::Critical;
    }

    let major_present = findings.iter().any(|f| {
        f.severity == FindingSeverity::Major
            || matches!(
                f.degraded_from,
                Some(FindingSeverity::Major) | Some(FindingSeverity::Critical)
            )
    });
    if major_present {
        return IntegrityStatus::Warning;
    }

    // Absence of any evidence is itself noteworthy, never silently OK.
    if records.is_empty() {
        return IntegrityStatus::Warning;
    }
    if records.iter().all(|r| !r.status.may_support_finding()) {
        return IntegrityStatus::Warning;
    }

    if has_required_field_abstention(records, cfg) {
        return IntegrityStatus::Warning;
    }

    IntegrityStatus::Ok
}

/// A required field is satisfied only by at least one assertable record.
/// A required field with no record at all counts as an abstention: absent
/// evidence can never score better than present-but-abstained evidence.
fn has_required_field_abstention(records: &[FieldEvidenceRecord], cfg: &RouterConfig) -> bool {
    cfg.required_fields.iter().any(|field| {
        !records
            .iter()
            .any(|r| &r.field_name == field && r.status.may_support_finding())
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
