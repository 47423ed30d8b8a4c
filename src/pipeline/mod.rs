//! The evidentiary confidence and abstention engine.
//!
//! Control/data flow for one case:
//! document → gate → field evidence records → classifier (per field) →
//! router (aggregate) → checkpoint (verdict) → external reporter.

pub mod checkpoint;
pub mod classifier;
pub mod diagnostic;
pub mod events;
pub mod evidence;
pub mod gate;
pub mod orchestrator;
pub mod report;
pub mod router;

pub use checkpoint::{CheckpointDecision, CheckpointState, IntegrityCheckpoint};
pub use classifier::{build_record, build_superseding_record, classify};
pub use events::{AuditEvent, EventType};
pub use gate::{decide_extraction_method, DecidedMethod, ExtractionDecision, GateMetrics};
pub use orchestrator::{CaseDocument, CaseEvaluation, FieldAttempt, NoRules, RuleEngine};
pub use report::{CaseReport, FieldMarker};
pub use router::{
    route, CheckpointAction, Finding, FindingSeverity, IntegrityStatus, IntegrityVerdict,
};

use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;

/// Errors that abort a case evaluation.
///
/// Deliberately narrow: extraction failure and evidence insufficiency are
/// absorbed into values (statuses, decisions), never raised. What remains
/// is malformed configuration and misuse of the one-shot checkpoint.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("checkpoint for case {0} was already checked; re-evaluate the case from scratch")]
    AlreadyChecked(Uuid),

    #[error("halt override requires an approval protocol that does not exist yet")]
    OverrideUnsupported,
}
