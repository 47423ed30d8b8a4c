//! Case evaluation orchestrator — the strict sequential chain
//! Gate → Classifier → Router → Checkpoint for one case.
//!
//! Each case's data is private to its evaluation: the orchestrator holds
//! no shared mutable state and takes no locks, so a host batch runner may
//! evaluate cases in parallel freely. Within one case the stage order is a
//! hard dependency chain — the router needs complete classification of all
//! fields before it can aggregate.
//!
//! An aborted evaluation never reaches the Checked state and surfaces no
//! partial finding as final.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::config::{GateConfig, RouterConfig};
use crate::pipeline::checkpoint::IntegrityCheckpoint;
use crate::pipeline::classifier::build_record;
use crate::pipeline::diagnostic;
use crate::pipeline::events::AuditEvent;
use crate::pipeline::evidence::{
    FieldEvidenceRecord, OcrBackend, Provenance, SourceMethod, TextBackend,
};
use crate::pipeline::gate::decide_extraction_method;
use crate::pipeline::report::CaseReport;
use crate::pipeline::router::{route, Finding};
use crate::pipeline::PipelineError;

/// One source document of a case, with its extraction backends.
///
/// `file_id` is the content-addressed identifier issued by the custody
/// module; the core treats it as opaque.
pub struct CaseDocument<'a> {
    pub file_id: String,
    pub text: &'a dyn TextBackend,
    pub ocr: &'a dyn OcrBackend,
}

/// One field-level extraction attempt awaiting classification.
///
/// Produced by the (excluded) field parsers downstream of the gate; the
/// orchestrator turns each attempt into an immutable evidence record.
#[derive(Debug, Clone)]
pub struct FieldAttempt {
    pub field_name: String,
    pub raw_value: Option<String>,
    pub source_method: SourceMethod,
    pub confidence: Option<f32>,
    pub provenance: Provenance,
}

/// The business-rule engine is an excluded collaborator: it consumes the
/// classified records and returns severity-tagged findings. The core
/// enforces its evidence contract in the router, never its rule semantics.
pub trait RuleEngine {
    fn evaluate_rules(&self, records: &[FieldEvidenceRecord]) -> Vec<Finding>;
}

/// A rule engine that raises nothing. Useful for evidence-only runs.
pub struct NoRules;

impl RuleEngine for NoRules {
    fn evaluate_rules(&self, _records: &[FieldEvidenceRecord]) -> Vec<Finding> {
        Vec::new()
    }
}

/// Evaluates one case end to end. Stateless across cases.
pub struct CaseEvaluation {
    case_id: Uuid,
    gate_cfg: GateConfig,
    router_cfg: RouterConfig,
}

impl CaseEvaluation {
    /// Validates both configs up front: malformed thresholds abort the
    /// evaluation here, before any finding exists. Silently defaulting a
    /// threshold would silently weaken the evidentiary guarantee.
    pub fn new(
        case_id: Uuid,
        gate_cfg: GateConfig,
        router_cfg: RouterConfig,
    ) -> Result<Self, PipelineError> {
        gate_cfg.validate()?;
        router_cfg.validate()?;
        Ok(Self { case_id, gate_cfg, router_cfg })
    }

    pub fn case_id(&self) -> Uuid {
        self.case_id
    }

    /// Run the full chain and hand back the read-only report.
    pub fn evaluate(
        &self,
        documents: &[CaseDocument<'_>],
        attempts: Vec<FieldAttempt>,
        rules: &dyn RuleEngine,
    ) -> Result<CaseReport, PipelineError> {
        tracing::info!(
            case_id = %self.case_id,
            documents = documents.len(),
            attempts = attempts.len(),
            "orchestrator: case evaluation started"
        );
        let dump_dir = diagnostic::dump_dir_for(&self.case_id);

        // Stage 1: gate each document.
        let mut extraction_decisions = BTreeMap::new();
        for doc in documents {
            let decision = decide_extraction_method(doc.text, doc.ocr, &self.gate_cfg);
            AuditEvent::extraction_decision(self.case_id, &doc.file_id, &decision).emit();
            extraction_decisions.insert(doc.file_id.clone(), decision);
        }
        if let Some(dir) = &dump_dir {
            diagnostic::dump_json(dir, "01-extraction-decisions.json", &extraction_decisions);
        }

        // Stage 2: classify every field attempt into an immutable record.
        let records: Vec<_> = attempts
            .into_iter()
            .map(|attempt| {
                let floor = self.router_cfg.floor_for(&attempt.field_name);
                let record = build_record(
                    attempt.field_name,
                    attempt.raw_value,
                    attempt.source_method,
                    attempt.confidence,
                    attempt.provenance,
                    floor,
                );
                AuditEvent::field_classified(
                    self.case_id,
                    &record.field_name,
                    record.record_id,
                    &record.status.to_string(),
                )
                .emit();
                record
            })
            .collect();
        if let Some(dir) = &dump_dir {
            diagnostic::dump_json(dir, "02-records.json", &records);
        }

        // Stage 3: business rules see the classified records, then the
        // router re-validates whatever they claim.
        let findings = rules.evaluate_rules(&records);
        let verdict = route(self.case_id, &records, findings, &self.router_cfg);
        if let Some(dir) = &dump_dir {
            diagnostic::dump_json(dir, "03-verdict.json", &verdict);
        }

        // Stage 4: the checkpoint is the only component authorized to
        // stop downstream processing.
        let mut checkpoint = IntegrityCheckpoint::new(self.case_id);
        let decision = checkpoint.check(&verdict)?;
        if let Some(dir) = &dump_dir {
            diagnostic::dump_json(dir, "04-checkpoint.json", &decision);
        }

        tracing::info!(
            case_id = %self.case_id,
            proceed = decision.proceed,
            "orchestrator: case evaluation complete"
        );

        Ok(CaseReport { verdict, records, extraction_decisions, checkpoint: decision })
    }
}
