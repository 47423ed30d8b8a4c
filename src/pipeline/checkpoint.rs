//! Integrity Checkpoint — the single authorized gate that halts or
//! continues case processing.
//!
//! Intentionally thin: its value is architectural, a single named seam all
//! downstream consumers (report writers, business-rule engines) must pass
//! through before persisting a "final" result. One-shot per case
//! evaluation: `Pending → Checked` is the only transition and `Checked` is
//! terminal. If evidence changes, the case is re-evaluated from scratch,
//! not re-checked.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::AuditEvent;
use super::router::{CheckpointAction, FindingSeverity, IntegrityVerdict};
use super::PipelineError;

/// Checkpoint lifecycle. `Checked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointState {
    Pending,
    Checked,
}

/// The checkpoint's answer: may downstream processing proceed?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointDecision {
    pub proceed: bool,
    /// Echoes the verdict status and finding counts for operator visibility.
    pub reason: String,
}

/// One checkpoint per case evaluation.
#[derive(Debug)]
pub struct IntegrityCheckpoint {
    case_id: Uuid,
    state: CheckpointState,
}

impl IntegrityCheckpoint {
    pub fn new(case_id: Uuid) -> Self {
        Self { case_id, state: CheckpointState::Pending }
    }

    pub fn state(&self) -> CheckpointState {
        self.state
    }

    /// Consume the router's verdict and decide proceed/stop.
    ///
    /// Errors if this checkpoint was already checked: a case must be
    /// re-evaluated from scratch, never re-checked.
    pub fn check(&mut self, verdict: &IntegrityVerdict) -> Result<CheckpointDecision, PipelineError> {
        if self.state == CheckpointState::Checked {
            return Err(PipelineError::AlreadyChecked(self.case_id));
        }
        self.state = CheckpointState::Checked;

        let decision = CheckpointDecision {
            proceed: verdict.action != CheckpointAction::Halt,
            reason: format!(
                "integrity_status={}, critical={}, major={}, uncertain={}",
                verdict.integrity_status,
                verdict.count_severity(FindingSeverity::Critical),
                verdict.count_severity(FindingSeverity::Major),
                verdict.count_severity(FindingSeverity::Uncertain),
            ),
        };

        tracing::info!(
            case_id = %self.case_id,
            proceed = decision.proceed,
            reason = %decision.reason,
            "checkpoint: checked"
        );
        AuditEvent::checkpoint_checked(self.case_id, &decision).emit();

        Ok(decision)
    }

    /// Hook for a future human override of a HALT verdict.
    ///
    /// The governance protocol for overrides does not exist yet, so this
    /// logs the attempt and refuses. The seam exists so callers already
    /// have a named place to ask.
    pub fn override_halt(&self, operator: &str) -> Result<(), PipelineError> {
        tracing::warn!(
            case_id = %self.case_id,
            operator,
            "checkpoint: halt override requested but no override protocol exists"
        );
        Err(PipelineError::OverrideUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::pipeline::router::route;

    fn verdict_for_empty_case(case_id: Uuid) -> IntegrityVerdict {
        route(case_id, &[], vec![], &RouterConfig::default())
    }

    #[test]
    fn starts_pending() {
        let cp = IntegrityCheckpoint::new(Uuid::new_v4());
        assert_eq!(cp.state(), CheckpointState::Pending);
    }

    #[test]
    fn check_transitions_to_checked() {
        let case_id = Uuid::new_v4();
        let mut cp = IntegrityCheckpoint::new(case_id);
        let verdict = verdict_for_empty_case(case_id);

        let decision = cp.check(&verdict).unwrap();
        assert_eq!(cp.state(), CheckpointState::Checked);
        // Empty case routes to Warning/FlagForReview: flagged but not halted.
        assert!(decision.proceed);
        assert!(decision.reason.contains("integrity_status=warning"));
    }

    #[test]
    fn halt_verdict_stops_processing() {
        let case_id = Uuid::new_v4();
        let mut verdict = verdict_for_empty_case(case_id);
        verdict.integrity_status = crate::pipeline::router::IntegrityStatus::Critical;
        verdict.action = CheckpointAction::Halt;

        let mut cp = IntegrityCheckpoint::new(case_id);
        let decision = cp.check(&verdict).unwrap();
        assert!(!decision.proceed);
        assert!(decision.reason.contains("integrity_status=critical"));
    }

    #[test]
    fn second_check_is_an_error() {
        let case_id = Uuid::new_v4();
        let mut cp = IntegrityCheckpoint::new(case_id);
        let verdict = verdict_for_empty_case(case_id);

        cp.check(&verdict).unwrap();
        let second = cp.check(&verdict);
        assert!(matches!(second, Err(PipelineError::AlreadyChecked(id)) if id == case_id));
        assert_eq!(cp.state(), CheckpointState::Checked);
    }

    #[test]
    fn override_halt_is_refused() {
        let cp = IntegrityCheckpoint::new(Uuid::new_v4());
        assert!(matches!(
            cp.override_halt("revisor.principal"),
            Err(PipelineError::OverrideUnsupported)
        ));
    }
}
