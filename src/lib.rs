//! Veedor — automated prior-control review of administrative expense
//! records (travel, petty cash, supplier payments) for a public-sector
//! institution.
//!
//! Every finding is backed by source file, page number, and literal
//! excerpt. When evidence is insufficient the engine abstains rather than
//! inventing a value; the abstention itself is a first-class, reportable
//! outcome. Single-process, local-only: no network services, no shared
//! mutable state across cases.

pub mod config;
pub mod pipeline;

pub use config::{GateConfig, RouterConfig};
pub use pipeline::{CaseEvaluation, CaseReport, PipelineError};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a host binary or test harness.
///
/// Honors `RUST_LOG`; defaults to `info` for this crate. Safe to call more
/// than once — later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("veedor=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
