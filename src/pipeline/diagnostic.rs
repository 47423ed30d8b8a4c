//! Pipeline diagnostic dump — writes intermediate artifacts to disk.
//!
//! Enables inspection of every pipeline stage for one case: gate
//! decisions, classified records, the routed verdict, the checkpoint
//! decision.
//!
//! **Activation**: disabled unless the `VEEDOR_DUMP_DIR` env var is set.
//!
//! **Output structure**:
//! ```text
//! {dump_dir}/{case_id}/
//!   01-extraction-decisions.json
//!   02-records.json
//!   03-verdict.json
//!   04-checkpoint.json
//! ```

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Env var naming the dump base directory.
const DUMP_DIR_ENV: &str = "VEEDOR_DUMP_DIR";

/// Returns the dump directory for a case, or `None` if diagnostics are
/// disabled.
///
/// Creates the directory tree on first call. Returns `None` (with a
/// warning) if directory creation fails — never panics, never blocks the
/// pipeline.
pub fn dump_dir_for(case_id: &Uuid) -> Option<PathBuf> {
    let base = std::env::var(DUMP_DIR_ENV).ok()?;
    let dir = PathBuf::from(base).join(case_id.to_string());

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            path = %dir.display(),
            error = %e,
            "diagnostic dump: failed to create directory"
        );
        return None;
    }

    Some(dir)
}

/// Write a JSON artifact (any serde-serializable value).
///
/// Uses pretty-printing for human readability. Never panics.
pub fn dump_json<T: serde::Serialize>(dir: &Path, filename: &str, value: &T) {
    let path = dir.join(filename);
    match serde_json::to_string_pretty(value) {
        Ok(json) => match std::fs::write(&path, json.as_bytes()) {
            Ok(()) => tracing::debug!(
                path = %path.display(),
                size = json.len(),
                "diagnostic dump: JSON written"
            ),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "diagnostic dump: failed to write JSON"
            ),
        },
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "diagnostic dump: failed to serialize JSON"
        ),
    }
}
