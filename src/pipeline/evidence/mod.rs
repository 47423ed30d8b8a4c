//! Field-level evidence: records, provenance, and the uniform backend
//! contract behind which concrete OCR/text engines are swapped.

pub mod snippet;
pub mod types;

pub use snippet::{sanitize_snippet, MAX_SNIPPET_CHARS};
pub use types::*;

use thiserror::Error;

/// Errors raised by extraction backends at the adapter boundary.
///
/// The core absorbs these: a backend failure during gating becomes a
/// manual-fallback decision, never a crash that loses the case.
#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("document unreadable: {0}")]
    Unreadable(String),

    #[error("document corrupt: {0}")]
    Corrupt(String),

    #[error("page {0} out of range")]
    PageOutOfRange(u32),

    #[error("engine failure: {0}")]
    Engine(String),
}

impl EvidenceError {
    /// Short error class embedded in gate reason strings
    /// (`"unreadable: corrupt"`).
    pub fn class(&self) -> &'static str {
        match self {
            Self::Unreadable(_) => "unreadable",
            Self::Corrupt(_) => "corrupt",
            Self::PageOutOfRange(_) => "page_out_of_range",
            Self::Engine(_) => "engine_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes_are_stable() {
        assert_eq!(EvidenceError::Unreadable("x".into()).class(), "unreadable");
        assert_eq!(EvidenceError::Corrupt("x".into()).class(), "corrupt");
        assert_eq!(EvidenceError::PageOutOfRange(9).class(), "page_out_of_range");
        assert_eq!(EvidenceError::Engine("x".into()).class(), "engine_failure");
    }
}
