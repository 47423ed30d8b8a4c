//! Literal-snippet sanitation and bounding.
//!
//! Provenance excerpts are stored verbatim-in-spirit but bounded and
//! stripped of control characters before they enter a record. Truncation
//! marks the snippet with a trailing ellipsis and never empties a
//! non-empty snippet.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum stored snippet length in characters (before the ellipsis).
pub const MAX_SNIPPET_CHARS: usize = 240;

/// C0/C1 control characters and DEL. Tab and newline are covered by the
/// whitespace collapse below, so they are excluded here.
static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Sanitize a literal excerpt for storage in a provenance record.
///
/// Strips control characters, collapses whitespace runs to a single space,
/// trims, and bounds the result to [`MAX_SNIPPET_CHARS`] characters.
pub fn sanitize_snippet(raw: &str) -> String {
    let stripped = CONTROL_CHARS.replace_all(raw, "");
    let collapsed = WHITESPACE_RUNS.replace_all(&stripped, " ");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() <= MAX_SNIPPET_CHARS {
        return trimmed.to_string();
    }

    let mut bounded: String = trimmed.chars().take(MAX_SNIPPET_CHARS).collect();
    // Avoid ending mid-word where possible; the excerpt stays literal up to
    // the cut point either way.
    if let Some(last_space) = bounded.rfind(' ') {
        if last_space > MAX_SNIPPET_CHARS / 2 {
            bounded.truncate(last_space);
        }
    }
    bounded.push('…');
    bounded
}
