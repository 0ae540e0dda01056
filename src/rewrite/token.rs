//! Substitution instructions over the original SQL text

use crate::parsing::Span;

/// An instruction to replace the byte range `[start, stop)` of the
/// original SQL text with a replacement string. A zero-width token
/// (`start == stop`) is an insertion.
///
/// Tokens contributed to one rewrite pass must be non-overlapping;
/// overlap is a decorator defect, checked when the token is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlToken {
    pub start: usize,
    pub stop: usize,
    pub replacement: String,
}

impl SqlToken {
    /// A token replacing the given span.
    pub fn replacing(span: Span, replacement: impl Into<String>) -> Self {
        SqlToken {
            start: span.start,
            stop: span.end,
            replacement: replacement.into(),
        }
    }

    /// A zero-width token inserting text at the given offset.
    pub fn inserting(at: usize, text: impl Into<String>) -> Self {
        SqlToken {
            start: at,
            stop: at,
            replacement: text.into(),
        }
    }

    /// Whether two tokens cover overlapping ranges. An insertion at the
    /// boundary of another token does not overlap it, but an insertion
    /// strictly inside a replaced range does. Insertions at the same
    /// offset are merged in registration order.
    pub fn overlaps(&self, other: &SqlToken) -> bool {
        self.start < other.stop && other.start < self.stop
    }
}
