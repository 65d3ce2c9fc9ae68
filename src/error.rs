//! Error types for spanfinder.

/// Errors that can occur while finding, labelling, or scoring spans.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two arrays that must be row-aligned have different shapes.
    ///
    /// Score and reference matrices are built from the same (document, token)
    /// traversal. A mismatch means that traversal was broken, so nothing is
    /// truncated or padded.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The shape implied by the batch (rows, columns).
        expected: (usize, usize),
        /// The shape that was supplied.
        actual: (usize, usize),
    },

    /// Threshold is not a finite value in `[0, 1]`.
    #[error("invalid threshold: {0} (must be within [0, 1])")]
    InvalidThreshold(f32),

    /// Both length bounds are set and `min > max`.
    #[error("min_length {min} exceeds max_length {max}")]
    InvalidLengthBounds {
        /// The minimum span length.
        min: usize,
        /// The maximum span length.
        max: usize,
    },

    /// A span covers no tokens (`end <= start`).
    #[error("span {start}..{end} is empty")]
    EmptySpan {
        /// Span start (inclusive).
        start: usize,
        /// Span end (exclusive).
        end: usize,
    },

    /// A span does not fit inside its document.
    #[error("span {start}..{end} out of bounds for document of {len} tokens")]
    SpanOutOfBounds {
        /// Span start (inclusive).
        start: usize,
        /// Span end (exclusive).
        end: usize,
        /// Number of tokens in the document.
        len: usize,
    },

    /// The wrapped span scorer failed.
    #[error("scorer error: {0}")]
    Scorer(String),
}

/// Result type for spanfinder operations.
pub type Result<T> = std::result::Result<T, Error>;
