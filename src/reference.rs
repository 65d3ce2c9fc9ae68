//! Reference boundary labels from gold spans.
//!
//! Each gold span marks its first token as a start and its last token
//! (`end - 1`) as an end:
//!
//! ```text
//! doc:    t0  t1  t2  t3  t4
//! gold:      [t1  t2)
//!
//! rows:  (0,0) (1,0) (0,1) (0,0) (0,0)
//! ```
//!
//! A token can be both a start and an end, of one single-token span or of
//! two different spans.
//!
//! Rows are emitted document by document, token by token. The matrix is only
//! meaningful next to a score matrix built from the same documents in the
//! same order.

use std::collections::HashSet;

use ndarray::Array2;

use crate::Doc;

/// Build a `(total_tokens × 2)` matrix of 0/1 boundary labels.
///
/// Documents without a group under `reference_key` contribute all-zero rows.
/// Empty spans mark nothing.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(docs)))]
pub fn reference_labels<'a, I>(docs: I, reference_key: &str) -> Array2<f32>
where
    I: IntoIterator<Item = &'a Doc>,
{
    let mut rows: Vec<[f32; 2]> = Vec::new();

    for doc in docs {
        let mut starts = HashSet::new();
        let mut ends = HashSet::new();

        if let Some(group) = doc.spans(reference_key) {
            for span in group.iter().filter(|s| !s.is_empty()) {
                starts.insert(span.start);
                ends.insert(span.last());
            }
        }

        for token in doc.tokens() {
            rows.push([
                if starts.contains(&token.i) { 1.0 } else { 0.0 },
                if ends.contains(&token.i) { 1.0 } else { 0.0 },
            ]);
        }
    }

    Array2::from(rows)
}
