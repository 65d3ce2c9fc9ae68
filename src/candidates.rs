//! Candidate spans from boundary scores.
//!
//! ## How It Works
//!
//! Threshold the start and end columns independently, then pair every start
//! with every end that does not precede it:
//!
//! ```text
//! threshold = 0.5
//!
//! token:   0     1     2     3
//! start:  0.9   0.1   0.7   0.2     starts = {0, 2}
//! end:    0.2   0.8   0.1   0.6     ends   = {1, 3}
//!
//! pairs:  (0,1) → [0,2)   len 2
//!         (0,3) → [0,4)   len 4
//!         (2,1) → skip    len 0
//!         (2,3) → [2,4)   len 2
//! ```
//!
//! The result is a candidate set, not a segmentation: nested and overlapping
//! spans are all kept, in `(start, end)` ascending order.

use ndarray::ArrayView2;

use crate::{Doc, Error, LengthBounds, Result, Span, SpanGroup};

/// Token indices whose score in `column` is at least `threshold`, ascending.
///
/// Scores outside `[0, 1]` are fine; only their order relative to the
/// threshold matters.
#[must_use]
pub fn boundary_indices(scores: ArrayView2<'_, f32>, column: usize, threshold: f32) -> Vec<usize> {
    scores
        .column(column)
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p >= threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Pair starts with ends into spans admitted by `bounds`.
///
/// Every start is tried against every end, so neither slice needs to be
/// sorted. Spans come out grouped by start, in the order of `starts`, then in
/// the order of `ends`.
#[must_use]
pub fn pair_boundaries(starts: &[usize], ends: &[usize], bounds: LengthBounds) -> SpanGroup {
    let mut group = SpanGroup::new();
    for &start in starts {
        for &end in ends {
            // end before start
            if end < start {
                continue;
            }
            if bounds.admits(end + 1 - start) {
                group.push(Span::new(start, end + 1));
            }
        }
    }
    group
}

/// Candidate spans for one document's scores.
///
/// `scores` has one row per token and columns `(start, end)`.
#[must_use]
pub fn candidate_spans(scores: ArrayView2<'_, f32>, threshold: f32, bounds: LengthBounds) -> SpanGroup {
    let starts = boundary_indices(scores, 0, threshold);
    let ends = boundary_indices(scores, 1, threshold);
    pair_boundaries(&starts, &ends, bounds)
}

/// Write candidates for `doc` under `key`, replacing whatever was there.
///
/// The group is always written, empty if no span qualifies.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] unless `scores` is `doc.len() × 2`.
pub fn set_candidates(
    doc: &mut Doc,
    scores: ArrayView2<'_, f32>,
    key: &str,
    threshold: f32,
    bounds: LengthBounds,
) -> Result<()> {
    if scores.dim() != (doc.len(), 2) {
        return Err(Error::ShapeMismatch {
            expected: (doc.len(), 2),
            actual: scores.dim(),
        });
    }
    let group = candidate_spans(scores, threshold, bounds);
    doc.set_spans(key, group)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ranges(group: &SpanGroup) -> Vec<(usize, usize)> {
        group.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn test_unbounded_pairs() {
        let group = pair_boundaries(&[0, 2], &[1, 3], LengthBounds::unbounded());
        assert_eq!(ranges(&group), vec![(0, 2), (0, 4), (2, 4)]);
    }

    #[test]
    fn test_max_length_filters() {
        let group = pair_boundaries(&[0, 2], &[1, 3], LengthBounds::new(0, 2));
        assert_eq!(ranges(&group), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_min_length_filters() {
        let group = pair_boundaries(&[0, 2], &[1, 3], LengthBounds::new(3, 0));
        assert_eq!(ranges(&group), vec![(0, 4)]);
    }

    #[test]
    fn test_single_token_span() {
        let group = pair_boundaries(&[2], &[2], LengthBounds::unbounded());
        assert_eq!(ranges(&group), vec![(2, 3)]);
    }

    #[test]
    fn test_empty_starts_or_ends() {
        assert!(pair_boundaries(&[], &[1, 2], LengthBounds::unbounded()).is_empty());
        assert!(pair_boundaries(&[0], &[], LengthBounds::unbounded()).is_empty());
    }

    #[test]
    fn test_unsorted_ends_are_all_tried() {
        let group = pair_boundaries(&[0], &[5, 1], LengthBounds::new(0, 2));
        assert_eq!(ranges(&group), vec![(0, 2)]);

        let group = pair_boundaries(&[2, 0], &[3, 1, 3], LengthBounds::unbounded());
        assert_eq!(ranges(&group), vec![(2, 4), (2, 4), (0, 4), (0, 2), (0, 4)]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let scores = array![[0.5_f32, 0.0], [0.0, 0.5]];
        let group = candidate_spans(scores.view(), 0.5, LengthBounds::unbounded());
        assert_eq!(ranges(&group), vec![(0, 2)]);
    }

    #[test]
    fn test_out_of_range_scores() {
        let scores = array![[7.0_f32, -3.0], [-1.0, 2.5]];
        assert_eq!(boundary_indices(scores.view(), 0, 0.3), vec![0]);
        assert_eq!(boundary_indices(scores.view(), 1, 0.3), vec![1]);
    }

    #[test]
    fn test_set_candidates_replaces_group() {
        let mut doc = Doc::from_words(&["a", "b", "c"]);
        doc.set_spans("cands", vec![Span::new(0, 3)]).unwrap();

        let scores = array![[0.0_f32, 0.0], [0.0, 0.0], [0.0, 0.0]];
        set_candidates(&mut doc, scores.view(), "cands", 0.3, LengthBounds::unbounded()).unwrap();

        assert!(doc.has_spans("cands"));
        assert!(doc.spans("cands").unwrap().is_empty());
    }

    #[test]
    fn test_set_candidates_shape_mismatch() {
        let mut doc = Doc::from_words(&["a", "b"]);
        let scores = array![[1.0_f32, 1.0]];
        let err = set_candidates(&mut doc, scores.view(), "k", 0.3, LengthBounds::unbounded());
        assert!(matches!(
            err,
            Err(Error::ShapeMismatch {
                expected: (2, 2),
                actual: (1, 2)
            })
        ));
    }
}
