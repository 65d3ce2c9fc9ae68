//! Training loss for boundary scores.
//!
//! ## The Loss
//!
//! A plain sum of squared errors against the 0/1 reference labels:
//!
//! ```text
//! d    = scores - reference
//! loss = Σ d²
//! grad = d
//! ```
//!
//! The sum is not divided by the batch size, so the loss of a batch grows
//! with its token count. The gradient handed to the model is `d` itself, not
//! `2d`. Both are part of the training dynamics the scorers are tuned for.

use ndarray::{Array2, ArrayView2};

use crate::{Error, Result};

/// Summed squared error and its gradient.
///
/// ```rust
/// use ndarray::array;
/// use spanfinder::squared_error;
///
/// let scores = array![[1.0_f32, 0.0], [0.0, 1.0]];
/// let reference = array![[1.0_f32, 0.0], [0.0, 0.0]];
///
/// let (loss, d_scores) = squared_error(scores.view(), reference.view()).unwrap();
/// assert_eq!(loss, 1.0);
/// assert_eq!(d_scores, array![[0.0, 0.0], [0.0, 1.0]]);
/// ```
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the two arrays differ in shape.
pub fn squared_error(
    scores: ArrayView2<'_, f32>,
    reference: ArrayView2<'_, f32>,
) -> Result<(f32, Array2<f32>)> {
    if scores.dim() != reference.dim() {
        return Err(Error::ShapeMismatch {
            expected: reference.dim(),
            actual: scores.dim(),
        });
    }

    let d_scores = &scores - &reference;
    let loss = d_scores.iter().map(|d| d * d).sum();
    Ok((loss, d_scores))
}
