//! The boundary-scoring model seam.
//!
//! Span finding is model-agnostic. Anything that maps a batch of documents to
//! one `(start, end)` score row per token, and can take a gradient back, can
//! drive a [`SpanFinder`](crate::SpanFinder).
//!
//! ```text
//! docs ──► BoundaryScorer::begin_update ──► scores  (n_tokens × 2)
//!                                   │
//!                                   └──► backprop(d_scores)   stages gradients
//!                                                  │
//!                          Optimizer::finish_update ◄┘          applies them
//! ```

use ndarray::Array2;

use crate::Doc;

/// Per-token boundary scores for a batch: one row per token, in document
/// order then token order, with columns `(start, end)`.
pub type ScoreMatrix = Array2<f32>;

/// Callback that takes the gradient of the loss w.r.t. the scores and stages
/// parameter updates on the model that produced them.
pub type Backprop<'a, S = ScoreMatrix> = Box<dyn FnOnce(&S) + 'a>;

/// A trainable model producing boundary scores.
///
/// This allows plugging in different backends; the span finder only ever
/// calls these three operations.
pub trait BoundaryScorer<S = ScoreMatrix> {
    /// Score a batch without recording anything for training.
    fn predict(&self, docs: &[&Doc]) -> S;

    /// Score a batch and return a callback for the backward pass.
    ///
    /// The callback borrows the model; it must be called (or dropped) before
    /// an optimizer can apply the staged updates.
    fn begin_update(&mut self, docs: &[&Doc]) -> (S, Backprop<'_, S>);

    /// Infer shapes and initialize parameters.
    ///
    /// `sample` holds representative documents and the target scores for
    /// them. With `None`, the model falls back to its default shapes.
    fn initialize(&mut self, sample: Option<(&[&Doc], &S)>);
}

/// Applies parameter updates staged by a [`Backprop`] callback.
pub trait Optimizer<M: ?Sized> {
    /// Apply and clear the pending updates on `model`.
    fn finish_update(&mut self, model: &mut M);
}
