//! # spanfinder
//!
//! Span boundary detection: propose candidate spans from per-token start/end
//! scores, and train the scoring model against gold spans.
//!
//! ## The Problem
//!
//! Span classifiers (entity typing, span categorization) need a set of
//! candidate spans to classify. Enumerating every `(start, end)` pair is
//! quadratic in document length and almost entirely noise. A cheaper model
//! can instead score each token for "a span starts here" and "a span ends
//! here", and only spans between likely boundaries are proposed.
//!
//! ## Pipeline
//!
//! ```text
//! docs ──► BoundaryScorer ──► scores (one (start, end) row per token)
//!                                 │
//!              inference          │          training
//!         ┌───────────────────────┴───────────────────────┐
//!         ▼                                               ▼
//!  threshold + pair starts/ends              reference_labels(gold spans)
//!         │                                               │
//!         ▼                                               ▼
//!  doc.spans["span_candidates"]             squared_error ──► backprop
//! ```
//!
//! ## Candidate Generation
//!
//! Starts and ends are thresholded independently, then every start is paired
//! with every end at or after it:
//!
//! ```text
//! starts = {0, 2}   ends = {1, 3}
//!
//! [0,2)  [0,4)  [2,4)          (2,1) is skipped: ends before it starts
//! ```
//!
//! Overlapping and nested candidates are all kept; `min_length` and
//! `max_length` (0 = unbounded) prune the set.
//!
//! ## Training Signal
//!
//! Gold spans become 0/1 labels: the first token of each span is a start and
//! its last token (`end - 1`) is an end. The loss is the summed squared error
//! between scores and labels, and the gradient is `scores - labels`.
//!
//! ## Quick Start
//!
//! ```rust
//! use spanfinder::{candidate_spans, reference_labels, Doc, LengthBounds, Span};
//! use ndarray::array;
//!
//! // Candidates from one document's scores
//! let scores = array![[0.9_f32, 0.1], [0.2, 0.8], [0.7, 0.1], [0.1, 0.6]];
//! let spans = candidate_spans(scores.view(), 0.5, LengthBounds::new(0, 2));
//! let ranges: Vec<_> = spans.iter().map(Span::range).collect();
//! assert_eq!(ranges, vec![0..2, 2..4]);
//!
//! // Reference labels from gold spans
//! let mut doc = Doc::from_words(&["a", "b", "c", "d", "e"]);
//! doc.set_spans("sc", vec![Span::new(1, 3)]).unwrap();
//! let labels = reference_labels([&doc], "sc");
//! assert_eq!(labels.row(1).to_vec(), vec![1.0, 0.0]);
//! assert_eq!(labels.row(2).to_vec(), vec![0.0, 1.0]);
//! ```
//!
//! For the full component (batch prediction, training updates, evaluation),
//! see [`SpanFinder`].

mod candidates;
mod config;
mod doc;
mod error;
mod finder;
mod loss;
mod model;
mod reference;
mod scorer;
mod span;

pub use candidates::{boundary_indices, candidate_spans, pair_boundaries, set_candidates};
pub use config::{LengthBounds, SpanFinderConfig};
pub use doc::{Doc, Example, Token};
pub use error::{Error, Result};
pub use finder::{Losses, SpanFinder, INIT_SAMPLE_SIZE};
pub use loss::squared_error;
pub use model::{Backprop, BoundaryScorer, Optimizer, ScoreMatrix};
pub use reference::reference_labels;
pub use scorer::{
    default_score_weights, score_aligned, span_finder_options, span_finder_score, AnnotationCheck,
    OverlapScorer, PrfScore, ScoreSpansOptions, Scores, SpanGetter, SpanScorer, ATTR_PREFIX,
};
pub use span::{Span, SpanGroup};

/// Default span group for candidate spans.
pub const DEFAULT_CANDIDATES_KEY: &str = "span_candidates";

/// Default span group holding gold spans.
pub const DEFAULT_REFERENCE_KEY: &str = "sc";

/// Default boundary threshold.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Default component name, used as the key in [`Losses`].
pub const DEFAULT_COMPONENT_NAME: &str = "span_finder";
