//! The span finder component: inference and training around a boundary model.
//!
//! ## Inference
//!
//! ```text
//! docs ──► predict ──► scores (Σ len(doc) × 2)
//!                          │  split by doc length
//!                          ▼
//!          set_annotations: per doc, threshold + pair → doc.spans[candidates_key]
//! ```
//!
//! ## Training
//!
//! ```text
//! examples.predicted ──► begin_update ──► scores ─┐
//! examples.reference ──► reference_labels ────────┴─► squared_error ──► d_scores ──► backprop
//!                                                          │
//!                                                          └─► losses[name] += loss
//! ```
//!
//! Scores and reference labels are both laid out doc by doc, token by token,
//! over the same slice of examples. That shared order is what makes row `k`
//! of one matrix describe the same token as row `k` of the other.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use ndarray::{Array2, Axis, Slice};

use crate::candidates::set_candidates;
use crate::model::{BoundaryScorer, Optimizer, ScoreMatrix};
use crate::scorer::{span_finder_score, Scores, SpanScorer};
use crate::{
    reference_labels, squared_error, Doc, Error, Example, Result, SpanFinderConfig,
    DEFAULT_COMPONENT_NAME,
};

/// Running loss totals keyed by component name.
pub type Losses = BTreeMap<String, f32>;

/// Number of examples used to infer model shapes in [`SpanFinder::initialize`].
pub const INIT_SAMPLE_SIZE: usize = 10;

/// Learns span boundaries and proposes candidate spans.
///
/// ## Example
///
/// ```rust
/// use ndarray::Array2;
/// use spanfinder::{Backprop, BoundaryScorer, Doc, ScoreMatrix, SpanFinder, SpanFinderConfig};
///
/// /// Marks the first token as a start and the last token as an end.
/// struct EdgeScorer;
///
/// impl BoundaryScorer for EdgeScorer {
///     fn predict(&self, docs: &[&Doc]) -> ScoreMatrix {
///         let rows: Vec<[f32; 2]> = docs
///             .iter()
///             .flat_map(|doc| {
///                 let n = doc.len();
///                 (0..n).map(move |i| [f32::from(u8::from(i == 0)), f32::from(u8::from(i + 1 == n))])
///             })
///             .collect();
///         Array2::from(rows)
///     }
///
///     fn begin_update(&mut self, docs: &[&Doc]) -> (ScoreMatrix, Backprop<'_>) {
///         (self.predict(docs), Box::new(|_: &ScoreMatrix| {}))
///     }
///
///     fn initialize(&mut self, _sample: Option<(&[&Doc], &ScoreMatrix)>) {}
/// }
///
/// let finder = SpanFinder::new(EdgeScorer, SpanFinderConfig::default()).unwrap();
/// let mut docs = vec![Doc::from_text("The quick brown fox")];
/// finder.pipe(&mut docs).unwrap();
///
/// let candidates = docs[0].spans("span_candidates").unwrap();
/// assert_eq!(candidates.len(), 1);
/// assert_eq!(candidates.iter().next().unwrap().range(), 0..4);
/// ```
#[derive(Debug, Clone)]
pub struct SpanFinder<M> {
    model: M,
    config: SpanFinderConfig,
    name: String,
}

impl<M: BoundaryScorer> SpanFinder<M> {
    /// Create a span finder around `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`SpanFinderConfig::validate`].
    pub fn new(model: M, config: SpanFinderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            config,
            name: DEFAULT_COMPONENT_NAME.to_string(),
        })
    }

    /// Set the component name used as the key in [`Losses`].
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration this component was built with.
    #[must_use]
    pub fn config(&self) -> &SpanFinderConfig {
        &self.config
    }

    /// The wrapped model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access to the wrapped model.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Consume the component, returning the model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Score a batch without modifying it.
    pub fn predict(&self, docs: &[&Doc]) -> ScoreMatrix {
        self.model.predict(docs)
    }

    /// Write candidate spans onto `docs` from batch `scores`.
    ///
    /// `scores` must hold one row per token of `docs`, in order. The
    /// candidates key is replaced on every doc, even when it gets no spans.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] before touching any doc if the row
    /// count differs from the batch token count, or there are not 2 columns.
    pub fn set_annotations(&self, docs: &mut [Doc], scores: &ScoreMatrix) -> Result<()> {
        self.annotate(docs.iter_mut().collect(), scores)
    }

    /// [`predict`](Self::predict) then [`set_annotations`](Self::set_annotations).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the model's output does not match
    /// the batch.
    pub fn pipe(&self, docs: &mut [Doc]) -> Result<()> {
        let scores = {
            let refs: Vec<&Doc> = docs.iter().collect();
            self.predict(&refs)
        };
        self.set_annotations(docs, &scores)
    }

    /// Run [`pipe`](Self::pipe) over the predicted side of `examples`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the model's output does not match
    /// the batch.
    pub fn pipe_examples(&self, examples: &mut [Example]) -> Result<()> {
        let scores = {
            let refs: Vec<&Doc> = examples.iter().map(|eg| &eg.predicted).collect();
            self.predict(&refs)
        };
        self.annotate(examples.iter_mut().map(|eg| &mut eg.predicted).collect(), &scores)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(name = %self.name)))]
    fn annotate(&self, docs: Vec<&mut Doc>, scores: &ScoreMatrix) -> Result<()> {
        let total: usize = docs.iter().map(|doc| doc.len()).sum();
        if scores.dim() != (total, 2) {
            return Err(Error::ShapeMismatch {
                expected: (total, 2),
                actual: scores.dim(),
            });
        }

        let bounds = self.config.length_bounds();
        let mut offset = 0;
        for doc in docs {
            let len = doc.len();
            let doc_scores = scores.slice_axis(Axis(0), Slice::from(offset..offset + len));
            set_candidates(
                doc,
                doc_scores,
                &self.config.candidates_key,
                self.config.threshold,
                bounds,
            )?;
            offset += len;
        }

        log::debug!("{}: annotated {total} tokens", self.name);
        Ok(())
    }

    /// Learn from a batch of examples.
    ///
    /// Scores the predicted docs, compares them with labels built from the
    /// reference docs, and passes the gradient back to the model. With an
    /// optimizer, the staged updates are applied. The batch loss is added to
    /// `losses[name]` (created at 0.0 if missing) and returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the model's scores do not line up
    /// with the reference labels. Nothing is backpropagated in that case.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(name = %self.name)))]
    pub fn update(
        &mut self,
        examples: &[Example],
        sgd: Option<&mut dyn Optimizer<M>>,
        losses: &mut Losses,
    ) -> Result<f32> {
        losses.entry(self.name.clone()).or_insert(0.0);

        let predicted: Vec<&Doc> = examples.iter().map(|eg| &eg.predicted).collect();
        let (scores, backprop) = self.model.begin_update(&predicted);
        let (loss, d_scores) = loss_against(examples, &scores, &self.config.reference_key)?;
        backprop(&d_scores);

        if let Some(sgd) = sgd {
            sgd.finish_update(&mut self.model);
        }

        *losses.entry(self.name.clone()).or_insert(0.0) += loss;
        log::debug!(
            "{}: batch of {} examples, {} tokens, loss {loss:.4}",
            self.name,
            examples.len(),
            scores.nrows()
        );
        Ok(loss)
    }

    /// Loss and gradient of `scores` against the examples' reference spans.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `scores` does not have one row per
    /// reference token.
    pub fn get_loss(&self, examples: &[Example], scores: &ScoreMatrix) -> Result<(f32, Array2<f32>)> {
        loss_against(examples, scores, &self.config.reference_key)
    }

    /// Initialize the model from a sample of examples.
    ///
    /// At most [`INIT_SAMPLE_SIZE`] examples are drawn. Their reference docs
    /// and reference labels are the model's sample input and output. With no
    /// examples the model initializes from its defaults.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(name = %self.name)))]
    pub fn initialize<F, I>(&mut self, get_examples: F)
    where
        F: FnOnce() -> I,
        I: IntoIterator,
        I::Item: Borrow<Example>,
    {
        let subbatch: Vec<I::Item> = get_examples().into_iter().take(INIT_SAMPLE_SIZE).collect();

        if subbatch.is_empty() {
            log::warn!("{}: no examples to initialize from, using model defaults", self.name);
            self.model.initialize(None);
            return;
        }

        let docs: Vec<&Doc> = subbatch
            .iter()
            .map(|eg| {
                let eg: &Example = eg.borrow();
                &eg.reference
            })
            .collect();
        let targets = reference_labels(docs.iter().copied(), &self.config.reference_key);
        log::info!(
            "{}: initializing from {} examples ({} tokens)",
            self.name,
            docs.len(),
            targets.nrows()
        );
        self.model.initialize(Some((docs.as_slice(), &targets)));
    }

    /// Score candidates on the predicted docs against gold spans on the
    /// reference docs. See [`span_finder_score`].
    ///
    /// # Errors
    ///
    /// Returns whatever `scorer` returns; reference docs are restored either way.
    pub fn score<S: SpanScorer + ?Sized>(&self, examples: &mut [Example], scorer: &S) -> Result<Scores> {
        span_finder_score(
            examples,
            &self.config.candidates_key,
            &self.config.reference_key,
            scorer,
        )
    }
}

fn loss_against(
    examples: &[Example],
    scores: &ScoreMatrix,
    reference_key: &str,
) -> Result<(f32, Array2<f32>)> {
    let reference = reference_labels(examples.iter().map(|eg| &eg.reference), reference_key);
    squared_error(scores.view(), reference.view())
}
