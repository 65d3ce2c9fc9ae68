//! Evaluating candidate spans against gold spans.
//!
//! ## The Key Problem
//!
//! A span scorer compares the group stored under one key on the predicted
//! doc with the group under the *same* key on the reference doc. Candidates
//! live under `candidates_key` but gold spans live under `reference_key`:
//!
//! ```text
//! predicted.spans["span_candidates"]  vs  reference.spans["span_candidates"]  ← usually absent
//!                                         reference.spans["sc"]               ← the gold spans
//! ```
//!
//! [`span_finder_score`] copies each reference doc's gold group to the
//! candidates key, scores, and puts the reference docs back exactly as they
//! were. The restore runs from a drop guard, so it also happens when the
//! scorer fails or panics.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Deref;

use crate::{Doc, Example, Result, Span, SpanGroup};

/// Prefix of the score attribute, e.g. `span_finder_span_candidates`.
pub const ATTR_PREFIX: &str = "span_finder_";

/// Metric name → value. `None` means there was nothing to score.
pub type Scores = BTreeMap<String, Option<f64>>;

/// Reads the spans for an attribute from a document.
pub type SpanGetter = Box<dyn Fn(&Doc, &str) -> Vec<Span>>;

/// Decides whether a reference document is annotated for this attribute.
pub type AnnotationCheck = Box<dyn Fn(&Doc) -> bool>;

/// Settings passed to a [`SpanScorer`].
pub struct ScoreSpansOptions {
    /// Attribute name; also the prefix of every returned metric key.
    pub attr: String,
    /// Whether predicted spans may overlap each other.
    pub allow_overlap: bool,
    /// Whether span labels take part in matching.
    pub labeled: bool,
    /// How spans are read from a document.
    pub getter: SpanGetter,
    /// Reference docs failing this check are skipped.
    pub has_annotation: Option<AnnotationCheck>,
}

impl ScoreSpansOptions {
    /// Options that read the group stored under `attr` itself.
    #[must_use]
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            allow_overlap: false,
            labeled: true,
            getter: Box::new(group_or_empty),
            has_annotation: None,
        }
    }

    /// Allow or forbid overlapping predicted spans.
    #[must_use]
    pub fn with_allow_overlap(mut self, allow: bool) -> Self {
        self.allow_overlap = allow;
        self
    }

    /// Match on labels as well as boundaries.
    #[must_use]
    pub fn with_labeled(mut self, labeled: bool) -> Self {
        self.labeled = labeled;
        self
    }

    /// Replace the span getter.
    #[must_use]
    pub fn with_getter(mut self, getter: impl Fn(&Doc, &str) -> Vec<Span> + 'static) -> Self {
        self.getter = Box::new(getter);
        self
    }

    /// Only score examples whose reference doc passes `check`.
    #[must_use]
    pub fn with_has_annotation(mut self, check: impl Fn(&Doc) -> bool + 'static) -> Self {
        self.has_annotation = Some(Box::new(check));
        self
    }
}

impl std::fmt::Debug for ScoreSpansOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreSpansOptions")
            .field("attr", &self.attr)
            .field("allow_overlap", &self.allow_overlap)
            .field("labeled", &self.labeled)
            .field("has_annotation", &self.has_annotation.is_some())
            .finish_non_exhaustive()
    }
}

fn group_or_empty(doc: &Doc, key: &str) -> Vec<Span> {
    doc.spans(key)
        .map(|group| group.as_slice().to_vec())
        .unwrap_or_default()
}

/// Compares predicted spans with reference spans over a batch.
pub trait SpanScorer {
    /// Score `examples` under `options`.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures as [`Error::Scorer`](crate::Error::Scorer).
    fn score_spans(&self, examples: &[Example], options: &ScoreSpansOptions) -> Result<Scores>;
}

impl<F> SpanScorer for F
where
    F: Fn(&[Example], &ScoreSpansOptions) -> Result<Scores>,
{
    fn score_spans(&self, examples: &[Example], options: &ScoreSpansOptions) -> Result<Scores> {
        self(examples, options)
    }
}

/// True/false positive and false negative counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrfScore {
    /// Predicted and gold.
    pub true_positives: usize,
    /// Predicted but not gold.
    pub false_positives: usize,
    /// Gold but not predicted.
    pub false_negatives: usize,
}

impl PrfScore {
    /// Add the counts for one document.
    pub fn score_set<T: Eq + std::hash::Hash>(&mut self, predicted: &HashSet<T>, gold: &HashSet<T>) {
        let hits = predicted.intersection(gold).count();
        self.true_positives += hits;
        self.false_positives += predicted.len() - hits;
        self.false_negatives += gold.len() - hits;
    }

    /// Total number of counted items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives
    }

    /// Whether nothing has been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `tp / (tp + fp)`, or 0 with no predictions.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// `tp / (tp + fn)`, or 0 with no gold items.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall, or 0 if both are 0.
    #[must_use]
    pub fn fscore(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Exact-boundary span scorer reporting precision, recall, and F-score.
///
/// Spans match when they share start and last token (and label, when
/// labelled). Predicted and reference docs are assumed to share their
/// tokenization; predicted spans reaching past the reference doc are dropped.
///
/// Returns `{attr}_p`, `{attr}_r` and `{attr}_f`, which are `None` when no
/// span was seen on either side. Labelled scoring adds
/// `{attr}_per_type_{label}_{p,r,f}` per label; unlabelled spans count toward
/// the totals only. Empty spans are ignored on both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapScorer;

type SpanKey = (Option<String>, usize, usize);

fn span_key(span: &Span, labeled: bool) -> SpanKey {
    let label = if labeled { span.label.clone() } else { None };
    (label, span.start, span.last())
}

impl SpanScorer for OverlapScorer {
    fn score_spans(&self, examples: &[Example], options: &ScoreSpansOptions) -> Result<Scores> {
        let attr = &options.attr;
        let mut score = PrfScore::default();
        let mut per_type: BTreeMap<String, PrfScore> = BTreeMap::new();

        for eg in examples {
            let gold_doc = &eg.reference;
            if let Some(check) = &options.has_annotation {
                if !check(gold_doc) {
                    continue;
                }
            }

            let mut gold_spans = (options.getter)(gold_doc, attr);
            gold_spans.retain(|s| !s.is_empty());

            let mut kept: Vec<Span> = Vec::new();
            for span in (options.getter)(&eg.predicted, attr) {
                if span.is_empty() || span.end > gold_doc.len() {
                    continue;
                }
                if !options.allow_overlap && kept.iter().any(|k| k.overlaps(&span)) {
                    continue;
                }
                kept.push(span);
            }

            let gold: HashSet<SpanKey> = gold_spans.iter().map(|s| span_key(s, options.labeled)).collect();
            let predicted: HashSet<SpanKey> = kept.iter().map(|s| span_key(s, options.labeled)).collect();
            score.score_set(&predicted, &gold);

            if options.labeled {
                let labels: BTreeSet<&str> = gold_spans
                    .iter()
                    .chain(kept.iter())
                    .filter_map(|s| s.label.as_deref())
                    .collect();
                for label in labels {
                    let of_label = |spans: &[Span]| -> HashSet<SpanKey> {
                        spans
                            .iter()
                            .filter(|s| s.label.as_deref() == Some(label))
                            .map(|s| span_key(s, true))
                            .collect()
                    };
                    per_type
                        .entry(label.to_string())
                        .or_default()
                        .score_set(&of_label(kept.as_slice()), &of_label(gold_spans.as_slice()));
                }
            }
        }

        let mut scores = Scores::new();
        let found = !score.is_empty();
        scores.insert(format!("{attr}_p"), found.then(|| score.precision()));
        scores.insert(format!("{attr}_r"), found.then(|| score.recall()));
        scores.insert(format!("{attr}_f"), found.then(|| score.fscore()));

        for (label, prf) in &per_type {
            scores.insert(format!("{attr}_per_type_{label}_p"), Some(prf.precision()));
            scores.insert(format!("{attr}_per_type_{label}_r"), Some(prf.recall()));
            scores.insert(format!("{attr}_per_type_{label}_f"), Some(prf.fscore()));
        }

        Ok(scores)
    }
}

/// Scoring options for span finder candidates stored under `candidates_key`.
///
/// The attribute is `span_finder_<candidates_key>`; overlaps are allowed,
/// labels are ignored, and only reference docs holding `candidates_key` are
/// scored.
#[must_use]
pub fn span_finder_options(candidates_key: &str) -> ScoreSpansOptions {
    let key = candidates_key.to_string();
    ScoreSpansOptions::new(format!("{ATTR_PREFIX}{candidates_key}"))
        .with_allow_overlap(true)
        .with_labeled(false)
        .with_getter(|doc, attr| group_or_empty(doc, attr.strip_prefix(ATTR_PREFIX).unwrap_or(attr)))
        .with_has_annotation(move |doc| doc.has_spans(&key))
}

/// Metric weights used when this component's scores are combined with
/// others: F-score counts, precision and recall are reported only.
#[must_use]
pub fn default_score_weights(candidates_key: &str) -> BTreeMap<String, f64> {
    BTreeMap::from([
        (format!("{ATTR_PREFIX}{candidates_key}_f"), 1.0),
        (format!("{ATTR_PREFIX}{candidates_key}_p"), 0.0),
        (format!("{ATTR_PREFIX}{candidates_key}_r"), 0.0),
    ])
}

/// Score candidates against gold spans with the default options.
///
/// # Errors
///
/// Returns whatever the scorer returns. Reference docs are restored first.
pub fn span_finder_score<S: SpanScorer + ?Sized>(
    examples: &mut [Example],
    candidates_key: &str,
    reference_key: &str,
    scorer: &S,
) -> Result<Scores> {
    let options = span_finder_options(candidates_key);
    score_aligned(examples, &options, candidates_key, reference_key, scorer)
}

/// Score with gold spans temporarily copied from `reference_key` to
/// `candidates_key` on every reference doc.
///
/// # Errors
///
/// Returns whatever the scorer returns. Reference docs are restored first.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(examples, options, scorer)))]
pub fn score_aligned<S: SpanScorer + ?Sized>(
    examples: &mut [Example],
    options: &ScoreSpansOptions,
    candidates_key: &str,
    reference_key: &str,
    scorer: &S,
) -> Result<Scores> {
    let aligned = AlignedReferences::new(examples, candidates_key, reference_key);
    log::debug!(
        "scoring {} examples, {} with gold under {reference_key:?}",
        aligned.len(),
        aligned.swapped.len()
    );
    scorer.score_spans(&aligned, options)
}

/// Reference docs with gold spans copied to the candidates key.
///
/// Dropping it puts back, per touched doc, exactly the group that was under
/// the candidates key before, or removes the key if there was none.
struct AlignedReferences<'e> {
    examples: &'e mut [Example],
    key: &'e str,
    swapped: Vec<(usize, Option<SpanGroup>)>,
}

impl<'e> AlignedReferences<'e> {
    fn new(examples: &'e mut [Example], candidates_key: &'e str, reference_key: &str) -> Self {
        let mut swapped = Vec::new();
        for (i, eg) in examples.iter_mut().enumerate() {
            if let Some(gold) = eg.reference.spans(reference_key).cloned() {
                let prior = eg.reference.replace_spans(candidates_key, Some(gold));
                swapped.push((i, prior));
            }
        }
        Self {
            examples,
            key: candidates_key,
            swapped,
        }
    }
}

impl Deref for AlignedReferences<'_> {
    type Target = [Example];

    fn deref(&self) -> &[Example] {
        &*self.examples
    }
}

impl Drop for AlignedReferences<'_> {
    fn drop(&mut self) {
        for (i, prior) in self.swapped.drain(..) {
            self.examples[i].reference.replace_spans(self.key, prior);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(key: &str, spans: &[(usize, usize)]) -> Doc {
        let mut doc = Doc::from_words(&["a", "b", "c", "d", "e"]);
        let group: SpanGroup = spans.iter().map(|&(s, e)| Span::new(s, e)).collect();
        doc.set_spans(key, group).unwrap();
        doc
    }

    #[test]
    fn test_prf_counts() {
        let mut prf = PrfScore::default();
        let predicted: HashSet<_> = [1, 2, 3].into_iter().collect();
        let gold: HashSet<_> = [2, 3, 4, 5].into_iter().collect();
        prf.score_set(&predicted, &gold);

        assert_eq!(prf.true_positives, 2);
        assert_eq!(prf.false_positives, 1);
        assert_eq!(prf.false_negatives, 2);
        assert!((prf.precision() - 2.0 / 3.0).abs() < 1e-9);
        assert!((prf.recall() - 0.5).abs() < 1e-9);
        assert!((prf.fscore() - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_prf_empty_is_zero() {
        let prf = PrfScore::default();
        assert_eq!(prf.precision(), 0.0);
        assert_eq!(prf.fscore(), 0.0);
    }

    #[test]
    fn test_span_finder_score_perfect() {
        let predicted = doc_with("span_candidates", &[(0, 2), (3, 4)]);
        let reference = doc_with("sc", &[(0, 2), (3, 4)]);
        let mut examples = vec![Example::new(predicted, reference)];

        let scores = span_finder_score(&mut examples, "span_candidates", "sc", &OverlapScorer).unwrap();
        assert_eq!(scores["span_finder_span_candidates_f"], Some(1.0));
        assert_eq!(scores["span_finder_span_candidates_p"], Some(1.0));
        assert!(!examples[0].reference.has_spans("span_candidates"));
    }

    #[test]
    fn test_span_finder_score_partial() {
        let predicted = doc_with("span_candidates", &[(0, 2), (0, 4), (2, 4)]);
        let reference = doc_with("sc", &[(0, 2)]);
        let mut examples = vec![Example::new(predicted, reference)];

        let scores = span_finder_score(&mut examples, "span_candidates", "sc", &OverlapScorer).unwrap();
        let p = scores["span_finder_span_candidates_p"].unwrap();
        let r = scores["span_finder_span_candidates_r"].unwrap();
        assert!((p - 1.0 / 3.0).abs() < 1e-9);
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unannotated_references_are_skipped() {
        let predicted = doc_with("span_candidates", &[(0, 2)]);
        let reference = Doc::from_words(&["a", "b", "c", "d", "e"]);
        let mut examples = vec![Example::new(predicted, reference)];

        let scores = span_finder_score(&mut examples, "span_candidates", "sc", &OverlapScorer).unwrap();
        assert_eq!(scores["span_finder_span_candidates_f"], None);
    }

    #[test]
    fn test_no_overlap_keeps_first() {
        let predicted = doc_with("k", &[(0, 2), (1, 3), (3, 4)]);
        let reference = doc_with("k", &[(1, 3)]);
        let examples = vec![Example::new(predicted, reference)];

        let options = ScoreSpansOptions::new("k").with_labeled(false);
        let scores = OverlapScorer.score_spans(&examples, &options).unwrap();
        assert_eq!(scores["k_p"], Some(0.0));
        assert_eq!(scores["k_r"], Some(0.0));
    }

    #[test]
    fn test_labeled_per_type() {
        let mut predicted = Doc::from_words(&["a", "b", "c"]);
        predicted
            .set_spans("ents", vec![Span::new(0, 1).with_label("PER"), Span::new(2, 3).with_label("ORG")])
            .unwrap();
        let mut reference = Doc::from_words(&["a", "b", "c"]);
        reference
            .set_spans("ents", vec![Span::new(0, 1).with_label("PER"), Span::new(2, 3).with_label("LOC")])
            .unwrap();
        let examples = vec![Example::new(predicted, reference)];

        let scores = OverlapScorer
            .score_spans(&examples, &ScoreSpansOptions::new("ents"))
            .unwrap();
        assert_eq!(scores["ents_p"], Some(0.5));
        assert_eq!(scores["ents_per_type_PER_f"], Some(1.0));
        assert_eq!(scores["ents_per_type_ORG_p"], Some(0.0));
        assert_eq!(scores["ents_per_type_LOC_r"], Some(0.0));
    }

    #[test]
    fn test_unlabelled_spans_have_no_per_type_bucket() {
        let mut predicted = Doc::from_words(&["a", "b", "c"]);
        predicted
            .set_spans("ents", vec![Span::new(0, 1).with_label("PER"), Span::new(2, 3)])
            .unwrap();
        let mut reference = Doc::from_words(&["a", "b", "c"]);
        reference
            .set_spans("ents", vec![Span::new(0, 1).with_label("PER"), Span::new(2, 3)])
            .unwrap();
        let examples = vec![Example::new(predicted, reference)];

        let scores = OverlapScorer
            .score_spans(&examples, &ScoreSpansOptions::new("ents"))
            .unwrap();
        assert_eq!(scores["ents_f"], Some(1.0));
        assert_eq!(scores["ents_per_type_PER_f"], Some(1.0));
        let per_type: Vec<&String> = scores.keys().filter(|k| k.contains("_per_type_")).collect();
        assert_eq!(per_type.len(), 3);
        assert!(!scores.contains_key("ents_per_type__p"));
    }

    #[test]
    fn test_empty_spans_are_ignored() {
        let mut predicted = doc_with("k", &[(0, 2)]);
        predicted.spans_mut("k").unwrap().push(Span {
            start: 0,
            end: 0,
            label: None,
        });
        let mut reference = doc_with("k", &[(0, 2)]);
        reference.spans_mut("k").unwrap().push(Span {
            start: 3,
            end: 3,
            label: None,
        });
        let examples = vec![Example::new(predicted, reference)];

        let options = ScoreSpansOptions::new("k").with_labeled(false);
        let scores = OverlapScorer.score_spans(&examples, &options).unwrap();
        assert_eq!(scores["k_p"], Some(1.0));
        assert_eq!(scores["k_r"], Some(1.0));
    }

    #[test]
    fn test_default_score_weights() {
        let weights = default_score_weights("span_candidates");
        assert_eq!(weights["span_finder_span_candidates_f"], 1.0);
        assert_eq!(weights["span_finder_span_candidates_p"], 0.0);
        assert_eq!(weights.len(), 3);
    }
}
