//! Reference documents must come out of scoring exactly as they went in,
//! whether the scorer succeeds, fails, or panics.

use std::panic::{catch_unwind, AssertUnwindSafe};

use spanfinder::{
    span_finder_score, Doc, Error, Example, OverlapScorer, Result, ScoreSpansOptions, Scores, Span,
    SpanFinder, SpanFinderConfig, SpanGroup,
};

const CANDIDATES: &str = "span_candidates";
const GOLD: &str = "sc";

fn doc(spans: &[(&str, &[(usize, usize)])]) -> Doc {
    let mut doc = Doc::from_words(&["one", "two", "three", "four", "five"]);
    for (key, ranges) in spans {
        let group: SpanGroup = ranges.iter().map(|&(s, e)| Span::new(s, e)).collect();
        doc.set_spans(*key, group).unwrap();
    }
    doc
}

/// Three kinds of reference doc: gold only, gold plus a stale candidates
/// group, and no gold at all.
fn examples() -> Vec<Example> {
    vec![
        Example::new(doc(&[(CANDIDATES, &[(0, 2)])]), doc(&[(GOLD, &[(0, 2)])])),
        Example::new(
            doc(&[(CANDIDATES, &[(1, 3), (3, 4)])]),
            doc(&[(GOLD, &[(1, 3)]), (CANDIDATES, &[(4, 5)])]),
        ),
        Example::new(doc(&[(CANDIDATES, &[(2, 3)])]), doc(&[])),
    ]
}

fn references(examples: &[Example]) -> Vec<Doc> {
    examples.iter().map(|eg| eg.reference.clone()).collect()
}

#[test]
fn restores_after_success() {
    let mut examples = examples();
    let before = references(&examples);

    let scores = span_finder_score(&mut examples, CANDIDATES, GOLD, &OverlapScorer).unwrap();

    assert_eq!(references(&examples), before);
    assert!(!examples[0].reference.has_spans(CANDIDATES));
    assert_eq!(
        examples[1].reference.spans(CANDIDATES).map(SpanGroup::len),
        Some(1)
    );
    // gold: (0,2), (1,3); predicted: (0,2), (1,3), (3,4). Example 3 has no
    // gold and is skipped.
    let p = scores["span_finder_span_candidates_p"].unwrap();
    let r = scores["span_finder_span_candidates_r"].unwrap();
    assert!((p - 2.0 / 3.0).abs() < 1e-9);
    assert!((r - 1.0).abs() < 1e-9);
}

#[test]
fn scorer_sees_gold_under_candidates_key() {
    let mut examples = examples();

    let probe = |examples: &[Example], options: &ScoreSpansOptions| -> Result<Scores> {
        assert_eq!(options.attr, "span_finder_span_candidates");
        assert_eq!(
            examples[0].reference.spans(CANDIDATES),
            examples[0].reference.spans(GOLD)
        );
        assert_eq!(
            examples[1].reference.spans(CANDIDATES),
            examples[1].reference.spans(GOLD)
        );
        assert!(!examples[2].reference.has_spans(CANDIDATES));
        Ok(Scores::new())
    };

    span_finder_score(&mut examples, CANDIDATES, GOLD, &probe).unwrap();
}

#[test]
fn restores_after_scorer_error() {
    let mut examples = examples();
    let before = references(&examples);

    let failing = |_: &[Example], _: &ScoreSpansOptions| -> Result<Scores> {
        Err(Error::Scorer("metrics backend unavailable".to_string()))
    };

    let err = span_finder_score(&mut examples, CANDIDATES, GOLD, &failing).unwrap_err();
    assert!(matches!(err, Error::Scorer(_)));
    assert_eq!(references(&examples), before);
}

#[test]
fn restores_after_scorer_panic() {
    let mut examples = examples();
    let before = references(&examples);

    let panicking = |_: &[Example], _: &ScoreSpansOptions| -> Result<Scores> {
        panic!("scorer blew up");
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        span_finder_score(&mut examples, CANDIDATES, GOLD, &panicking)
    }));

    assert!(outcome.is_err());
    assert_eq!(references(&examples), before);
}

#[test]
fn repeated_scoring_is_stable() {
    let mut examples = examples();

    let first = span_finder_score(&mut examples, CANDIDATES, GOLD, &OverlapScorer).unwrap();
    let second = span_finder_score(&mut examples, CANDIDATES, GOLD, &OverlapScorer).unwrap();

    assert_eq!(first, second);
}

#[test]
fn component_score_uses_configured_keys() {
    struct Unused;
    impl spanfinder::BoundaryScorer for Unused {
        fn predict(&self, _: &[&Doc]) -> spanfinder::ScoreMatrix {
            unreachable!()
        }
        fn begin_update(&mut self, _: &[&Doc]) -> (spanfinder::ScoreMatrix, spanfinder::Backprop<'_>) {
            unreachable!()
        }
        fn initialize(&mut self, _: Option<(&[&Doc], &spanfinder::ScoreMatrix)>) {}
    }

    let config = SpanFinderConfig::default()
        .with_candidates_key("proposals")
        .with_reference_key("entities");
    let finder = SpanFinder::new(Unused, config).unwrap();

    let mut predicted = Doc::from_words(&["a", "b"]);
    predicted.set_spans("proposals", vec![Span::new(0, 1)]).unwrap();
    let mut reference = Doc::from_words(&["a", "b"]);
    reference.set_spans("entities", vec![Span::new(0, 1)]).unwrap();
    let mut examples = vec![Example::new(predicted, reference)];

    let scores = finder.score(&mut examples, &OverlapScorer).unwrap();
    assert_eq!(scores["span_finder_proposals_f"], Some(1.0));
    assert!(!examples[0].reference.has_spans("proposals"));
}
