//! Candidate Spans From Boundary Scores
//!
//! Runs the span finder with a hand-written scorer that treats capitalized
//! words as likely span edges, then scores the candidates against gold spans.
//!
//! ```bash
//! cargo run --example find_spans
//! ```

use ndarray::Array2;
use spanfinder::{
    Backprop, BoundaryScorer, Doc, Example, OverlapScorer, ScoreMatrix, Span, SpanFinder,
    SpanFinderConfig,
};

/// Start and end scores of 0.8 for capitalized words, 0.1 otherwise.
struct CapitalScorer;

impl BoundaryScorer for CapitalScorer {
    fn predict(&self, docs: &[&Doc]) -> ScoreMatrix {
        let rows: Vec<[f32; 2]> = docs
            .iter()
            .flat_map(|doc| doc.tokens())
            .map(|token| {
                let p = if token.text.starts_with(char::is_uppercase) { 0.8 } else { 0.1 };
                [p, p]
            })
            .collect();
        Array2::from(rows)
    }

    fn begin_update(&mut self, docs: &[&Doc]) -> (ScoreMatrix, Backprop<'_>) {
        (self.predict(docs), Box::new(|_: &ScoreMatrix| {}))
    }

    fn initialize(&mut self, _sample: Option<(&[&Doc], &ScoreMatrix)>) {}
}

fn main() -> spanfinder::Result<()> {
    let config = SpanFinderConfig::default().with_threshold(0.5).with_max_length(3);
    let finder = SpanFinder::new(CapitalScorer, config)?;

    let mut reference = Doc::from_text("Yesterday Ada Lovelace visited New York City with friends.");
    reference.set_spans("sc", vec![Span::new(1, 3), Span::new(4, 7)])?;
    let mut examples = vec![Example::from_reference(reference)];

    finder.pipe_examples(&mut examples)?;

    let doc = &examples[0].predicted;
    println!("Document: {}", doc.text());
    if let Some(candidates) = doc.spans("span_candidates") {
        println!("Candidates: {}\n", candidates.len());
        for span in candidates {
            println!("  {span}  {:?}", span.text(doc).unwrap_or_default());
        }
    }

    let scores = finder.score(&mut examples, &OverlapScorer)?;
    println!();
    for (metric, value) in &scores {
        match value {
            Some(v) => println!("{metric}: {v:.3}"),
            None => println!("{metric}: n/a"),
        }
    }

    Ok(())
}
