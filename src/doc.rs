//! Tokenized documents and training examples.
//!
//! The boundary algorithms only need three things from a document: its token
//! count, each token's index, and a map from key to [`SpanGroup`]. [`Doc`]
//! provides those plus byte offsets, so spans can be mapped back to text.
//!
//! ## Tokenization
//!
//! Tokenization is not part of span finding. [`Doc::from_text`] is a
//! convenience that splits on Unicode word boundaries (UAX #29) and drops
//! whitespace, which is enough for demos and tests:
//!
//! ```rust
//! use spanfinder::Doc;
//!
//! let doc = Doc::from_text("Apple buys a startup.");
//! let words: Vec<&str> = doc.tokens().iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(words, ["Apple", "buys", "a", "startup", "."]);
//! ```

use std::collections::BTreeMap;

use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, Result, Span, SpanGroup};

/// A single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text.
    pub text: String,
    /// Position of this token in its document.
    pub i: usize,
    /// Byte offset of the token in the source text.
    pub idx: usize,
}

/// An ordered sequence of tokens with named span groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doc {
    text: String,
    tokens: Vec<Token>,
    spans: BTreeMap<String, SpanGroup>,
}

impl Doc {
    /// Tokenize `text` on Unicode word boundaries, skipping whitespace.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let tokens = text
            .split_word_bound_indices()
            .filter(|(_, w)| !w.trim().is_empty())
            .enumerate()
            .map(|(i, (idx, w))| Token {
                text: w.to_string(),
                i,
                idx,
            })
            .collect();

        Self {
            text: text.to_string(),
            tokens,
            spans: BTreeMap::new(),
        }
    }

    /// Build a document from pre-split words, joined by single spaces.
    #[must_use]
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let mut text = String::new();
        let mut tokens = Vec::with_capacity(words.len());

        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            tokens.push(Token {
                text: word.as_ref().to_string(),
                i,
                idx: text.len(),
            });
            text.push_str(word.as_ref());
        }

        Self {
            text,
            tokens,
            spans: BTreeMap::new(),
        }
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the document has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The tokens, in index order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The span group stored under `key`, if any.
    #[must_use]
    pub fn spans(&self, key: &str) -> Option<&SpanGroup> {
        self.spans.get(key)
    }

    /// Mutable access to the span group under `key`, if any.
    pub fn spans_mut(&mut self, key: &str) -> Option<&mut SpanGroup> {
        self.spans.get_mut(key)
    }

    /// Whether a span group exists under `key` (it may be empty).
    #[must_use]
    pub fn has_spans(&self, key: &str) -> bool {
        self.spans.contains_key(key)
    }

    /// Store `group` under `key`, returning the group it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySpan`] if any span has `end <= start`, or
    /// [`Error::SpanOutOfBounds`] if any span ends past the last token.
    pub fn set_spans(
        &mut self,
        key: impl Into<String>,
        group: impl Into<SpanGroup>,
    ) -> Result<Option<SpanGroup>> {
        let group = group.into();
        if let Some(span) = group.iter().find(|s| s.is_empty()) {
            return Err(Error::EmptySpan {
                start: span.start,
                end: span.end,
            });
        }
        if let Some(span) = group.iter().find(|s| s.end > self.len()) {
            return Err(Error::SpanOutOfBounds {
                start: span.start,
                end: span.end,
                len: self.len(),
            });
        }
        Ok(self.spans.insert(key.into(), group))
    }

    /// Remove and return the group under `key`.
    pub fn remove_spans(&mut self, key: &str) -> Option<SpanGroup> {
        self.spans.remove(key)
    }

    /// Keys of all span groups, in sorted order.
    pub fn span_keys(&self) -> impl Iterator<Item = &str> {
        self.spans.keys().map(String::as_str)
    }

    /// Set or clear `key` without bounds checking, returning what was there.
    /// Only for groups that already lived on a doc with the same tokens.
    pub(crate) fn replace_spans(&mut self, key: &str, group: Option<SpanGroup>) -> Option<SpanGroup> {
        match group {
            Some(group) => self.spans.insert(key.to_string(), group),
            None => self.spans.remove(key),
        }
    }

    /// Text covering tokens `start..end`, or `None` if out of range.
    pub(crate) fn text_of(&self, start: usize, end: usize) -> Option<&str> {
        if start >= end || end > self.tokens.len() {
            return None;
        }
        let first = &self.tokens[start];
        let last = &self.tokens[end - 1];
        self.text.get(first.idx..last.idx + last.text.len())
    }

    /// Convenience for building spans in tests and demos.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SpanOutOfBounds`] if the span does not fit.
    pub fn span(&self, start: usize, end: usize) -> Result<Span> {
        Span::try_new(start, end)
            .filter(|s| s.end <= self.len())
            .ok_or(Error::SpanOutOfBounds {
                start,
                end,
                len: self.len(),
            })
    }
}

/// A pair of documents over the same tokens: one the pipeline annotates and
/// one holding gold annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// The document predictions are written to.
    pub predicted: Doc,
    /// The document carrying gold-standard annotations.
    pub reference: Doc,
}

impl Example {
    /// Pair a predicted doc with its reference.
    #[must_use]
    pub fn new(predicted: Doc, reference: Doc) -> Self {
        Self {
            predicted,
            reference,
        }
    }

    /// An example whose predicted doc is the reference without span groups.
    #[must_use]
    pub fn from_reference(reference: Doc) -> Self {
        let predicted = Doc {
            text: reference.text.clone(),
            tokens: reference.tokens.clone(),
            spans: BTreeMap::new(),
        };
        Self {
            predicted,
            reference,
        }
    }
}
