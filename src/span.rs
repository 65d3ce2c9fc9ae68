//! The Span type: a token range with an optional label.

use crate::Doc;

/// A contiguous range of tokens in a document.
///
/// `start` is inclusive and `end` is exclusive, both as token indices (not
/// byte offsets). A well-formed span covers at least one token; the
/// constructors and [`Doc::set_spans`] enforce this:
///
/// ```rust
/// use spanfinder::Span;
///
/// let span = Span::new(1, 3);
/// assert_eq!(span.len(), 2);
/// assert_eq!(span.last(), 2);
/// assert_eq!(span.range(), 1..3);
/// ```
///
/// ## Start and last token
///
/// Boundary labels mark the first token and the *last* token of a span, so
/// `last()` (`end - 1`) is the index that carries the end flag:
///
/// ```text
/// tokens:  The  quick  brown  fox  jumps
/// index:    0     1      2     3     4
/// span:          [1 ......... 3)
///                 ^ start  ^ last
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    /// First token index (inclusive).
    pub start: usize,
    /// One past the last token index (exclusive).
    pub end: usize,
    /// Optional label, used by labelled scoring.
    pub label: Option<String>,
}

impl Span {
    /// Create an unlabelled span.
    ///
    /// # Panics
    ///
    /// Panics if `end <= start`.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end > start, "span end must be > start");
        Self {
            start,
            end,
            label: None,
        }
    }

    /// Create a span, or `None` if `end <= start`.
    #[must_use]
    pub fn try_new(start: usize, end: usize) -> Option<Self> {
        (end > start).then(|| Self {
            start,
            end,
            label: None,
        })
    }

    /// Attach a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Number of tokens covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no tokens. Only possible when built from its
    /// public fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Index of the last token in the span.
    ///
    /// # Panics
    ///
    /// Panics if `end` is 0, which no non-empty span has.
    #[must_use]
    pub fn last(&self) -> usize {
        self.end - 1
    }

    /// The token range of this span.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// Whether two spans share at least one token.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The surface text of this span in `doc`, or `None` if it does not fit.
    #[must_use]
    pub fn text<'d>(&self, doc: &'d Doc) -> Option<&'d str> {
        doc.text_of(self.start, self.end)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}..{} ({label})", self.start, self.end),
            None => write!(f, "{}..{}", self.start, self.end),
        }
    }
}

/// A named, ordered collection of spans attached to a document.
///
/// Order is insertion order. Overlapping, nested, and repeated spans are all
/// allowed: a candidate group is a proposal set, not a segmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanGroup {
    spans: Vec<Span>,
}

impl SpanGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span.
    pub fn push(&mut self, span: Span) {
        self.spans.push(span);
    }

    /// Number of spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the group holds no spans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Iterate spans in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    /// The spans as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }
}

impl From<Vec<Span>> for SpanGroup {
    fn from(spans: Vec<Span>) -> Self {
        Self { spans }
    }
}

impl FromIterator<Span> for SpanGroup {
    fn from_iter<I: IntoIterator<Item = Span>>(iter: I) -> Self {
        Self {
            spans: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SpanGroup {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

impl IntoIterator for SpanGroup {
    type Item = Span;
    type IntoIter = std::vec::IntoIter<Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.into_iter()
    }
}
