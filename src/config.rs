//! Span finder configuration.
//!
//! ## Thresholds
//!
//! A token is a start (or end) candidate when its start (or end) score is at
//! least `threshold`. Lower thresholds propose more candidates:
//!
//! | Threshold | Effect |
//! |-----------|--------|
//! | 0.1 | High recall, many candidates for a downstream classifier |
//! | 0.3 | Default |
//! | 0.5 | Only confident boundaries |
//!
//! ## Length Bounds
//!
//! Every start is paired with every end at or after it, so the number of
//! candidates grows quadratically with the number of boundaries. Length
//! bounds cap that:
//!
//! ```text
//! starts = {0, 2}, ends = {1, 3}
//!
//! unbounded:  [0,2) [0,4) [2,4)
//! max = 2:    [0,2)       [2,4)
//! ```
//!
//! A bound of 0 means "unbounded", on either side.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, DEFAULT_CANDIDATES_KEY, DEFAULT_REFERENCE_KEY, DEFAULT_THRESHOLD};

/// Minimum and maximum span length in tokens, where 0 disables a bound.
///
/// # Examples
///
/// ```rust
/// use spanfinder::LengthBounds;
/// use std::cmp::Ordering;
///
/// let bounds = LengthBounds::new(2, 4);
/// assert_eq!(bounds.fits(1), Ordering::Less);
/// assert_eq!(bounds.fits(3), Ordering::Equal);
/// assert_eq!(bounds.fits(5), Ordering::Greater);
///
/// // No bounds at all
/// assert!(LengthBounds::unbounded().admits(1_000));
///
/// // Range syntax
/// let bounds = LengthBounds::from(1..4);
/// assert_eq!(bounds.max(), 3); // exclusive end
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    min: usize,
    max: usize,
}

impl LengthBounds {
    /// Create bounds. Either value may be 0 to leave that side open.
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Bounds that admit every length.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(0, 0)
    }

    /// Minimum length (0 = none).
    #[must_use]
    pub const fn min(&self) -> usize {
        self.min
    }

    /// Maximum length (0 = none).
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Where `len` falls relative to the bounds.
    ///
    /// Returns:
    /// - `Ordering::Less`: shorter than `min`
    /// - `Ordering::Equal`: admitted
    /// - `Ordering::Greater`: longer than `max`
    #[must_use]
    pub fn fits(&self, len: usize) -> Ordering {
        if self.min > 0 && len < self.min {
            Ordering::Less
        } else if self.max > 0 && len > self.max {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Whether `len` is admitted.
    #[must_use]
    pub fn admits(&self, len: usize) -> bool {
        self.fits(len) == Ordering::Equal
    }

    /// Check that the bounds can admit anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLengthBounds`] if both bounds are set and
    /// `min > max`.
    pub fn validate(&self) -> Result<()> {
        if self.min > 0 && self.max > 0 && self.min > self.max {
            return Err(Error::InvalidLengthBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl From<std::ops::Range<usize>> for LengthBounds {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            min: range.start,
            max: range.end.saturating_sub(1).max(range.start),
        }
    }
}

impl From<std::ops::RangeInclusive<usize>> for LengthBounds {
    fn from(range: std::ops::RangeInclusive<usize>) -> Self {
        Self {
            min: *range.start(),
            max: *range.end(),
        }
    }
}

/// Settings for a [`SpanFinder`](crate::SpanFinder).
///
/// Built once and handed to the component; the component never mutates it.
///
/// ```rust
/// use spanfinder::SpanFinderConfig;
///
/// let config = SpanFinderConfig::default()
///     .with_threshold(0.5)
///     .with_max_length(8)
///     .with_reference_key("entities");
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.candidates_key, "span_candidates");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanFinderConfig {
    /// Minimum score for a token to count as a start or end.
    pub threshold: f32,
    /// Maximum candidate length in tokens (0 = unbounded).
    pub max_length: usize,
    /// Minimum candidate length in tokens (0 = unbounded).
    pub min_length: usize,
    /// Span group the candidates are written to.
    pub candidates_key: String,
    /// Span group holding gold spans on reference documents.
    pub reference_key: String,
}

impl Default for SpanFinderConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_length: 0,
            min_length: 0,
            candidates_key: DEFAULT_CANDIDATES_KEY.to_string(),
            reference_key: DEFAULT_REFERENCE_KEY.to_string(),
        }
    }
}

impl SpanFinderConfig {
    /// Set the boundary threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the maximum span length (0 = unbounded).
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the minimum span length (0 = unbounded).
    #[must_use]
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Set the key candidates are written under.
    #[must_use]
    pub fn with_candidates_key(mut self, key: impl Into<String>) -> Self {
        self.candidates_key = key.into();
        self
    }

    /// Set the key gold spans are read from.
    #[must_use]
    pub fn with_reference_key(mut self, key: impl Into<String>) -> Self {
        self.reference_key = key.into();
        self
    }

    /// The length bounds as a single value.
    #[must_use]
    pub fn length_bounds(&self) -> LengthBounds {
        LengthBounds::new(self.min_length, self.max_length)
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidThreshold`] if the threshold is NaN or outside
    /// `[0, 1]`, or [`Error::InvalidLengthBounds`] if the bounds are inverted.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidThreshold(self.threshold));
        }
        self.length_bounds().validate()
    }
}
