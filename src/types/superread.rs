//! Superread types for the graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigurationError;

/// Capability shared by every graph node: a half-open interval over the
/// covarying-site coordinates and the symbols observed across it.
///
/// Sentinels have an empty interval and no symbols.
pub trait Span {
    /// First covarying site covered (inclusive).
    fn cv_start(&self) -> usize;
    /// One past the last covarying site covered.
    fn cv_end(&self) -> usize;
    /// One symbol per covered site, as ASCII bytes.
    fn vacs(&self) -> &[u8];
    /// Superread identity, `None` for sentinels.
    fn index(&self) -> Option<u64>;

    /// Number of covered sites.
    fn span_len(&self) -> usize {
        self.cv_end().saturating_sub(self.cv_start())
    }
}

/// A superread: a compressed read spanning contiguous covarying sites.
///
/// Produced by the upstream read-compression step and immutable afterwards.
/// Equality and ordering consider only `index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Superread {
    /// Unique identity.
    pub index: u64,
    /// First covarying site covered (inclusive).
    pub cv_start: usize,
    /// One past the last covarying site covered.
    pub cv_end: usize,
    /// Observed symbols, one per covered covarying site.
    pub vacs: String,
    /// Read support; only used for admission filtering.
    pub weight: f64,
}

impl Superread {
    /// Create a new superread.
    pub fn new(index: u64, cv_start: usize, cv_end: usize, vacs: impl Into<String>, weight: f64) -> Self {
        Self {
            index,
            cv_start,
            cv_end,
            vacs: vacs.into(),
            weight,
        }
    }

    /// Check the interval and symbol invariants.
    ///
    /// # Errors
    /// * `InvertedInterval` if `cv_start >= cv_end`
    /// * `VacsLengthMismatch` if `vacs` does not cover the interval exactly
    /// * `NonAsciiVacs` if a symbol is not a single ASCII byte
    /// * `InvalidWeight` for negative or non-finite weights
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.cv_start >= self.cv_end {
            return Err(ConfigurationError::InvertedInterval {
                index: self.index,
                cv_start: self.cv_start,
                cv_end: self.cv_end,
            });
        }
        if !self.vacs.is_ascii() {
            return Err(ConfigurationError::NonAsciiVacs { index: self.index });
        }
        if self.vacs.len() != self.cv_end - self.cv_start {
            return Err(ConfigurationError::VacsLengthMismatch {
                index: self.index,
                expected: self.cv_end - self.cv_start,
                actual: self.vacs.len(),
            });
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ConfigurationError::InvalidWeight {
                index: self.index,
                weight: self.weight,
            });
        }
        Ok(())
    }
}

impl Span for Superread {
    fn cv_start(&self) -> usize {
        self.cv_start
    }

    fn cv_end(&self) -> usize {
        self.cv_end
    }

    fn vacs(&self) -> &[u8] {
        self.vacs.as_bytes()
    }

    fn index(&self) -> Option<u64> {
        Some(self.index)
    }
}

impl fmt::Display for Superread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "superread {} [{}, {}) {}", self.index, self.cv_start, self.cv_end, self.vacs)
    }
}

impl PartialEq for Superread {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Superread {}

impl PartialOrd for Superread {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Superread {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}
