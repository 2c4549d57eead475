//! Pairwise superread compatibility.
//!
//! Two superreads are compatible, in order, when the first one starts no later
//! than the second, ends no later than the second, the two intervals overlap,
//! and both agree symbol-for-symbol over the shared covarying sites.

use serde::{Deserialize, Serialize};

use crate::types::Span;

/// Default number of agreeing covarying sites required for an edge.
pub const DEFAULT_MINIMUM_OVERLAP: usize = 2;

/// Outcome of a directed compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    /// Whether `i -> j` is an admissible edge.
    pub compatible: bool,
    /// Length of the shared window; 0 when the intervals are out of order.
    pub overlap: usize,
}

impl Compatibility {
    /// The result for pairs that are rejected before any symbol is compared.
    pub const REJECTED: Self = Self {
        compatible: false,
        overlap: 0,
    };
}

/// Check whether `i` may directly precede `j`.
///
/// The relation is asymmetric; evaluate each ordered pair separately.
/// Sentinels (no identity) and a superread paired with itself are never
/// compatible. The overlap length is reported even when the symbols disagree
/// or the window is shorter than `minimum_overlap`.
pub fn check_compatibility<I, J>(i: &I, j: &J, minimum_overlap: usize) -> Compatibility
where
    I: Span + ?Sized,
    J: Span + ?Sized,
{
    let (Some(i_index), Some(j_index)) = (i.index(), j.index()) else {
        return Compatibility::REJECTED;
    };
    if i_index == j_index {
        return Compatibility::REJECTED;
    }

    let start_before_start = i.cv_start() <= j.cv_start();
    let start_before_end = j.cv_start() < i.cv_end();
    let end_before_end = i.cv_end() <= j.cv_end();
    if !(start_before_start && start_before_end && end_before_end) {
        return Compatibility::REJECTED;
    }

    // Ordering above fixes the window to [j.cv_start, i.cv_end).
    let window_start = j.cv_start();
    let window_end = i.cv_end();
    let overlap = window_end - window_start;

    let i_offset = window_start - i.cv_start();
    let i_slice = i.vacs().get(i_offset..i_offset + overlap);
    let j_slice = j.vacs().get(..overlap);

    let agree = matches!((i_slice, j_slice), (Some(a), Some(b)) if a == b);
    Compatibility {
        compatible: agree && overlap >= minimum_overlap,
        overlap,
    }
}
