//! Marker-to-reference timestamp alignment
//!
//! Marker streams run on their own clock, so their timestamps have to be
//! expressed on the reference stream's timeline before they can annotate it.
//! Two policies are available:
//!
//! - [`AlignPolicy::Fast`]: subtract the first reference timestamp from every
//!   marker timestamp, giving an onset in seconds from the start of the
//!   recording. O(markers). Assumes both streams started on comparable
//!   clocks and ignores drift.
//! - [`AlignPolicy::Precise`]: map every marker to the index of the reference
//!   sample nearest in time (`argmin_j (ref[j] - marker)^2`, lowest index on
//!   ties). Binary search over the reference timestamps when they are
//!   non-decreasing, a full left-to-right scan otherwise.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignPolicy {
    #[default]
    Fast,
    Precise,
}

impl AlignPolicy {
    pub fn from_precise(precise: bool) -> Self {
        if precise { Self::Precise } else { Self::Fast }
    }
}

/// Marker onsets relative to the first reference timestamp
///
/// Returns `None` when the reference stream has no samples.
pub fn fast_offsets(reference: &[f64], markers: &[f64]) -> Option<Vec<f64>> {
    let start = *reference.first()?;
    Some(markers.iter().map(|&t| t - start).collect())
}

/// Index of the reference sample nearest to each marker
///
/// Returns `None` when the reference stream has no samples.
pub fn nearest_indices(reference: &[f64], markers: &[f64]) -> Option<Vec<usize>> {
    if reference.is_empty() {
        return None;
    }

    if is_non_decreasing(reference) {
        Some(markers.iter().map(|&t| nearest_sorted(reference, t)).collect())
    } else {
        tracing::warn!(
            "Reference timestamps are not monotonic; using linear nearest-sample search for {} marker(s)",
            markers.len()
        );
        Some(markers.iter().map(|&t| nearest_linear(reference, t)).collect())
    }
}

/// Align `markers` against `reference` with the given policy
pub fn align(policy: AlignPolicy, reference: &[f64], markers: &[f64]) -> Option<Alignment> {
    match policy {
        AlignPolicy::Fast => fast_offsets(reference, markers).map(Alignment::Onsets),
        AlignPolicy::Precise => nearest_indices(reference, markers).map(Alignment::Indices),
    }
}

/// Result of aligning a marker stream; the variant follows the policy
#[derive(Debug, Clone, PartialEq)]
pub enum Alignment {
    /// Seconds from the first reference sample
    Onsets(Vec<f64>),
    /// Reference sample indices
    Indices(Vec<usize>),
}

pub(crate) fn is_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

fn squared_distance(a: f64, b: f64) -> f64 {
    let d = a - b;
    d * d
}

/// Left-to-right scan keeping the first index with the smallest distance
pub(crate) fn nearest_linear(reference: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (j, &t) in reference.iter().enumerate() {
        let distance = squared_distance(t, target);
        if distance < best_distance {
            best = j;
            best_distance = distance;
        }
    }
    best
}

/// Binary-search equivalent of [`nearest_linear`] for non-decreasing input
pub(crate) fn nearest_sorted(reference: &[f64], target: f64) -> usize {
    // First index whose timestamp is >= target; everything before it is smaller
    let upper = reference.partition_point(|&t| t < target);

    if upper == 0 {
        return 0;
    }
    if upper == reference.len() {
        return first_occurrence(reference, upper - 1);
    }

    let lower = upper - 1;
    if squared_distance(reference[lower], target) <= squared_distance(reference[upper], target) {
        first_occurrence(reference, lower)
    } else {
        upper
    }
}

/// Lowest index holding the same timestamp as `reference[index]`
fn first_occurrence(reference: &[f64], index: usize) -> usize {
    let value = reference[index];
    reference[..index].partition_point(|&t| t < value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_search_matches_linear_scan() {
        let reference = [0.0, 0.1, 0.1, 0.1, 0.2, 0.35, 0.5, 0.5, 0.9];
        let targets = [-1.0, 0.0, 0.05, 0.1, 0.12, 0.15, 0.275, 0.3, 0.425, 0.5, 0.7, 0.9, 5.0];

        for &t in &targets {
            assert_eq!(
                nearest_sorted(&reference, t),
                nearest_linear(&reference, t),
                "target {}",
                t
            );
        }
    }

    #[test]
    fn exact_tie_resolves_to_lowest_index() {
        let reference = [0.0, 1.0, 2.0];
        assert_eq!(nearest_sorted(&reference, 0.5), 0);
        assert_eq!(nearest_linear(&reference, 0.5), 0);
    }

    #[test]
    fn nan_marker_maps_to_first_sample() {
        let reference = [0.0, 1.0, 2.0];
        assert_eq!(nearest_linear(&reference, f64::NAN), 0);
    }
}
