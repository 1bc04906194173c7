//! Decision-bias calibration
//!
//! The classifier post-selects a label from an estimated probability plus
//! a scalar bias: predicted label is 1 iff `probability + bias > 0.5`.
//! Calibration searches for the bias minimizing misclassifications over a
//! scored sample set, short-circuiting when the classes are already
//! separable by probability alone.

use thiserror::Error;

/// Errors raised during bias calibration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationError {
    #[error("cannot calibrate bias from an empty scored set")]
    EmptyInput,
}

/// An estimated classification probability paired with the true label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredSample {
    pub probability: f64,
    pub label: u8,
}

impl ScoredSample {
    pub fn new(probability: f64, label: u8) -> Self {
        ScoredSample { probability, label }
    }
}

/// The label selected by a probability estimate under a given bias
pub fn predicted_label(probability: f64, bias: f64) -> u8 {
    if probability + bias > 0.5 {
        1
    } else {
        0
    }
}

/// Count correct and incorrect predictions under `bias`
pub fn tally_hits_misses(pairs: &[ScoredSample], bias: f64) -> (usize, usize) {
    let hits = pairs
        .iter()
        .filter(|s| predicted_label(s.probability, bias) == s.label)
        .count();
    (hits, pairs.len() - hits)
}

/// Indices of the samples misclassified under `bias`
pub fn miss_locations(pairs: &[ScoredSample], bias: f64) -> Vec<usize> {
    pairs
        .iter()
        .enumerate()
        .filter(|(_, s)| predicted_label(s.probability, bias) != s.label)
        .map(|(i, _)| i)
        .collect()
}

#[derive(Clone, Copy)]
struct Candidate {
    bias: f64,
    hits: usize,
    misses: usize,
}

impl Candidate {
    fn at(bias: f64, pairs: &[ScoredSample]) -> Self {
        let (hits, misses) = tally_hits_misses(pairs, bias);
        Candidate { bias, hits, misses }
    }

    /// Cross-multiplied miss-ratio comparison: `other` wins only with a
    /// strictly smaller miss-to-hit ratio, so a candidate classifying more
    /// samples is not discarded over a marginally higher miss count
    fn prefer(self, other: Candidate) -> Candidate {
        if other.misses * self.hits < other.hits * self.misses {
            other
        } else {
            self
        }
    }
}

/// Search for the bias minimizing misclassifications over `pairs`
///
/// When the classes are separable by probability the midpoint bias between
/// them is returned directly. Otherwise a bounded greedy bisection runs
/// between the two biases that each turn one misclassified extreme into a
/// correct call, returning the best candidate seen once improvement
/// stalls, the interval shrinks below `tolerance`, or `max_iterations` is
/// exhausted. `fallback_bias` seeds the search, so re-calibrating with a
/// previous result can never regress.
pub fn adjust_bias(
    pairs: &[ScoredSample],
    fallback_bias: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<f64, CalibrationError> {
    if pairs.is_empty() {
        return Err(CalibrationError::EmptyInput);
    }

    let max0 = pairs
        .iter()
        .filter(|s| s.label == 0)
        .map(|s| s.probability)
        .fold(f64::NAN, f64::max);
    let max0 = if max0.is_nan() { 0.0 } else { max0 };

    let min1 = pairs
        .iter()
        .filter(|s| s.label == 1)
        .map(|s| s.probability)
        .fold(f64::NAN, f64::min);
    let min1 = if min1.is_nan() { 1.0 } else { min1 };

    if max0 <= min1 {
        // Separable: place the threshold exactly between the classes
        return Ok(0.5 * (1.0 - max0 - min1));
    }

    let mut left = 0.5 - max0;
    let mut right = 0.5 - min1;

    let mut left_candidate = Candidate::at(left, pairs);
    let mut right_candidate = Candidate::at(right, pairs);
    let mut best = Candidate::at(fallback_bias, pairs)
        .prefer(left_candidate)
        .prefer(right_candidate);

    for _ in 0..max_iterations {
        if (right - left).abs() < tolerance {
            break;
        }

        let middle = 0.5 * (left + right);
        let middle_candidate = Candidate::at(middle, pairs);
        best = best.prefer(middle_candidate);

        // Move the weaker endpoint only on strict improvement
        let left_is_weaker = left_candidate.misses >= right_candidate.misses;
        let weaker = if left_is_weaker {
            &left_candidate
        } else {
            &right_candidate
        };

        if middle_candidate.misses < weaker.misses {
            if left_is_weaker {
                left = middle;
                left_candidate = middle_candidate;
            } else {
                right = middle;
                right_candidate = middle_candidate;
            }
        } else {
            break;
        }
    }

    Ok(best.bias)
}
