//! Labeled samples and sampling schedules
//!
//! Samples and schedules cross the external boundary as parallel flat
//! arrays; the constructors here validate shapes once so that the training
//! loop can index without further checks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by dataset and schedule validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("feature rows ({features}) and labels ({labels}) differ in length")]
    LengthMismatch { features: usize, labels: usize },

    #[error("label {0} is not binary (expected 0 or 1)")]
    InvalidLabel(i64),

    #[error("sample index {index} out of bounds for {len} samples")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("mini-batch start {start} past end of {len} locations")]
    BatchStartOutOfBounds { start: usize, len: usize },

    #[error("mini-batch size must be non-zero")]
    EmptyBatchSize,
}

/// A classical feature vector with its binary label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    features: Vec<f64>,
    label: u8,
}

impl LabeledSample {
    pub fn new(features: Vec<f64>, label: i64) -> Result<Self, DatasetError> {
        if label != 0 && label != 1 {
            return Err(DatasetError::InvalidLabel(label));
        }
        Ok(LabeledSample {
            features,
            label: label as u8,
        })
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn label(&self) -> u8 {
        self.label
    }
}

/// Combine parallel feature and label arrays into labeled samples
pub fn samples_from_flat(
    features: Vec<Vec<f64>>,
    labels: &[i64],
) -> Result<Vec<LabeledSample>, DatasetError> {
    if features.len() != labels.len() {
        return Err(DatasetError::LengthMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }

    features
        .into_iter()
        .zip(labels.iter())
        .map(|(f, &l)| LabeledSample::new(f, l))
        .collect()
}

/// Split labeled samples back into parallel flat arrays
pub fn samples_to_flat(samples: &[LabeledSample]) -> (Vec<Vec<f64>>, Vec<i64>) {
    let features = samples.iter().map(|s| s.features.clone()).collect();
    let labels = samples.iter().map(|s| s.label as i64).collect();
    (features, labels)
}

/// An ordered partition of sample indices into ranges
///
/// Each inner sequence is consumed range by range when forming
/// mini-batches; no uniqueness of indices is assumed beyond what the
/// caller supplies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SamplingSchedule {
    ranges: Vec<Vec<usize>>,
}

impl SamplingSchedule {
    pub fn new(ranges: Vec<Vec<usize>>) -> Self {
        SamplingSchedule { ranges }
    }

    /// Decode from the flat boundary form (identical shape)
    pub fn from_flat(flat: Vec<Vec<usize>>) -> Self {
        SamplingSchedule { ranges: flat }
    }

    /// Re-encode to the flat boundary form
    pub fn to_flat(&self) -> Vec<Vec<usize>> {
        self.ranges.clone()
    }

    pub fn ranges(&self) -> &[Vec<usize>] {
        &self.ranges
    }

    /// Total number of scheduled indices
    pub fn len(&self) -> usize {
        self.ranges.iter().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.iter().all(|r| r.is_empty())
    }

    /// All scheduled indices in order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flatten().copied()
    }

    /// Partition each range into mini-batches of at most `size` indices;
    /// the tail batch of a range may be shorter
    pub fn minibatches(&self, size: usize) -> Result<Vec<Vec<usize>>, DatasetError> {
        if size == 0 {
            return Err(DatasetError::EmptyBatchSize);
        }
        Ok(self
            .ranges
            .iter()
            .flat_map(|range| range.chunks(size))
            .map(|chunk| chunk.to_vec())
            .collect())
    }

    /// Validate every scheduled index against a sample count
    pub fn check_bounds(&self, sample_count: usize) -> Result<(), DatasetError> {
        for index in self.indices() {
            if index >= sample_count {
                return Err(DatasetError::IndexOutOfBounds {
                    index,
                    len: sample_count,
                });
            }
        }
        Ok(())
    }
}

/// Select up to `size` samples addressed by `locations[start..]`
///
/// Returns fewer than `size` samples when the tail of `locations` is
/// shorter than a full batch.
pub fn extract_minibatch<'a>(
    size: usize,
    start: usize,
    locations: &[usize],
    samples: &'a [LabeledSample],
) -> Result<Vec<&'a LabeledSample>, DatasetError> {
    if size == 0 {
        return Err(DatasetError::EmptyBatchSize);
    }
    if start > locations.len() {
        return Err(DatasetError::BatchStartOutOfBounds {
            start,
            len: locations.len(),
        });
    }

    let end = usize::min(start + size, locations.len());
    locations[start..end]
        .iter()
        .map(|&loc| {
            samples.get(loc).ok_or(DatasetError::IndexOutOfBounds {
                index: loc,
                len: samples.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set(n: usize) -> Vec<LabeledSample> {
        (0..n)
            .map(|i| LabeledSample::new(vec![i as f64], (i % 2) as i64).unwrap())
            .collect()
    }

    #[test]
    fn test_flat_sample_round_trip() {
        let features = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        let labels = vec![0, 1];
        let samples = samples_from_flat(features.clone(), &labels).unwrap();
        assert_eq!(samples_to_flat(&samples), (features, labels));
    }

    #[test]
    fn test_mismatched_flat_arrays_rejected() {
        let result = samples_from_flat(vec![vec![1.0]], &[0, 1]);
        assert!(matches!(
            result,
            Err(DatasetError::LengthMismatch {
                features: 1,
                labels: 2
            })
        ));
    }

    #[test]
    fn test_extract_minibatch_full_and_tail() {
        let samples = sample_set(5);
        let locations = [0, 1, 2, 3, 4];

        let full = extract_minibatch(3, 0, &locations, &samples).unwrap();
        assert_eq!(full.len(), 3);
        assert_eq!(full[2].features(), &[2.0]);

        let tail = extract_minibatch(3, 3, &locations, &samples).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].features(), &[4.0]);
    }

    #[test]
    fn test_minibatches_respect_range_boundaries() {
        let schedule = SamplingSchedule::new(vec![vec![0, 1, 2, 3, 4], vec![5, 6]]);
        let batches = schedule.minibatches(2).unwrap();
        assert_eq!(
            batches,
            vec![vec![0, 1], vec![2, 3], vec![4], vec![5, 6]]
        );
    }

    #[test]
    fn test_schedule_round_trip() {
        let flat = vec![vec![3, 1], vec![], vec![0, 2]];
        let schedule = SamplingSchedule::from_flat(flat.clone());
        assert_eq!(schedule.to_flat(), flat);
        assert_eq!(schedule.len(), 4);
    }
}
