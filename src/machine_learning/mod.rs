//! Classical estimation and training layer
//!
//! Everything above the circuit oracle: labeled data and sampling
//! schedules, parameter-shift gradient estimation, decision-bias
//! calibration, and the stochastic mini-batch training loop.

pub mod dataset;
pub mod gradient;
pub mod bias;
pub mod trainer;

pub use dataset::{
    extract_minibatch, samples_from_flat, samples_to_flat, DatasetError, LabeledSample,
    SamplingSchedule,
};
pub use gradient::estimate_gradient;
pub use bias::{
    adjust_bias, miss_locations, predicted_label, tally_hits_misses, CalibrationError,
    ScoredSample,
};
pub use trainer::{
    classification_probabilities, classify, train, train_with_restarts, CancellationToken,
    EncodingStrategy, SequentialClassifier, StoppingCriterion, TrainingError, TrainingOptions,
    TrainingResult,
};
