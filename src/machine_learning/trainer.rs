//! Stochastic training loop
//!
//! Drives mini-batch gradient descent over a classifier's parameter
//! vector, with periodic rescoring and bias recalibration against a
//! scoring schedule. All validation happens up front, before the first
//! oracle call; an oracle failure aborts the run with no silent retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::machine_learning::bias::{
    adjust_bias, predicted_label, tally_hits_misses, CalibrationError, ScoredSample,
};
use crate::machine_learning::dataset::{DatasetError, LabeledSample, SamplingSchedule};
use crate::machine_learning::gradient::estimate_gradient;
use crate::quantum::encoding::{EncodingError, StateGenerator};
use crate::quantum::oracle::{CircuitOracle, EvaluationMode, OracleError};
use crate::quantum::sequence::GateSequence;

const BIAS_SEARCH_TOLERANCE: f64 = 1e-5;
const BIAS_SEARCH_ITERATIONS: usize = 100;

/// Errors raised by the training loop
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("invalid training input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("training run was cancelled")]
    Cancelled,
}

/// A trained (or trainable) classifier: circuit structure, parameter
/// vector, and decision bias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialClassifier {
    gates: GateSequence,
    parameters: Vec<f64>,
    bias: f64,
}

impl SequentialClassifier {
    /// Create a classifier, validating that every gate's parameter index
    /// falls inside the parameter vector
    pub fn new(
        gates: GateSequence,
        parameters: Vec<f64>,
        bias: f64,
    ) -> Result<Self, TrainingError> {
        if gates.parameter_span() > parameters.len() {
            return Err(TrainingError::InvalidInput(format!(
                "circuit references parameter index {} but only {} parameters were supplied",
                gates.parameter_span() - 1,
                parameters.len()
            )));
        }
        Ok(SequentialClassifier {
            gates,
            parameters,
            bias,
        })
    }

    pub fn gates(&self) -> &GateSequence {
        &self.gates
    }

    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Label selected for an estimated classification probability
    pub fn predicted_label(&self, probability: f64) -> u8 {
        predicted_label(probability, self.bias)
    }
}

/// How classical features are encoded onto the register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingStrategy {
    /// Normalized feature amplitudes, zero-padded to a power of two
    Amplitude,
    /// One qubit per feature, rotated by Ry(feature)
    Angle,
}

impl EncodingStrategy {
    fn generator(&self, features: &[f64]) -> Result<StateGenerator, EncodingError> {
        match self {
            EncodingStrategy::Amplitude => StateGenerator::amplitude_encoding(features),
            EncodingStrategy::Angle => StateGenerator::angle_encoding(features),
        }
    }
}

/// Early-stop predicate, evaluated at rescoring checkpoints only
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoppingCriterion {
    /// Run until the epoch cap
    Never,
    /// Stop once the scoring miss rate falls to the threshold or below
    MissRateBelow(f64),
}

impl StoppingCriterion {
    fn met(&self, misses: usize, scored: usize) -> bool {
        match self {
            StoppingCriterion::Never => false,
            StoppingCriterion::MissRateBelow(threshold) => {
                scored > 0 && misses as f64 / scored as f64 <= *threshold
            }
        }
    }
}

/// Cooperative cancellation handle, checked between mini-batches
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Hyperparameters and policies for one training run
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub learning_rate: f64,
    pub minibatch_size: usize,
    pub max_epochs: usize,
    /// Rescore and recalibrate the bias every this many epochs
    pub scoring_period: usize,
    pub mode: EvaluationMode,
    pub encoding: EncodingStrategy,
    pub stop: StoppingCriterion,
    pub cancel: Option<CancellationToken>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            learning_rate: 0.1,
            minibatch_size: 8,
            max_epochs: 16,
            scoring_period: 4,
            mode: EvaluationMode::Exact,
            encoding: EncodingStrategy::Amplitude,
            stop: StoppingCriterion::MissRateBelow(0.0),
            cancel: None,
        }
    }
}

impl TrainingOptions {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_minibatch_size(mut self, minibatch_size: usize) -> Self {
        self.minibatch_size = minibatch_size;
        self
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    pub fn with_scoring_period(mut self, scoring_period: usize) -> Self {
        self.scoring_period = scoring_period;
        self
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingStrategy) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_stop(mut self, stop: StoppingCriterion) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn validate(&self) -> Result<(), TrainingError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainingError::InvalidInput(
                "learning rate must be finite and positive".into(),
            ));
        }
        if self.minibatch_size == 0 {
            return Err(TrainingError::InvalidInput(
                "mini-batch size must be non-zero".into(),
            ));
        }
        if self.scoring_period == 0 {
            return Err(TrainingError::InvalidInput(
                "scoring period must be non-zero".into(),
            ));
        }
        self.mode.validate()?;
        Ok(())
    }
}

/// Outcome of a training run: the best model seen at a scoring
/// checkpoint, with its hit/miss tallies
///
/// `epochs_run` is the epoch at which the returned model was last
/// confirmed as the best, zero when the initial calibration was never
/// improved upon.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingResult {
    pub model: SequentialClassifier,
    pub hits: usize,
    pub misses: usize,
    pub epochs_run: usize,
}

/// Classification probabilities for the scheduled samples, in schedule
/// order
pub fn classification_probabilities<O>(
    oracle: &O,
    model: &SequentialClassifier,
    samples: &[LabeledSample],
    schedule: &SamplingSchedule,
    mode: EvaluationMode,
    encoding: EncodingStrategy,
) -> Result<Vec<f64>, TrainingError>
where
    O: CircuitOracle + ?Sized,
{
    schedule.check_bounds(samples.len())?;

    let indices: Vec<usize> = schedule.indices().collect();
    let probabilities = indices
        .par_iter()
        .map(|&i| -> Result<f64, TrainingError> {
            let encoder = encoding.generator(samples[i].features())?;
            Ok(oracle.evaluate(model.gates(), model.parameters(), &encoder, mode)?)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(probabilities)
}

/// Predicted labels for the scheduled samples, using the model's bias
pub fn classify<O>(
    oracle: &O,
    model: &SequentialClassifier,
    samples: &[LabeledSample],
    schedule: &SamplingSchedule,
    mode: EvaluationMode,
    encoding: EncodingStrategy,
) -> Result<Vec<u8>, TrainingError>
where
    O: CircuitOracle + ?Sized,
{
    let probabilities =
        classification_probabilities(oracle, model, samples, schedule, mode, encoding)?;
    Ok(probabilities
        .iter()
        .map(|&p| model.predicted_label(p))
        .collect())
}

/// Score the model over the scoring schedule and recalibrate its bias
fn score_and_calibrate<O>(
    oracle: &O,
    model: &SequentialClassifier,
    samples: &[LabeledSample],
    schedule: &SamplingSchedule,
    mode: EvaluationMode,
    encoding: EncodingStrategy,
) -> Result<(f64, usize, usize), TrainingError>
where
    O: CircuitOracle + ?Sized,
{
    let probabilities =
        classification_probabilities(oracle, model, samples, schedule, mode, encoding)?;
    let pairs: Vec<ScoredSample> = schedule
        .indices()
        .zip(probabilities.iter())
        .map(|(i, &p)| ScoredSample::new(p, samples[i].label()))
        .collect();

    let bias = adjust_bias(
        &pairs,
        model.bias(),
        BIAS_SEARCH_TOLERANCE,
        BIAS_SEARCH_ITERATIONS,
    )?;
    let (hits, misses) = tally_hits_misses(&pairs, bias);
    Ok((bias, hits, misses))
}

/// Averaged signed batch gradient: positive-label samples pull their
/// classification probability up, negative-label samples push it down
fn batch_gradient<O>(
    oracle: &O,
    model: &SequentialClassifier,
    samples: &[LabeledSample],
    batch: &[usize],
    mode: EvaluationMode,
    encoding: EncodingStrategy,
) -> Result<Vec<f64>, TrainingError>
where
    O: CircuitOracle + ?Sized,
{
    let parameter_count = model.parameters().len();
    let summed = batch
        .par_iter()
        .map(|&i| -> Result<Vec<f64>, TrainingError> {
            let sample = &samples[i];
            let encoder = encoding.generator(sample.features())?;
            let gradient =
                estimate_gradient(oracle, model.gates(), model.parameters(), &encoder, mode)?;

            let sign = if sample.label() == 1 { -1.0 } else { 1.0 };
            Ok(gradient.into_iter().map(|g| sign * g).collect())
        })
        .try_reduce(
            || vec![0.0; parameter_count],
            |mut acc, g| {
                for (a, x) in acc.iter_mut().zip(g.iter()) {
                    *a += x;
                }
                Ok(acc)
            },
        )?;

    let scale = 1.0 / batch.len() as f64;
    Ok(summed.into_iter().map(|g| g * scale).collect())
}

/// Train a classifier by stochastic mini-batch gradient descent
///
/// Returns the best `(parameters, bias)` observed at a rescoring
/// checkpoint, together with its scoring-set tallies. The run ends at the
/// epoch cap, when the stopping criterion is met, or with
/// [`TrainingError::Cancelled`] if the cancellation token fires.
pub fn train<O>(
    oracle: &O,
    samples: &[LabeledSample],
    training_schedule: &SamplingSchedule,
    scoring_schedule: &SamplingSchedule,
    initial: SequentialClassifier,
    options: &TrainingOptions,
) -> Result<TrainingResult, TrainingError>
where
    O: CircuitOracle + ?Sized,
{
    options.validate()?;
    if samples.is_empty() {
        return Err(TrainingError::InvalidInput("no samples supplied".into()));
    }
    if training_schedule.is_empty() {
        return Err(TrainingError::InvalidInput(
            "training schedule is empty".into(),
        ));
    }
    if scoring_schedule.is_empty() {
        return Err(TrainingError::InvalidInput(
            "scoring schedule is empty".into(),
        ));
    }
    training_schedule.check_bounds(samples.len())?;
    scoring_schedule.check_bounds(samples.len())?;

    let mut model = initial;
    let scored = scoring_schedule.len();

    let (bias, hits, misses) = score_and_calibrate(
        oracle,
        &model,
        samples,
        scoring_schedule,
        options.mode,
        options.encoding,
    )?;
    model.bias = bias;

    let mut best = TrainingResult {
        model: model.clone(),
        hits,
        misses,
        epochs_run: 0,
    };
    if options.stop.met(misses, scored) {
        info!(misses, "initial model already satisfies stopping criterion");
        return Ok(best);
    }

    let batches = training_schedule.minibatches(options.minibatch_size)?;

    for epoch in 1..=options.max_epochs {
        for batch in &batches {
            if let Some(token) = &options.cancel {
                if token.is_cancelled() {
                    return Err(TrainingError::Cancelled);
                }
            }

            let gradient = batch_gradient(
                oracle,
                &model,
                samples,
                batch,
                options.mode,
                options.encoding,
            )?;
            for (p, g) in model.parameters.iter_mut().zip(gradient.iter()) {
                *p -= options.learning_rate * g;
            }
        }

        if epoch % options.scoring_period == 0 || epoch == options.max_epochs {
            let (bias, hits, misses) = score_and_calibrate(
                oracle,
                &model,
                samples,
                scoring_schedule,
                options.mode,
                options.encoding,
            )?;
            model.bias = bias;
            debug!(epoch, hits, misses, "rescored model");

            if misses < best.misses {
                best = TrainingResult {
                    model: model.clone(),
                    hits,
                    misses,
                    epochs_run: epoch,
                };
            }

            if options.stop.met(misses, scored) {
                info!(epoch, misses, "stopping criterion met");
                return Ok(best);
            }
        }
    }

    Ok(best)
}

/// Train from several initial models and keep the best outcome
///
/// Runs stop early as soon as one restart reaches zero scoring misses.
pub fn train_with_restarts<O>(
    oracle: &O,
    samples: &[LabeledSample],
    training_schedule: &SamplingSchedule,
    scoring_schedule: &SamplingSchedule,
    initials: Vec<SequentialClassifier>,
    options: &TrainingOptions,
) -> Result<TrainingResult, TrainingError>
where
    O: CircuitOracle + ?Sized,
{
    if initials.is_empty() {
        return Err(TrainingError::InvalidInput(
            "at least one initial model is required".into(),
        ));
    }

    let mut best: Option<TrainingResult> = None;
    for (restart, initial) in initials.into_iter().enumerate() {
        let result = train(
            oracle,
            samples,
            training_schedule,
            scoring_schedule,
            initial,
            options,
        )?;
        debug!(restart, misses = result.misses, "restart finished");

        let improved = best
            .as_ref()
            .map(|b| result.misses < b.misses)
            .unwrap_or(true);
        if improved {
            best = Some(result);
        }
        if let Some(b) = &best {
            if b.misses == 0 {
                break;
            }
        }
    }

    // invariant: initials was non-empty, so a result exists
    best.ok_or_else(|| TrainingError::InvalidInput("no training run produced a result".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::gate::{ControlledRotation, PauliAxis};

    #[test]
    fn test_classifier_rejects_out_of_range_parameter_index() {
        let gates = GateSequence::new(vec![
            ControlledRotation::new(3, PauliAxis::Y, 0, vec![]).unwrap(),
        ]);
        let result = SequentialClassifier::new(gates, vec![0.0, 0.0], 0.0);
        assert!(matches!(result, Err(TrainingError::InvalidInput(_))));
    }

    #[test]
    fn test_stopping_criterion_thresholds() {
        assert!(!StoppingCriterion::Never.met(0, 10));
        assert!(StoppingCriterion::MissRateBelow(0.0).met(0, 10));
        assert!(!StoppingCriterion::MissRateBelow(0.0).met(1, 10));
        assert!(StoppingCriterion::MissRateBelow(0.2).met(2, 10));
        assert!(!StoppingCriterion::MissRateBelow(0.2).met(3, 10));
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_options_validation() {
        assert!(TrainingOptions::default().validate().is_ok());
        assert!(TrainingOptions::default()
            .with_learning_rate(f64::NAN)
            .validate()
            .is_err());
        assert!(TrainingOptions::default()
            .with_minibatch_size(0)
            .validate()
            .is_err());
    }
}
