//! Circuit oracle contract
//!
//! The estimation and training layers never evolve quantum state directly;
//! they talk to a `CircuitOracle` that evaluates a parametrized circuit and
//! reports either an analytic probability or a frequency estimated from
//! repeated measurement. The bundled statevector backend lives in
//! `crate::simulators`; a physical device adapter would implement the same
//! trait.

use thiserror::Error;

use crate::quantum::encoding::{EncodingError, StateGenerator};
use crate::quantum::gate::GateError;
use crate::quantum::sequence::GateSequence;
use crate::quantum::state::StateError;

/// How a probability estimate is obtained
///
/// This replaces the `shot_budget == 0` sentinel convention of flat
/// boundary encodings; use [`EvaluationMode::from_shots`] to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Analytic expectation from exact simulation
    Exact,
    /// Mean of `shots` independent measurement trials, the state re-prepared
    /// for each trial
    Sampled { shots: usize },
}

impl EvaluationMode {
    /// Translate the boundary sentinel: zero shots means exact evaluation
    pub fn from_shots(shots: usize) -> Self {
        if shots == 0 {
            EvaluationMode::Exact
        } else {
            EvaluationMode::Sampled { shots }
        }
    }

    /// Validate the mode before any state preparation happens
    pub fn validate(&self) -> Result<(), OracleError> {
        match self {
            EvaluationMode::Sampled { shots: 0 } => Err(OracleError::ZeroShots),
            _ => Ok(()),
        }
    }
}

/// Errors raised by oracle backends
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("sampled evaluation requires a non-zero shot count")]
    ZeroShots,

    #[error("gate parameter index {index} out of range for {parameter_count} parameters")]
    ParameterOutOfRange {
        index: usize,
        parameter_count: usize,
    },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    State(#[from] StateError),

    /// Failure inside an external execution engine; fatal for the current
    /// evaluation, never silently retried
    #[error("oracle execution failed: {0}")]
    Execution(String),
}

/// Evaluates parametrized circuits against encoded feature states
///
/// The readout qubit for classification probabilities is qubit 0.
pub trait CircuitOracle: Send + Sync {
    /// Probability that the readout qubit measures 1 after preparing the
    /// encoded state and applying `gates` with `parameters`
    fn evaluate(
        &self,
        gates: &GateSequence,
        parameters: &[f64],
        encoder: &StateGenerator,
        mode: EvaluationMode,
    ) -> Result<f64, OracleError>;

    /// Hadamard-test interference estimate `1 - 2·P(aux = 1)` between the
    /// states prepared by `(gates1, parameters1)` and `(gates2,
    /// parameters2)` from the same encoded input
    ///
    /// Analytically this equals `Re⟨ψ₂| Z_readout |ψ₁⟩`.
    #[allow(clippy::too_many_arguments)]
    fn overlap(
        &self,
        gates1: &GateSequence,
        parameters1: &[f64],
        gates2: &GateSequence,
        parameters2: &[f64],
        encoder: &StateGenerator,
        mode: EvaluationMode,
    ) -> Result<f64, OracleError>;
}
