//! Statevector oracle backend
//!
//! Implements the `CircuitOracle` contract by exact state-vector
//! simulation. Exact mode reads probabilities analytically; sampled mode
//! draws independent Bernoulli trials from the analytic probability, which
//! is distributionally identical to re-preparing and measuring the state
//! once per shot.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::quantum::encoding::StateGenerator;
use crate::quantum::oracle::{CircuitOracle, EvaluationMode, OracleError};
use crate::quantum::sequence::GateSequence;
use crate::quantum::state::StateVector;

/// The readout qubit whose |1⟩ probability is the classification output
pub const READOUT_QUBIT: usize = 0;

/// A statevector simulator implementing the circuit oracle contract
#[derive(Debug, Default)]
pub struct StatevectorSimulator {
    // None: thread-local rng per call. Some: seeded stream shared across
    // calls; sampled runs are reproducible only when evaluations happen
    // sequentially, since parallel callers take the lock in arbitrary order.
    rng: Option<Mutex<StdRng>>,
}

impl StatevectorSimulator {
    pub fn new() -> Self {
        StatevectorSimulator { rng: None }
    }

    /// A simulator whose sampled evaluations draw from a seeded generator
    pub fn with_seed(seed: u64) -> Self {
        StatevectorSimulator {
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Qubits needed to hold both the encoded input and the circuit
    fn register_size(encoder: &StateGenerator, gates: &GateSequence) -> usize {
        usize::max(1, usize::max(encoder.n_qubits(), gates.qubit_span()))
    }

    fn check_parameters(gates: &GateSequence, parameters: &[f64]) -> Result<(), OracleError> {
        for gate in gates {
            if gate.parameter_index() >= parameters.len() {
                return Err(OracleError::ParameterOutOfRange {
                    index: gate.parameter_index(),
                    parameter_count: parameters.len(),
                });
            }
        }
        Ok(())
    }

    /// Apply a gate sequence in place, optionally conditioning every gate
    /// on an extra control qubit
    fn apply_sequence(
        state: &mut StateVector,
        gates: &GateSequence,
        parameters: &[f64],
        extra_control: Option<usize>,
    ) -> Result<(), OracleError> {
        for gate in gates {
            let angle = parameters[gate.parameter_index()];
            match extra_control {
                None => {
                    state.apply_rotation(gate.axis(), angle, gate.target(), gate.controls())?;
                }
                Some(control) => {
                    let controlled = gate.with_extra_control(control)?;
                    state.apply_rotation(
                        controlled.axis(),
                        angle,
                        controlled.target(),
                        controlled.controls(),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Analytic P(readout = 1) for the classifier circuit
    fn exact_probability(
        &self,
        gates: &GateSequence,
        parameters: &[f64],
        encoder: &StateGenerator,
    ) -> Result<f64, OracleError> {
        let n = Self::register_size(encoder, gates);
        let mut state = encoder.prepare_register(n)?;
        Self::apply_sequence(&mut state, gates, parameters, None)?;
        Ok(state.probability_of_one(READOUT_QUBIT)?)
    }

    /// Analytic P(aux = 1) for the Hadamard-test circuit
    ///
    /// Circuit on the encoded register plus one auxiliary qubit:
    /// H(aux); C[aux] U₁; X(aux); C[aux] U₂; X(aux); CZ(aux → readout);
    /// H(aux); measure aux.
    fn exact_aux_probability(
        &self,
        gates1: &GateSequence,
        parameters1: &[f64],
        gates2: &GateSequence,
        parameters2: &[f64],
        encoder: &StateGenerator,
    ) -> Result<f64, OracleError> {
        let n = usize::max(
            Self::register_size(encoder, gates1),
            Self::register_size(encoder, gates2),
        );
        let aux = n;

        let mut state = encoder
            .prepare_register(n)?
            .tensor(&StateVector::zero_state(1));

        state.apply_hadamard(aux)?;
        Self::apply_sequence(&mut state, gates1, parameters1, Some(aux))?;
        state.apply_x(aux)?;
        Self::apply_sequence(&mut state, gates2, parameters2, Some(aux))?;
        state.apply_x(aux)?;
        state.apply_phase_flip(READOUT_QUBIT, &[aux])?;
        state.apply_hadamard(aux)?;

        Ok(state.probability_of_one(aux)?)
    }

    /// Estimate a probability as the mean of independent Bernoulli trials
    fn sample_frequency(&self, probability: f64, shots: usize) -> Result<f64, OracleError> {
        let p = probability.clamp(0.0, 1.0);

        let count = match &self.rng {
            Some(rng) => {
                let mut rng = rng
                    .lock()
                    .map_err(|_| OracleError::Execution("rng mutex poisoned".into()))?;
                (0..shots).filter(|_| rng.gen::<f64>() < p).count()
            }
            None => {
                let mut rng = rand::thread_rng();
                (0..shots).filter(|_| rng.gen::<f64>() < p).count()
            }
        };

        Ok(count as f64 / shots as f64)
    }
}

impl CircuitOracle for StatevectorSimulator {
    fn evaluate(
        &self,
        gates: &GateSequence,
        parameters: &[f64],
        encoder: &StateGenerator,
        mode: EvaluationMode,
    ) -> Result<f64, OracleError> {
        mode.validate()?;
        Self::check_parameters(gates, parameters)?;

        let probability = self.exact_probability(gates, parameters, encoder)?;
        match mode {
            EvaluationMode::Exact => Ok(probability),
            EvaluationMode::Sampled { shots } => self.sample_frequency(probability, shots),
        }
    }

    fn overlap(
        &self,
        gates1: &GateSequence,
        parameters1: &[f64],
        gates2: &GateSequence,
        parameters2: &[f64],
        encoder: &StateGenerator,
        mode: EvaluationMode,
    ) -> Result<f64, OracleError> {
        mode.validate()?;
        Self::check_parameters(gates1, parameters1)?;
        Self::check_parameters(gates2, parameters2)?;

        let aux_probability =
            self.exact_aux_probability(gates1, parameters1, gates2, parameters2, encoder)?;

        match mode {
            EvaluationMode::Exact => Ok(1.0 - 2.0 * aux_probability),
            EvaluationMode::Sampled { shots } => {
                let frequency = self.sample_frequency(aux_probability, shots)?;
                Ok(1.0 - 2.0 * frequency)
            }
        }
    }
}
