//! Classical feature encoding
//!
//! A `StateGenerator` pairs a required qubit count with a procedure that
//! prepares a feature-encoded register. Generators are constructed per
//! sample and consumed once per oracle evaluation; they are `Send + Sync`
//! so mini-batch evaluations can run in parallel.

use std::fmt;
use std::sync::Arc;

use ndarray::Array1;
use num_complex::Complex64;
use thiserror::Error;

use crate::quantum::gate::PauliAxis;
use crate::quantum::state::{StateError, StateVector};

/// Errors raised while encoding features into a register
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("cannot encode an empty feature vector")]
    EmptyFeatures,

    #[error("feature vector has zero norm")]
    ZeroNorm,

    #[error("encoder prepares {prepared} qubits but declares {declared}")]
    QubitCountMismatch { prepared: usize, declared: usize },

    #[error(transparent)]
    State(#[from] StateError),
}

type PrepareFn = dyn Fn() -> Result<StateVector, EncodingError> + Send + Sync;

/// A feature-encoded state preparation bound to a qubit requirement
#[derive(Clone)]
pub struct StateGenerator {
    n_qubits: usize,
    prepare: Arc<PrepareFn>,
}

impl fmt::Debug for StateGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateGenerator")
            .field("n_qubits", &self.n_qubits)
            .finish()
    }
}

impl StateGenerator {
    /// Wrap a custom preparation procedure
    pub fn new<F>(n_qubits: usize, prepare: F) -> Self
    where
        F: Fn() -> Result<StateVector, EncodingError> + Send + Sync + 'static,
    {
        StateGenerator {
            n_qubits,
            prepare: Arc::new(prepare),
        }
    }

    /// Amplitude encoding: features become amplitudes, normalized and
    /// zero-padded to the next power of two
    pub fn amplitude_encoding(features: &[f64]) -> Result<Self, EncodingError> {
        if features.is_empty() {
            return Err(EncodingError::EmptyFeatures);
        }

        let norm_sqr: f64 = features.iter().map(|x| x * x).sum();
        if norm_sqr < 1e-20 {
            return Err(EncodingError::ZeroNorm);
        }
        let norm = norm_sqr.sqrt();

        let n_qubits = usize::max(1, features.len().next_power_of_two().trailing_zeros() as usize);
        let dim = 1usize << n_qubits;

        let mut amplitudes = Array1::zeros(dim);
        for (i, &x) in features.iter().enumerate() {
            amplitudes[i] = Complex64::new(x / norm, 0.0);
        }

        Ok(StateGenerator::new(n_qubits, move || {
            Ok(StateVector::new(n_qubits, amplitudes.clone())?)
        }))
    }

    /// Angle encoding: one qubit per feature, each rotated by Ry(feature)
    /// from |0⟩
    pub fn angle_encoding(features: &[f64]) -> Result<Self, EncodingError> {
        if features.is_empty() {
            return Err(EncodingError::EmptyFeatures);
        }

        let n_qubits = features.len();
        let angles = features.to_vec();

        Ok(StateGenerator::new(n_qubits, move || {
            let mut state = StateVector::zero_state(n_qubits);
            for (q, &theta) in angles.iter().enumerate() {
                state.apply_rotation(PauliAxis::Y, theta, q, &[])?;
            }
            Ok(state)
        }))
    }

    /// Number of qubits the encoding requires
    pub fn n_qubits(&self) -> usize {
        self.n_qubits
    }

    /// Prepare the encoded state on exactly `n_qubits()` qubits
    pub fn prepare(&self) -> Result<StateVector, EncodingError> {
        let state = (self.prepare)()?;
        if state.qubit_count() != self.n_qubits {
            return Err(EncodingError::QubitCountMismatch {
                prepared: state.qubit_count(),
                declared: self.n_qubits,
            });
        }
        Ok(state)
    }

    /// Prepare the encoded state embedded into a register of
    /// `total_qubits >= n_qubits()`, padding the extra (trailing) qubits
    /// with |0⟩
    pub fn prepare_register(&self, total_qubits: usize) -> Result<StateVector, EncodingError> {
        let state = self.prepare()?;
        if total_qubits < self.n_qubits {
            return Err(EncodingError::QubitCountMismatch {
                prepared: self.n_qubits,
                declared: total_qubits,
            });
        }
        if total_qubits == self.n_qubits {
            return Ok(state);
        }
        Ok(state.tensor(&StateVector::zero_state(total_qubits - self.n_qubits)))
    }
}
