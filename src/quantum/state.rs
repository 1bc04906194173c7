//! State-vector representation
//!
//! Dense complex amplitudes over the computational basis, with the in-place
//! gate kernels needed by the simulator backend: controlled rotations about
//! a Pauli axis, Hadamard, X, and controlled phase flips. Qubit indexing is
//! big-endian: qubit 0 is the most significant bit of a basis index.

use ndarray::Array1;
use num_complex::Complex64;
use thiserror::Error;

use crate::quantum::gate::PauliAxis;

const NORMALIZATION_TOLERANCE: f64 = 1e-10;

/// Errors raised by state construction and qubit addressing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("state vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("state vector is not normalized (norm² = {0})")]
    NotNormalized(f64),

    #[error("basis index {index} out of range for {qubit_count}-qubit state")]
    BasisIndexOutOfRange { index: usize, qubit_count: usize },

    #[error("qubit index {qubit} out of range for {qubit_count}-qubit state")]
    QubitOutOfRange { qubit: usize, qubit_count: usize },
}

/// A pure quantum state as a vector of complex amplitudes
#[derive(Debug, Clone)]
pub struct StateVector {
    qubit_count: usize,
    amplitudes: Array1<Complex64>,
}

impl StateVector {
    /// Create a state vector from amplitudes, validating dimension and
    /// normalization
    pub fn new(qubit_count: usize, amplitudes: Array1<Complex64>) -> Result<Self, StateError> {
        let expected = 1usize << qubit_count;
        if amplitudes.len() != expected {
            return Err(StateError::DimensionMismatch {
                expected,
                actual: amplitudes.len(),
            });
        }

        let norm_sqr: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum();
        if (norm_sqr - 1.0).abs() > NORMALIZATION_TOLERANCE {
            return Err(StateError::NotNormalized(norm_sqr));
        }

        Ok(StateVector {
            qubit_count,
            amplitudes,
        })
    }

    /// The computational basis state |index⟩
    pub fn computational_basis(qubit_count: usize, index: usize) -> Result<Self, StateError> {
        let dim = 1usize << qubit_count;
        if index >= dim {
            return Err(StateError::BasisIndexOutOfRange { index, qubit_count });
        }

        let mut amplitudes = Array1::zeros(dim);
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Ok(StateVector {
            qubit_count,
            amplitudes,
        })
    }

    /// The all-zeros state |00...0⟩
    pub fn zero_state(qubit_count: usize) -> Self {
        let mut amplitudes = Array1::zeros(1usize << qubit_count);
        amplitudes[0] = Complex64::new(1.0, 0.0);
        StateVector {
            qubit_count,
            amplitudes,
        }
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    /// Dimension of the Hilbert space (2^n)
    pub fn dimension(&self) -> usize {
        1 << self.qubit_count
    }

    pub fn amplitudes(&self) -> &Array1<Complex64> {
        &self.amplitudes
    }

    /// Probability of observing the given basis state
    pub fn probability(&self, basis_index: usize) -> f64 {
        if basis_index >= self.dimension() {
            return 0.0;
        }
        self.amplitudes[basis_index].norm_sqr()
    }

    /// Inner product ⟨self|other⟩
    pub fn inner_product(&self, other: &Self) -> Result<Complex64, StateError> {
        if self.qubit_count != other.qubit_count {
            return Err(StateError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }

        Ok(self
            .amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// Tensor product, with `self` occupying the most significant qubits
    pub fn tensor(&self, other: &Self) -> Self {
        let other_dim = other.dimension();
        let mut amplitudes = Array1::zeros(self.dimension() * other_dim);

        for (i, a) in self.amplitudes.iter().enumerate() {
            for (k, b) in other.amplitudes.iter().enumerate() {
                amplitudes[i * other_dim + k] = a * b;
            }
        }

        StateVector {
            qubit_count: self.qubit_count + other.qubit_count,
            amplitudes,
        }
    }

    /// Bit mask selecting `qubit` within a basis index (big-endian)
    fn qubit_mask(&self, qubit: usize) -> Result<usize, StateError> {
        if qubit >= self.qubit_count {
            return Err(StateError::QubitOutOfRange {
                qubit,
                qubit_count: self.qubit_count,
            });
        }
        Ok(1usize << (self.qubit_count - 1 - qubit))
    }

    /// Combined mask for a set of control qubits
    fn controls_mask(&self, controls: &[usize]) -> Result<usize, StateError> {
        let mut mask = 0usize;
        for &c in controls {
            mask |= self.qubit_mask(c)?;
        }
        Ok(mask)
    }

    /// Probability that measuring `qubit` yields 1
    pub fn probability_of_one(&self, qubit: usize) -> Result<f64, StateError> {
        let mask = self.qubit_mask(qubit)?;
        Ok(self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum())
    }

    /// Apply `R(θ) = exp(-i θ σ / 2)` about `axis` to `target`, conditioned
    /// on every qubit in `controls` being 1
    ///
    /// A `PauliAxis::I` rotation multiplies the controlled subspace by the
    /// phase `exp(-i θ / 2)`.
    pub fn apply_rotation(
        &mut self,
        axis: PauliAxis,
        angle: f64,
        target: usize,
        controls: &[usize],
    ) -> Result<(), StateError> {
        let target_mask = self.qubit_mask(target)?;
        let controls_mask = self.controls_mask(controls)?;

        let half = angle / 2.0;
        let cos = half.cos();
        let sin = half.sin();

        match axis {
            PauliAxis::I => {
                let phase = Complex64::new(cos, -sin);
                for (i, amp) in self.amplitudes.iter_mut().enumerate() {
                    if i & controls_mask == controls_mask {
                        *amp *= phase;
                    }
                }
            }
            PauliAxis::X => {
                let m = Complex64::new(0.0, -sin);
                self.apply_pair_kernel(target_mask, controls_mask, |a, b| {
                    (cos * a + m * b, m * a + cos * b)
                });
            }
            PauliAxis::Y => {
                self.apply_pair_kernel(target_mask, controls_mask, |a, b| {
                    (cos * a - sin * b, sin * a + cos * b)
                });
            }
            PauliAxis::Z => {
                let phase0 = Complex64::new(cos, -sin);
                let phase1 = Complex64::new(cos, sin);
                for (i, amp) in self.amplitudes.iter_mut().enumerate() {
                    if i & controls_mask == controls_mask {
                        *amp *= if i & target_mask == 0 { phase0 } else { phase1 };
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply a 2x2 kernel across each (|0⟩, |1⟩) amplitude pair of the
    /// target qubit within the controlled subspace
    fn apply_pair_kernel<F>(&mut self, target_mask: usize, controls_mask: usize, kernel: F)
    where
        F: Fn(Complex64, Complex64) -> (Complex64, Complex64),
    {
        for i in 0..self.dimension() {
            if i & target_mask == 0 && i & controls_mask == controls_mask {
                let j = i | target_mask;
                let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
                let (a2, b2) = kernel(a, b);
                self.amplitudes[i] = a2;
                self.amplitudes[j] = b2;
            }
        }
    }

    /// Apply a Hadamard gate to `qubit`
    pub fn apply_hadamard(&mut self, qubit: usize) -> Result<(), StateError> {
        let mask = self.qubit_mask(qubit)?;
        let inv_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        self.apply_pair_kernel(mask, 0, |a, b| {
            (inv_sqrt2 * (a + b), inv_sqrt2 * (a - b))
        });
        Ok(())
    }

    /// Apply a Pauli-X gate to `qubit`
    pub fn apply_x(&mut self, qubit: usize) -> Result<(), StateError> {
        let mask = self.qubit_mask(qubit)?;
        self.apply_pair_kernel(mask, 0, |a, b| (b, a));
        Ok(())
    }

    /// Apply a Z phase flip to `target`, conditioned on `controls`
    pub fn apply_phase_flip(&mut self, target: usize, controls: &[usize]) -> Result<(), StateError> {
        let target_mask = self.qubit_mask(target)?;
        let controls_mask = self.controls_mask(controls)?;

        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & target_mask != 0 && i & controls_mask == controls_mask {
                *amp = -*amp;
            }
        }
        Ok(())
    }
}
