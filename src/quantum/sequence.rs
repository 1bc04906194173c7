//! Ordered gate sequences
//!
//! A `GateSequence` is the immutable circuit structure shared read-only by
//! every evaluation within a training run. The parameter values themselves
//! live in a separate vector owned by the training loop.

use serde::{Deserialize, Serialize};

use crate::quantum::gate::{ControlledRotation, GateError, PauliAxis};

/// An ordered sequence of parametrized rotation gates
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateSequence {
    gates: Vec<ControlledRotation>,
}

impl GateSequence {
    /// Create a sequence from gates in application order
    pub fn new(gates: Vec<ControlledRotation>) -> Self {
        GateSequence { gates }
    }

    /// Decode a circuit from its flat boundary encoding, one inner vector
    /// per gate
    pub fn from_flat(encoded: &[Vec<usize>]) -> Result<Self, GateError> {
        let gates = encoded
            .iter()
            .map(|flat| ControlledRotation::from_flat(flat))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GateSequence { gates })
    }

    /// Re-encode the circuit to the flat boundary form
    pub fn to_flat(&self) -> Vec<Vec<usize>> {
        self.gates.iter().map(|g| g.to_flat()).collect()
    }

    /// Number of qubits the circuit spans: one past the highest target or
    /// control index referenced by any gate, zero for an empty sequence
    pub fn qubit_span(&self) -> usize {
        self.gates
            .iter()
            .map(|g| g.max_qubit() + 1)
            .max()
            .unwrap_or(0)
    }

    /// One past the highest parameter index referenced by any gate
    pub fn parameter_span(&self) -> usize {
        self.gates
            .iter()
            .map(|g| g.parameter_index() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ControlledRotation> {
        self.gates.iter()
    }

    pub fn as_slice(&self) -> &[ControlledRotation] {
        &self.gates
    }

    /// A hardware-efficient layered ansatz: per layer, an X and a Z
    /// rotation on each qubit followed by a ring of controlled X rotations.
    /// Each gate consumes a fresh parameter index.
    pub fn layered_ansatz(qubit_count: usize, layers: usize) -> Self {
        let mut gates = Vec::new();
        let mut param = 0;

        for _ in 0..layers {
            for q in 0..qubit_count {
                for axis in [PauliAxis::X, PauliAxis::Z] {
                    // new() cannot fail: no controls
                    gates.push(
                        ControlledRotation::new(param, axis, q, Vec::new())
                            .expect("uncontrolled gate is always valid"),
                    );
                    param += 1;
                }
            }
            if qubit_count > 1 {
                for q in 0..qubit_count {
                    let control = (q + 1) % qubit_count;
                    gates.push(
                        ControlledRotation::new(param, PauliAxis::X, q, vec![control])
                            .expect("distinct control and target"),
                    );
                    param += 1;
                }
            }
        }

        GateSequence { gates }
    }
}

impl<'a> IntoIterator for &'a GateSequence {
    type Item = &'a ControlledRotation;
    type IntoIter = std::slice::Iter<'a, ControlledRotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.gates.iter()
    }
}
