//! Parametrized rotation gates
//!
//! A classifier circuit is built from single-qubit rotation gates, each
//! optionally controlled and each referencing an entry of a shared
//! parameter vector by index. Gates cross the external boundary as a flat
//! integer encoding `[param_index, axis_index, target, control0, ...]`,
//! so construction from that encoding is validated here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing or decoding gates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("flat gate encoding needs at least 3 entries, got {0}")]
    EncodingTooShort(usize),

    #[error("Pauli axis index {0} out of range (expected 0..=3)")]
    AxisOutOfRange(usize),

    #[error("control qubit {0} duplicates the target qubit")]
    ControlOverlapsTarget(usize),

    #[error("duplicate control qubit {0}")]
    DuplicateControl(usize),
}

/// Rotation axis of a parametrized gate
///
/// `I` rotations are global phases on the target, which become relative
/// phases once the gate is controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauliAxis {
    I,
    X,
    Y,
    Z,
}

impl PauliAxis {
    /// Decode an axis from its flat integer index (0=I, 1=X, 2=Y, 3=Z)
    pub fn from_index(index: usize) -> Result<Self, GateError> {
        match index {
            0 => Ok(PauliAxis::I),
            1 => Ok(PauliAxis::X),
            2 => Ok(PauliAxis::Y),
            3 => Ok(PauliAxis::Z),
            other => Err(GateError::AxisOutOfRange(other)),
        }
    }

    /// The flat integer index of this axis
    pub fn index(&self) -> usize {
        match self {
            PauliAxis::I => 0,
            PauliAxis::X => 1,
            PauliAxis::Y => 2,
            PauliAxis::Z => 3,
        }
    }
}

/// A single-qubit rotation gate, optionally controlled
///
/// Immutable once constructed. The rotation is `R(θ) = exp(-i θ σ / 2)`,
/// so `R(θ + 2π) = -R(θ)`; the gradient estimator relies on that period
/// for its controlled-gate shift rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlledRotation {
    parameter_index: usize,
    axis: PauliAxis,
    target: usize,
    controls: Vec<usize>,
}

impl ControlledRotation {
    /// Create a gate, validating that controls are distinct from the target
    /// and from each other
    pub fn new(
        parameter_index: usize,
        axis: PauliAxis,
        target: usize,
        controls: Vec<usize>,
    ) -> Result<Self, GateError> {
        for (i, &c) in controls.iter().enumerate() {
            if c == target {
                return Err(GateError::ControlOverlapsTarget(c));
            }
            if controls[..i].contains(&c) {
                return Err(GateError::DuplicateControl(c));
            }
        }

        Ok(ControlledRotation {
            parameter_index,
            axis,
            target,
            controls,
        })
    }

    /// Decode a gate from the flat boundary encoding
    /// `[param_index, axis_index, target, control0, control1, ...]`
    pub fn from_flat(encoded: &[usize]) -> Result<Self, GateError> {
        if encoded.len() < 3 {
            return Err(GateError::EncodingTooShort(encoded.len()));
        }

        let axis = PauliAxis::from_index(encoded[1])?;
        ControlledRotation::new(encoded[0], axis, encoded[2], encoded[3..].to_vec())
    }

    /// Re-encode this gate to the flat boundary form
    pub fn to_flat(&self) -> Vec<usize> {
        let mut flat = Vec::with_capacity(3 + self.controls.len());
        flat.push(self.parameter_index);
        flat.push(self.axis.index());
        flat.push(self.target);
        flat.extend_from_slice(&self.controls);
        flat
    }

    /// Index into the shared parameter vector
    pub fn parameter_index(&self) -> usize {
        self.parameter_index
    }

    /// Rotation axis
    pub fn axis(&self) -> PauliAxis {
        self.axis
    }

    /// Target qubit
    pub fn target(&self) -> usize {
        self.target
    }

    /// Control qubits (empty for an uncontrolled gate)
    pub fn controls(&self) -> &[usize] {
        &self.controls
    }

    /// Whether the gate has any controls
    pub fn is_controlled(&self) -> bool {
        !self.controls.is_empty()
    }

    /// Highest qubit index this gate touches
    pub fn max_qubit(&self) -> usize {
        self.controls
            .iter()
            .fold(self.target, |acc, &c| acc.max(c))
    }

    /// The same rotation with one more control qubit appended
    ///
    /// Used by the Hadamard-test construction, where an entire gate
    /// sequence is applied conditioned on an auxiliary qubit.
    pub fn with_extra_control(&self, control: usize) -> Result<Self, GateError> {
        let mut controls = self.controls.clone();
        controls.push(control);
        ControlledRotation::new(self.parameter_index, self.axis, self.target, controls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_round_trip() {
        let flat = vec![4, 2, 1, 0, 3];
        let gate = ControlledRotation::from_flat(&flat).unwrap();
        assert_eq!(gate.parameter_index(), 4);
        assert_eq!(gate.axis(), PauliAxis::Y);
        assert_eq!(gate.target(), 1);
        assert_eq!(gate.controls(), &[0, 3]);
        assert_eq!(gate.to_flat(), flat);
    }

    #[test]
    fn test_rejects_malformed_encodings() {
        assert!(matches!(
            ControlledRotation::from_flat(&[0, 1]),
            Err(GateError::EncodingTooShort(2))
        ));
        assert!(matches!(
            ControlledRotation::from_flat(&[0, 7, 1]),
            Err(GateError::AxisOutOfRange(7))
        ));
        assert!(matches!(
            ControlledRotation::from_flat(&[0, 1, 2, 2]),
            Err(GateError::ControlOverlapsTarget(2))
        ));
    }
}
