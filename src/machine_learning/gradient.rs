//! Parameter-shift gradient estimation
//!
//! For a rotation `R(θ) = exp(-i θ σ / 2)` the derivative of the
//! classification probability decomposes into Hadamard-test overlaps
//! against π-shifted copies of the circuit. Per gate `g`:
//!
//! - uncontrolled: `dP/dθ ∋ -h(π)/2`, where `h(s)` is the overlap of the
//!   circuit against itself with gate `g`'s parameter advanced by `s`;
//! - controlled: `dP/dθ ∋ -(h(π) - h(3π))/4`; the `Re⟨ψ₂|ψ₁⟩` offset
//!   contributed by the uncontrolled branch of the gate is identical for
//!   both shifts and cancels in the difference.
//!
//! Each gate is probed independently against the unshifted baseline, so
//! shifts never accumulate across gates; contributions to a shared
//! parameter index sum. Gates are evaluated in parallel and reduced into
//! the gradient vector.

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::quantum::encoding::StateGenerator;
use crate::quantum::oracle::{CircuitOracle, EvaluationMode, OracleError};
use crate::quantum::sequence::GateSequence;

/// Estimate the gradient of the classification probability with respect
/// to every parameter
///
/// Deterministic under `EvaluationMode::Exact`; otherwise unbiased in
/// expectation with accuracy governed by the shot count.
pub fn estimate_gradient<O>(
    oracle: &O,
    gates: &GateSequence,
    parameters: &[f64],
    encoder: &StateGenerator,
    mode: EvaluationMode,
) -> Result<Vec<f64>, OracleError>
where
    O: CircuitOracle + ?Sized,
{
    mode.validate()?;
    for gate in gates {
        if gate.parameter_index() >= parameters.len() {
            return Err(OracleError::ParameterOutOfRange {
                index: gate.parameter_index(),
                parameter_count: parameters.len(),
            });
        }
    }

    let contributions = gates
        .as_slice()
        .par_iter()
        .map(|gate| -> Result<(usize, f64), OracleError> {
            let index = gate.parameter_index();

            let mut shifted = parameters.to_vec();
            shifted[index] = parameters[index] + PI;
            let h0 = oracle.overlap(gates, parameters, gates, &shifted, encoder, mode)?;

            let contribution = if gate.is_controlled() {
                shifted[index] = parameters[index] + 3.0 * PI;
                let h1 = oracle.overlap(gates, parameters, gates, &shifted, encoder, mode)?;
                -(h0 - h1) / 4.0
            } else {
                -h0 / 2.0
            };

            Ok((index, contribution))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut gradient = vec![0.0; parameters.len()];
    for (index, contribution) in contributions {
        gradient[index] += contribution;
    }
    Ok(gradient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::gate::{ControlledRotation, PauliAxis};
    use crate::simulators::statevector::StatevectorSimulator;

    #[test]
    fn test_single_rotation_matches_analytic_derivative() {
        // P(θ) = sin²(θ/2) for Ry(θ)|0⟩, so dP/dθ = sin(θ)/2
        let sim = StatevectorSimulator::new();
        let gates = GateSequence::new(vec![
            ControlledRotation::new(0, PauliAxis::Y, 0, vec![]).unwrap(),
        ]);
        let encoder = StateGenerator::amplitude_encoding(&[1.0, 0.0]).unwrap();

        for theta in [0.0, 0.4, 1.3, 2.8, -0.9] {
            let gradient =
                estimate_gradient(&sim, &gates, &[theta], &encoder, EvaluationMode::Exact)
                    .unwrap();
            assert!((gradient[0] - theta.sin() / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shared_parameter_contributions_sum() {
        // Two gates referencing the same parameter index
        let sim = StatevectorSimulator::new();
        let gates = GateSequence::new(vec![
            ControlledRotation::new(0, PauliAxis::Y, 0, vec![]).unwrap(),
            ControlledRotation::new(0, PauliAxis::Y, 0, vec![]).unwrap(),
        ]);
        let encoder = StateGenerator::amplitude_encoding(&[1.0, 0.0]).unwrap();

        // Both gates apply Ry(θ): P = sin²(θ), dP/dθ = sin(2θ)
        let theta = 0.6;
        let gradient =
            estimate_gradient(&sim, &gates, &[theta], &encoder, EvaluationMode::Exact).unwrap();
        assert!((gradient[0] - (2.0 * theta).sin()).abs() < 1e-9);
    }

    #[test]
    fn test_parameter_bounds_checked_first() {
        let sim = StatevectorSimulator::new();
        let gates = GateSequence::new(vec![
            ControlledRotation::new(2, PauliAxis::X, 0, vec![]).unwrap(),
        ]);
        let encoder = StateGenerator::amplitude_encoding(&[1.0, 0.0]).unwrap();

        let result = estimate_gradient(&sim, &gates, &[0.1], &encoder, EvaluationMode::Exact);
        assert!(matches!(
            result,
            Err(OracleError::ParameterOutOfRange { index: 2, .. })
        ));
    }
}
