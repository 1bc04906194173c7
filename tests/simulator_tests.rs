//! Integration tests for the statevector oracle and gradient estimation

use std::f64::consts::PI;

use parashift::machine_learning::gradient::estimate_gradient;
use parashift::quantum::encoding::StateGenerator;
use parashift::quantum::gate::{ControlledRotation, PauliAxis};
use parashift::quantum::oracle::{CircuitOracle, EvaluationMode, OracleError};
use parashift::quantum::sequence::GateSequence;
use parashift::simulators::statevector::StatevectorSimulator;

fn single_y_rotation() -> GateSequence {
    GateSequence::new(vec![
        ControlledRotation::new(0, PauliAxis::Y, 0, vec![]).unwrap(),
    ])
}

#[test]
fn test_exact_evaluation_matches_analytic_probability() {
    let sim = StatevectorSimulator::new();
    let gates = single_y_rotation();
    let encoder = StateGenerator::amplitude_encoding(&[1.0, 0.0]).unwrap();

    for theta in [0.0, 0.5, 1.7, PI, -2.3] {
        let p = sim
            .evaluate(&gates, &[theta], &encoder, EvaluationMode::Exact)
            .unwrap();
        let expected = (theta / 2.0).sin().powi(2);
        assert!((p - expected).abs() < 1e-12);
    }
}

#[test]
fn test_sampled_evaluation_tracks_exact_probability() {
    let sim = StatevectorSimulator::with_seed(7);
    let gates = single_y_rotation();
    let encoder = StateGenerator::amplitude_encoding(&[1.0, 0.0]).unwrap();

    let theta = 1.2;
    let exact = sim
        .evaluate(&gates, &[theta], &encoder, EvaluationMode::Exact)
        .unwrap();
    let sampled = sim
        .evaluate(
            &gates,
            &[theta],
            &encoder,
            EvaluationMode::Sampled { shots: 200_000 },
        )
        .unwrap();

    // standard error at 200k shots is ~1e-3
    assert!((sampled - exact).abs() < 0.01);
}

#[test]
fn test_zero_shot_sentinel_means_exact() {
    assert_eq!(EvaluationMode::from_shots(0), EvaluationMode::Exact);
    assert_eq!(
        EvaluationMode::from_shots(500),
        EvaluationMode::Sampled { shots: 500 }
    );

    let sim = StatevectorSimulator::new();
    let gates = single_y_rotation();
    let encoder = StateGenerator::amplitude_encoding(&[1.0, 0.0]).unwrap();

    let a = sim
        .evaluate(&gates, &[0.4], &encoder, EvaluationMode::from_shots(0))
        .unwrap();
    let b = sim
        .evaluate(&gates, &[0.4], &encoder, EvaluationMode::Exact)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_overlap_requires_valid_shot_count() {
    let sim = StatevectorSimulator::new();
    let gates = single_y_rotation();
    let encoder = StateGenerator::amplitude_encoding(&[1.0, 0.0]).unwrap();

    let result = sim.overlap(
        &gates,
        &[0.2],
        &gates,
        &[0.2],
        &encoder,
        EvaluationMode::Sampled { shots: 0 },
    );
    assert!(matches!(result, Err(OracleError::ZeroShots)));
}

#[test]
fn test_gradient_matches_finite_difference_for_layered_circuit() {
    // Layered ansatz mixes uncontrolled and controlled rotations
    let sim = StatevectorSimulator::new();
    let gates = GateSequence::layered_ansatz(2, 1);
    let encoder = StateGenerator::amplitude_encoding(&[0.6, 0.8]).unwrap();

    let parameters = [0.3, -0.7, 1.1, 0.2, -0.4, 0.9];
    assert_eq!(gates.parameter_span(), parameters.len());

    let gradient =
        estimate_gradient(&sim, &gates, &parameters, &encoder, EvaluationMode::Exact).unwrap();

    let step = 1e-5;
    for i in 0..parameters.len() {
        let mut plus = parameters.to_vec();
        plus[i] += step;
        let mut minus = parameters.to_vec();
        minus[i] -= step;

        let p_plus = sim
            .evaluate(&gates, &plus, &encoder, EvaluationMode::Exact)
            .unwrap();
        let p_minus = sim
            .evaluate(&gates, &minus, &encoder, EvaluationMode::Exact)
            .unwrap();
        let finite = (p_plus - p_minus) / (2.0 * step);

        assert!(
            (gradient[i] - finite).abs() < 1e-6,
            "parameter {i}: shift rule {} vs finite difference {finite}",
            gradient[i]
        );
    }
}

#[test]
fn test_gradient_of_identity_axis_gate() {
    // An uncontrolled I rotation is a global phase: zero gradient
    let sim = StatevectorSimulator::new();
    let gates = GateSequence::new(vec![
        ControlledRotation::new(0, PauliAxis::I, 0, vec![]).unwrap(),
        ControlledRotation::new(1, PauliAxis::Y, 0, vec![]).unwrap(),
    ]);
    let encoder = StateGenerator::amplitude_encoding(&[1.0, 0.0]).unwrap();

    let theta = 0.8;
    let gradient =
        estimate_gradient(&sim, &gates, &[0.5, theta], &encoder, EvaluationMode::Exact).unwrap();
    assert!(gradient[0].abs() < 1e-9);
    assert!((gradient[1] - theta.sin() / 2.0).abs() < 1e-9);
}
