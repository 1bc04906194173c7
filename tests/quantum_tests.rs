//! Integration tests for the circuit data model and feature encodings

use parashift::quantum::gate::{ControlledRotation, GateError, PauliAxis};
use parashift::quantum::encoding::StateGenerator;
use parashift::quantum::sequence::GateSequence;
use parashift::quantum::state::StateVector;

#[test]
fn test_gate_sequence_flat_round_trip() {
    let flat = vec![
        vec![0, 1, 0],          // Rx on qubit 0
        vec![1, 2, 1, 3],       // controlled Ry, target 1, control 3
        vec![2, 3, 2, 0, 1],    // doubly controlled Rz
    ];
    let sequence = GateSequence::from_flat(&flat).unwrap();
    assert_eq!(sequence.to_flat(), flat);
    assert_eq!(sequence.len(), 3);
    assert_eq!(sequence.qubit_span(), 4);
    assert_eq!(sequence.parameter_span(), 3);
}

#[test]
fn test_malformed_flat_gates_rejected() {
    assert!(matches!(
        ControlledRotation::from_flat(&[0, 1]),
        Err(GateError::EncodingTooShort(2))
    ));
    assert!(matches!(
        ControlledRotation::from_flat(&[0, 4, 0]),
        Err(GateError::AxisOutOfRange(4))
    ));
    assert!(matches!(
        ControlledRotation::from_flat(&[0, 1, 2, 2]),
        Err(GateError::ControlOverlapsTarget(2))
    ));
}

#[test]
fn test_pauli_axis_indices() {
    for (index, axis) in [
        (0, PauliAxis::I),
        (1, PauliAxis::X),
        (2, PauliAxis::Y),
        (3, PauliAxis::Z),
    ] {
        assert_eq!(PauliAxis::from_index(index).unwrap(), axis);
        assert_eq!(axis.index(), index);
    }
}

#[test]
fn test_amplitude_encoding_pads_and_normalizes() {
    // three features pad to a four-dimensional, two-qubit register
    let encoder = StateGenerator::amplitude_encoding(&[1.0, 1.0, 1.0]).unwrap();
    assert_eq!(encoder.n_qubits(), 2);

    let state = encoder.prepare().unwrap();
    for basis in 0..3 {
        assert!((state.probability(basis) - 1.0 / 3.0).abs() < 1e-12);
    }
    assert!(state.probability(3) < 1e-12);
}

#[test]
fn test_angle_encoding_single_qubit_probability() {
    let theta = 0.8;
    let encoder = StateGenerator::angle_encoding(&[theta]).unwrap();
    let state = encoder.prepare().unwrap();
    let expected = (theta / 2.0).sin().powi(2);
    assert!((state.probability_of_one(0).unwrap() - expected).abs() < 1e-12);
}

#[test]
fn test_rotation_targets_qubits_big_endian() {
    // Flipping qubit 0 of a two-qubit register moves |00⟩ to |10⟩
    let mut state = StateVector::zero_state(2);
    state
        .apply_rotation(PauliAxis::X, std::f64::consts::PI, 0, &[])
        .unwrap();
    assert!((state.probability(0b10) - 1.0).abs() < 1e-12);
    assert!((state.probability_of_one(0).unwrap() - 1.0).abs() < 1e-12);
    assert!(state.probability_of_one(1).unwrap() < 1e-12);
}

#[test]
fn test_controlled_rotation_requires_active_control() {
    let theta = 1.3;

    // control qubit 0 inactive: target untouched
    let mut idle = StateVector::zero_state(2);
    idle.apply_rotation(PauliAxis::Y, theta, 1, &[0]).unwrap();
    assert!(idle.probability_of_one(1).unwrap() < 1e-12);

    // control active: target rotates
    let mut active = StateVector::zero_state(2);
    active
        .apply_rotation(PauliAxis::X, std::f64::consts::PI, 0, &[])
        .unwrap();
    active.apply_rotation(PauliAxis::Y, theta, 1, &[0]).unwrap();
    let expected = (theta / 2.0).sin().powi(2);
    assert!((active.probability_of_one(1).unwrap() - expected).abs() < 1e-12);
}

#[test]
fn test_register_embedding_keeps_data_amplitudes() {
    let encoder = StateGenerator::amplitude_encoding(&[0.6, 0.8]).unwrap();
    let state = encoder.prepare_register(3).unwrap();
    assert_eq!(state.qubit_count(), 3);
    // data basis index j lands at j << 2 under trailing zero-padding
    assert!((state.probability(0b000) - 0.36).abs() < 1e-12);
    assert!((state.probability(0b100) - 0.64).abs() < 1e-12);
}
