//! Circuit data model and state simulation primitives
//!
//! This module defines the gate-sequence model for parametrized classifier
//! circuits, the state-vector representation used by the bundled simulator
//! backend, feature encodings, and the circuit oracle contract.

pub mod gate;
pub mod sequence;
pub mod state;
pub mod encoding;
pub mod oracle;

pub use gate::{ControlledRotation, GateError, PauliAxis};
pub use sequence::GateSequence;
pub use state::{StateError, StateVector};
pub use encoding::{EncodingError, StateGenerator};
pub use oracle::{CircuitOracle, EvaluationMode, OracleError};
