//! Parameter-shift training for quantum circuit classifiers
//!
//! This crate provides the classical control and estimation layer for a
//! parametrized quantum-circuit classifier: a gate-sequence data model,
//! a circuit oracle abstraction with exact and sampled backends, a
//! Hadamard-test overlap estimator, parameter-shift gradient estimation,
//! bias calibration, and a stochastic mini-batch training loop.

pub mod quantum;
pub mod simulators;
pub mod machine_learning;

// Convenient imports for the common training workflow
pub mod prelude {
    pub use crate::quantum::gate::{ControlledRotation, PauliAxis};
    pub use crate::quantum::sequence::GateSequence;
    pub use crate::quantum::encoding::StateGenerator;
    pub use crate::quantum::oracle::{CircuitOracle, EvaluationMode};
    pub use crate::simulators::statevector::StatevectorSimulator;
    pub use crate::machine_learning::dataset::{LabeledSample, SamplingSchedule};
    pub use crate::machine_learning::gradient::estimate_gradient;
    pub use crate::machine_learning::bias::{adjust_bias, tally_hits_misses, ScoredSample};
    pub use crate::machine_learning::trainer::{
        train, train_with_restarts, EncodingStrategy, SequentialClassifier, StoppingCriterion,
        TrainingOptions, TrainingResult,
    };
}

// Version and crate information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
