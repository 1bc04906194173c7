//! Simulator backends for the circuit oracle contract

pub mod statevector;

pub use statevector::StatevectorSimulator;
