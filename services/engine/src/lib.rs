//! Query surface composing every analytics engine
//!
//! `MicrostructureEngine` wires the snapshot layer, the per-symbol
//! analytics, the detectors and the multi-venue aggregator behind one
//! facade. Every collaborator arrives through the constructor — there
//! is no process-wide singleton anywhere in the workspace.

#![warn(missing_docs)]

pub mod engine;

pub use engine::{EngineConfig, MicrostructureEngine};
