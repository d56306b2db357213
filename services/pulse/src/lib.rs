//! Pulse signal generation
//!
//! Combines imbalance, pressure and momentum into a single directional
//! signal with confidence, validation filtering, and divergence
//! detection against an externally measured price change. Liquidity
//! scales signal strength but never flips direction.

#![warn(missing_docs)]

pub mod signal;

pub use signal::{
    DivergenceKind, DivergenceSignal, PulseConfig, PulseSignal, SignalDirection,
    detect_divergence, generate_signal, validate_signal,
};
