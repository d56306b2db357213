//! Shared kernel for the microflow analytics services
//!
//! Fixed-point market primitives, the common error vocabulary, numeric
//! constants and the small statistics toolbox every analytics engine
//! leans on. Services depend on this crate, never on each other's
//! internals.

#![warn(missing_docs)]

pub mod constants;
pub mod errors;
pub mod stats;
pub mod types;

pub use constants::*;
pub use errors::{AnalyticsError, AnalyticsResult};
pub use types::{Px, Qty, Side, Symbol, Ts};
