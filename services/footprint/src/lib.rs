//! Footprint and volume-profile construction
//!
//! The one branch of the engine that consumes trade prints rather than
//! order-book snapshots: per-bar buy/sell volume at price (footprint
//! bars), session volume profiles (POC and value area), and
//! absorption/climax pattern detection on top of them.

#![warn(missing_docs)]

pub mod bars;
pub mod patterns;
pub mod profile;
pub mod timeframe;

pub use bars::{FootprintBar, FootprintConfig, PriceRow, TradePrint, build_footprint_bars};
pub use patterns::{
    AbsorptionEvent, ClimaxEvent, PatternConfig, detect_absorption, detect_climax,
};
pub use profile::{ProfileConfig, SessionProfile, VolumeLevel, build_profile};
pub use timeframe::Timeframe;
