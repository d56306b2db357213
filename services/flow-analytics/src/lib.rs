//! Order-flow and liquidity analytics
//!
//! Pure computations over windows of immutable snapshots:
//! - Multi-depth imbalance, pressure and momentum
//! - Composite 0-100 liquidity score with regime bands
//! - VPIN (Volume-Synchronized Probability of Informed Trading)
//! - Order-flow toxicity from effective vs. realized spread
//! - Market-noise/efficiency ratio (Kaufman ER)
//! - Kyle's Lambda price-impact regression
//! - A combined market-quality verdict with a trading recommendation
//!
//! Every function here is deterministic over its input window; rerunning
//! with the same snapshots reproduces the same output.

#![warn(missing_docs)]

pub mod imbalance;
pub mod kyle;
pub mod liquidity;
pub mod noise;
pub mod toxicity;
pub mod verdict;
pub mod vpin;

pub use imbalance::{ImbalanceConfig, ImbalanceRecord, compute_imbalance, imbalance_at_depth};
pub use kyle::{DepthTier, KyleConfig, KyleLambda, compute_kyle_lambda};
pub use liquidity::{LiquidityConfig, LiquidityRegime, LiquidityScore, compute_liquidity};
pub use noise::{NoiseReport, compute_noise};
pub use toxicity::{ToxicityConfig, ToxicityLevel, ToxicityReport, compute_toxicity};
pub use verdict::{MarketQualityReport, QualityTier, TradingRecommendation, compute_verdict};
pub use vpin::{VpinConfig, VpinMetrics, compute_vpin};
