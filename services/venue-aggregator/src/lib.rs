//! Multi-venue liquidity aggregation
//!
//! Merges per-venue books into one ladder, computes best-execution
//! routing plans with per-venue fee netting, scans for cross-venue
//! arbitrage, scores venue quality, and measures liquidity
//! concentration (HHI). Per-venue fetches fan out concurrently; one
//! unreachable venue degrades the aggregate instead of failing it.

#![warn(missing_docs)]

pub mod aggregator;
pub mod arbitrage;
pub mod concentration;
pub mod merge;
pub mod quality;
pub mod routing;

pub use aggregator::{AggregatorConfig, FetchOutcome, MultiVenueAggregator};
pub use arbitrage::{ArbitrageConfig, ArbitrageOpportunity, ExecutionRisk, scan_arbitrage};
pub use concentration::{LiquidityDistribution, VenueShare, measure_concentration};
pub use merge::{AggregatedBook, MergedLevel, merge_books};
pub use quality::{QualityConfig, VenueQualityScore, VenueTier, score_venues};
pub use routing::{RoutingConfig, RoutingPlan, VenueAllocation, smart_route};
