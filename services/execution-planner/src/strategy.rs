//! Execution-strategy selection

use crate::impact::{ImpactConfig, estimate_impact};
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsResult, Qty, Side, Symbol, Ts};
use snapshots::BookSnapshot;
use tracing::debug;

/// Proposed execution style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStyle {
    /// Single market order: impact is tolerable in one shot
    Market,
    /// Few slices spread over time
    Twap,
    /// Volume-weighted slicing
    Vwap,
    /// Liquidity-reactive slicing for outsized orders
    Adaptive,
}

/// Planner parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Maximum tolerated impact per slice, in percent
    pub max_impact_per_split_pct: f64,
    /// Split count at or below which TWAP is preferred
    pub twap_max_splits: usize,
    /// Liquidity consumption (percent) above which the plan turns adaptive
    pub adaptive_liquidity_pct: f64,
    /// Impact-split parameters for the underlying walk
    pub impact: ImpactConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            max_impact_per_split_pct: 0.25,
            twap_max_splits: 5,
            adaptive_liquidity_pct: 20.0,
            impact: ImpactConfig::default(),
        }
    }
}

/// A proposed way to work an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Venue of the book the plan was built against
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Order side
    pub side: Side,
    /// Total size to work
    pub total_size: Qty,
    /// Selected style
    pub style: ExecutionStyle,
    /// Number of slices
    pub split_count: usize,
    /// Per-slice sizes; the last slice absorbs rounding remainder
    pub slices: Vec<Qty>,
    /// Impact of executing everything at once, in percent
    pub market_order_impact_pct: f64,
    /// Share of side liquidity a single market order would consume
    pub liquidity_consumed_pct: f64,
}

/// Build an execution plan for an order of `size`.
///
/// Split count is `ceil(market impact / max impact per split)`; style
/// follows the split count and liquidity consumption. Failures from the
/// underlying walk (including `InsufficientLiquidity`) propagate.
pub fn plan_execution(
    config: &StrategyConfig,
    snapshot: &BookSnapshot,
    side: Side,
    size: Qty,
) -> AnalyticsResult<ExecutionPlan> {
    let estimate = estimate_impact(&config.impact, snapshot, side, size)?;

    let split_count = if config.max_impact_per_split_pct > 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let splits = (estimate.impact_pct / config.max_impact_per_split_pct).ceil() as usize;
        splits.max(1)
    } else {
        1
    };

    let style = if split_count == 1 {
        ExecutionStyle::Market
    } else if split_count <= config.twap_max_splits {
        ExecutionStyle::Twap
    } else if estimate.liquidity_consumed_pct > config.adaptive_liquidity_pct {
        ExecutionStyle::Adaptive
    } else {
        ExecutionStyle::Vwap
    };

    let slice_units = size.as_i64() / split_count as i64;
    let mut slices: Vec<Qty> = (0..split_count)
        .map(|_| Qty::from_i64(slice_units))
        .collect();
    let remainder = size.as_i64() - slice_units * split_count as i64;
    if let Some(last) = slices.last_mut() {
        *last = Qty::from_i64(slice_units + remainder);
    }

    debug!(
        side = %side,
        %size,
        ?style,
        split_count,
        impact = estimate.impact_pct,
        "execution plan built"
    );

    Ok(ExecutionPlan {
        venue: snapshot.venue.clone(),
        symbol: snapshot.symbol,
        ts: snapshot.ts,
        side,
        total_size: size,
        style,
        split_count,
        slices,
        market_order_impact_pct: estimate.impact_pct,
        liquidity_consumed_pct: estimate.liquidity_consumed_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use services_common::{AnalyticsError, Px};
    use snapshots::{RawOrderBook, normalize};

    fn book_with_asks(levels: &[(i64, i64)]) -> BookSnapshot {
        normalize(
            "binance",
            Symbol::new(1),
            RawOrderBook {
                bids: vec![(Px::from_units(99), Qty::from_units(1_000))],
                asks: levels
                    .iter()
                    .map(|&(p, q)| (Px::from_units(p), Qty::from_units(q)))
                    .collect(),
                sequence: 0,
                ts: Ts::from_secs(1_700_000_000),
            },
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_tiny_order_goes_market() {
        let book = book_with_asks(&[(100, 1_000), (101, 1_000)]);
        let plan = plan_execution(
            &StrategyConfig::default(),
            &book,
            Side::Buy,
            Qty::from_units(10),
        )
        .unwrap();
        assert_eq!(plan.style, ExecutionStyle::Market);
        assert_eq!(plan.split_count, 1);
        assert_eq!(plan.slices, vec![Qty::from_units(10)]);
    }

    #[test]
    fn test_moderate_impact_goes_twap() {
        // Walking into a sloped ladder: ~0.5-1% impact, a handful of splits
        let book = book_with_asks(&[(100, 50), (101, 50), (102, 50), (103, 50), (104, 800)]);
        let plan = plan_execution(
            &StrategyConfig::default(),
            &book,
            Side::Buy,
            Qty::from_units(100),
        )
        .unwrap();
        assert_eq!(plan.style, ExecutionStyle::Twap);
        assert!(plan.split_count > 1 && plan.split_count <= 5);
        let total: i64 = plan.slices.iter().map(|s| s.as_i64()).sum();
        assert_eq!(total, Qty::from_units(100).as_i64());
    }

    #[test]
    fn test_deep_walk_goes_adaptive() {
        // Steep ladder, large order: many splits and >20% consumption
        let book = book_with_asks(&[
            (100, 100),
            (105, 100),
            (110, 100),
            (115, 100),
            (120, 100),
        ]);
        let plan = plan_execution(
            &StrategyConfig::default(),
            &book,
            Side::Buy,
            Qty::from_units(450),
        )
        .unwrap();
        assert_eq!(plan.style, ExecutionStyle::Adaptive);
        assert!(plan.split_count > 5);
        assert!(plan.liquidity_consumed_pct > 20.0);
    }

    #[test]
    fn test_many_splits_low_consumption_goes_vwap() {
        // Wide book: tiny consumption share, but a pierced ladder with
        // enough impact for many splits
        let mut asks: Vec<(i64, i64)> = vec![(100, 5), (110, 5)];
        asks.extend((0..200).map(|i| (111 + i, 1_000)));
        let book = book_with_asks(&asks);
        let plan = plan_execution(
            &StrategyConfig::default(),
            &book,
            Side::Buy,
            Qty::from_units(15),
        )
        .unwrap();
        assert_eq!(plan.style, ExecutionStyle::Vwap);
        assert!(plan.split_count > 5);
        assert!(plan.liquidity_consumed_pct < 20.0);
    }

    #[test]
    fn test_unfillable_plan_propagates_error() {
        let book = book_with_asks(&[(100, 10)]);
        let err = plan_execution(
            &StrategyConfig::default(),
            &book,
            Side::Buy,
            Qty::from_units(100),
        );
        assert!(matches!(
            err,
            Err(AnalyticsError::InsufficientLiquidity { .. })
        ));
    }
}
