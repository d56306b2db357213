//! Book-walk price-impact estimation

use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Px, Qty, SCALE_4, Side, Symbol, Ts};
use snapshots::BookSnapshot;
use tracing::debug;

/// Impact-split parameters.
///
/// The permanent-impact ratio `min(cap, base + slope * size/volume)` is
/// an uncalibrated heuristic; the constants are configuration, not
/// invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Cap on the permanent share of impact
    pub permanent_ratio_cap: f64,
    /// Base permanent share
    pub permanent_ratio_base: f64,
    /// Slope of the permanent share in the size/volume ratio
    pub permanent_ratio_slope: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            permanent_ratio_cap: 0.5,
            permanent_ratio_base: 0.2,
            permanent_ratio_slope: 0.5,
        }
    }
}

/// One consumed level in the execution path
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Price of the consumed level
    pub price: Px,
    /// Size taken from the level
    pub fill_size: Qty,
    /// Cumulative size filled after this step
    pub cumulative: Qty,
}

/// Cost estimate of a hypothetical market order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactEstimate {
    /// Venue of the book walked
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Order side (`Buy` walks the asks)
    pub side: Side,
    /// Requested size, fully filled
    pub size: Qty,
    /// Best price on the walked side
    pub best_price: Px,
    /// Size-weighted average fill price
    pub avg_price: Px,
    /// Worst (last) fill price
    pub worst_price: Px,
    /// |avg - best| / best, in percent
    pub impact_pct: f64,
    /// Transient share of the impact, in percent
    pub temporary_impact_pct: f64,
    /// Persistent share of the impact, in percent
    pub permanent_impact_pct: f64,
    /// Share of the walked side's volume consumed, in [0, 100]
    pub liquidity_consumed_pct: f64,
    /// Level-by-level execution path
    pub execution_path: Vec<ExecutionStep>,
}

/// Walk the book and cost a market order of `size`.
///
/// A `Buy` consumes the ask ladder from the best ask upward; a `Sell`
/// consumes bids downward. Fails with `InsufficientLiquidity`, carrying
/// the partial fill achieved, when the side cannot cover the size.
pub fn estimate_impact(
    config: &ImpactConfig,
    snapshot: &BookSnapshot,
    side: Side,
    size: Qty,
) -> AnalyticsResult<ImpactEstimate> {
    if size.as_i64() <= 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "size",
            reason: "order size must be positive".to_string(),
        });
    }

    // A buy takes liquidity from sellers
    let levels = snapshot.side_levels(side.opposite());
    if levels.is_empty() {
        return Err(AnalyticsError::InsufficientLiquidity {
            requested: size,
            filled: Qty::ZERO,
        });
    }

    let mut remaining = size;
    let mut filled = Qty::ZERO;
    let mut notional_ticks: i128 = 0;
    let mut execution_path = Vec::new();
    let mut worst_price = levels[0].price;

    for level in levels {
        if remaining.is_zero() {
            break;
        }
        let fill = remaining.min(level.size);
        filled = filled.add(fill);
        remaining = remaining.sub(fill);
        notional_ticks += i128::from(level.price.mul_qty(fill));
        worst_price = level.price;
        execution_path.push(ExecutionStep {
            price: level.price,
            fill_size: fill,
            cumulative: filled,
        });
    }

    if !remaining.is_zero() {
        debug!(%size, %filled, side = %side, "book exhausted before fill");
        return Err(AnalyticsError::InsufficientLiquidity {
            requested: size,
            filled,
        });
    }

    let best_price = levels[0].price;
    #[allow(clippy::cast_possible_truncation)]
    let avg_price = Px::from_i64(
        (notional_ticks * i128::from(SCALE_4) / i128::from(filled.as_i64())) as i64,
    );

    let impact_pct = if best_price.is_zero() {
        0.0
    } else {
        (avg_price.as_f64() - best_price.as_f64()).abs() / best_price.as_f64() * 100.0
    };

    let side_volume = snapshot.depth_qty(side.opposite(), levels.len());
    let volume_ratio = if side_volume.as_i64() > 0 {
        size.as_f64() / side_volume.as_f64()
    } else {
        1.0
    };
    let permanent_ratio = config
        .permanent_ratio_cap
        .min(config.permanent_ratio_slope.mul_add(volume_ratio, config.permanent_ratio_base));
    let permanent_impact_pct = impact_pct * permanent_ratio;
    let temporary_impact_pct = impact_pct - permanent_impact_pct;

    let liquidity_consumed_pct = if side_volume.as_i64() > 0 {
        (filled.as_f64() / side_volume.as_f64() * 100.0).min(100.0)
    } else {
        100.0
    };

    Ok(ImpactEstimate {
        venue: snapshot.venue.clone(),
        symbol: snapshot.symbol,
        ts: snapshot.ts,
        side,
        size,
        best_price,
        avg_price,
        worst_price,
        impact_pct,
        temporary_impact_pct,
        permanent_impact_pct,
        liquidity_consumed_pct,
        execution_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshots::{RawOrderBook, normalize};

    fn reference_book() -> BookSnapshot {
        // asks [[101,4],[102,6]] against a thin bid side
        normalize(
            "binance",
            Symbol::new(1),
            RawOrderBook {
                bids: vec![(Px::from_units(100), Qty::from_units(5))],
                asks: vec![
                    (Px::from_units(101), Qty::from_units(4)),
                    (Px::from_units(102), Qty::from_units(6)),
                ],
                sequence: 0,
                ts: Ts::from_secs(1_700_000_000),
            },
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_market_buy_reference_scenario() {
        // Buy 10 against asks [[101,4],[102,6]]:
        // avg = (101*4 + 102*6)/10 = 101.6, worst = 102
        let estimate = estimate_impact(
            &ImpactConfig::default(),
            &reference_book(),
            Side::Buy,
            Qty::from_units(10),
        )
        .unwrap();

        assert_eq!(estimate.best_price, Px::from_units(101));
        assert_eq!(estimate.avg_price, Px::new(101.6));
        assert_eq!(estimate.worst_price, Px::from_units(102));
        assert!((estimate.impact_pct - 0.594).abs() < 0.001);
        assert_eq!(estimate.execution_path.len(), 2);
        assert_eq!(estimate.execution_path[1].cumulative, Qty::from_units(10));
        assert!((estimate.liquidity_consumed_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_liquidity_reports_partial_fill() {
        let err = estimate_impact(
            &ImpactConfig::default(),
            &reference_book(),
            Side::Buy,
            Qty::from_units(20),
        );
        match err {
            Err(AnalyticsError::InsufficientLiquidity { requested, filled }) => {
                assert_eq!(requested, Qty::from_units(20));
                assert_eq!(filled, Qty::from_units(10));
            }
            other => panic!("expected InsufficientLiquidity, got {other:?}"),
        }
    }

    #[test]
    fn test_avg_between_best_and_worst() {
        let estimate = estimate_impact(
            &ImpactConfig::default(),
            &reference_book(),
            Side::Buy,
            Qty::from_units(7),
        )
        .unwrap();
        assert!(estimate.avg_price >= estimate.best_price);
        assert!(estimate.avg_price <= estimate.worst_price);
        assert!(estimate.impact_pct >= 0.0);
    }

    #[test]
    fn test_sell_walks_bids() {
        let estimate = estimate_impact(
            &ImpactConfig::default(),
            &reference_book(),
            Side::Sell,
            Qty::from_units(5),
        )
        .unwrap();
        assert_eq!(estimate.best_price, Px::from_units(100));
        assert_eq!(estimate.avg_price, Px::from_units(100));
        assert_eq!(estimate.impact_pct, 0.0);
    }

    #[test]
    fn test_impact_split_sums_to_total() {
        let estimate = estimate_impact(
            &ImpactConfig::default(),
            &reference_book(),
            Side::Buy,
            Qty::from_units(10),
        )
        .unwrap();
        assert!(
            (estimate.temporary_impact_pct + estimate.permanent_impact_pct
                - estimate.impact_pct)
                .abs()
                < 1e-9
        );
        // Full-book order: ratio hits the 0.5 cap
        assert!(
            (estimate.permanent_impact_pct - estimate.impact_pct * 0.5).abs() < 1e-9
        );
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = estimate_impact(
            &ImpactConfig::default(),
            &reference_book(),
            Side::Buy,
            Qty::ZERO,
        );
        assert!(matches!(
            err,
            Err(AnalyticsError::InvalidParameter { name: "size", .. })
        ));
    }
}
