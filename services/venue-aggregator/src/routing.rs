//! Smart order routing over the merged book

use crate::merge::{AggregatedBook, merge_books};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Px, Qty, SCALE_4, SCALE_4_F64, Side, Symbol, Ts};
use snapshots::BookSnapshot;
use tracing::debug;

/// Routing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Default taker fee rate applied per venue (0.001 = 10 bp)
    pub default_fee_rate: f64,
    /// Per-venue fee-rate overrides
    pub venue_fee_rates: FxHashMap<String, f64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_fee_rate: 0.001,
            venue_fee_rates: FxHashMap::default(),
        }
    }
}

impl RoutingConfig {
    /// Fee rate for a venue
    #[must_use]
    pub fn fee_rate(&self, venue: &str) -> f64 {
        self.venue_fee_rates
            .get(venue)
            .copied()
            .unwrap_or(self.default_fee_rate)
    }
}

/// Size and cost routed to one venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueAllocation {
    /// Venue receiving this slice
    pub venue: String,
    /// Size routed to the venue
    pub size: Qty,
    /// Notional of the slice, in currency units
    pub notional: f64,
    /// Fee charged by the venue, in currency units
    pub fee: f64,
    /// Size-weighted average fill price at the venue
    pub avg_price: Px,
}

/// Best-execution routing plan across venues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingPlan {
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the merged book
    pub ts: Ts,
    /// Order side
    pub side: Side,
    /// Total size routed
    pub total_size: Qty,
    /// Per-venue allocations, largest first
    pub allocations: Vec<VenueAllocation>,
    /// Size-weighted average price across venues
    pub avg_price: Px,
    /// Sum of per-venue fees, in currency units
    pub total_fees: f64,
    /// Notional plus fees (buy) or notional minus fees (sell)
    pub total_cost: f64,
    /// Cheapest venue able to fill the order alone, with its all-in cost
    pub best_single_venue: Option<(String, f64)>,
    /// Cost saved vs. the best single venue, in currency units
    pub savings_vs_single: Option<f64>,
}

/// Route an order across venues by walking the merged book.
///
/// Each consumed merged level splits proportionally across its
/// contributing venues; per-venue fees are netted before comparing
/// against the best single venue. Fails with `InsufficientLiquidity`
/// when even the merged book cannot cover the size.
pub fn smart_route(
    config: &RoutingConfig,
    books: &[BookSnapshot],
    side: Side,
    size: Qty,
) -> AnalyticsResult<RoutingPlan> {
    if size.as_i64() <= 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "size",
            reason: "order size must be positive".to_string(),
        });
    }
    let merged = merge_books(books);
    let plan = route_merged(config, &merged, side, size)?;

    // All-in cost of filling the whole order on each venue alone
    let mut best_single: Option<(String, f64)> = None;
    for book in books {
        if let Some(cost) = single_venue_cost(config, book, side, size) {
            let better = match (&best_single, side) {
                (None, _) => true,
                (Some((_, best)), Side::Buy) => cost < *best,
                (Some((_, best)), Side::Sell) => cost > *best,
            };
            if better {
                best_single = Some((book.venue.clone(), cost));
            }
        }
    }

    let savings = best_single.as_ref().map(|(_, single_cost)| match side {
        Side::Buy => single_cost - plan.total_cost,
        Side::Sell => plan.total_cost - single_cost,
    });

    debug!(
        side = %side,
        %size,
        venues = plan.allocations.len(),
        savings = ?savings,
        "smart route built"
    );

    Ok(RoutingPlan {
        best_single_venue: best_single,
        savings_vs_single: savings,
        ..plan
    })
}

/// Walk the merged ladder and build venue allocations
fn route_merged(
    config: &RoutingConfig,
    merged: &AggregatedBook,
    side: Side,
    size: Qty,
) -> AnalyticsResult<RoutingPlan> {
    let ladder = match side {
        Side::Buy => &merged.asks,
        Side::Sell => &merged.bids,
    };

    let mut remaining = size;
    let mut filled = Qty::ZERO;
    let mut notional_ticks: i128 = 0;
    // venue -> (size units, notional ticks)
    let mut venue_fills: FxHashMap<String, (i64, i128)> = FxHashMap::default();

    for level in ladder {
        if remaining.is_zero() {
            break;
        }
        let fill = remaining.min(level.size);
        filled = filled.add(fill);
        remaining = remaining.sub(fill);
        notional_ticks += i128::from(level.price.mul_qty(fill));

        // Proportional split across contributing venues; the largest
        // contributor absorbs integer rounding remainder.
        let mut allocated: i64 = 0;
        let mut largest: Option<(&String, i64)> = None;
        for (venue, contributed) in &level.contributions {
            let share = (i128::from(fill.as_i64()) * i128::from(contributed.as_i64())
                / i128::from(level.size.as_i64().max(1))) as i64;
            allocated += share;
            let entry = venue_fills.entry(venue.clone()).or_insert((0, 0));
            entry.0 += share;
            entry.1 += i128::from(level.price.mul_qty(Qty::from_i64(share)));
            if largest.is_none_or(|(_, s)| contributed.as_i64() > s) {
                largest = Some((venue, contributed.as_i64()));
            }
        }
        let remainder = fill.as_i64() - allocated;
        if remainder > 0 {
            if let Some((venue, _)) = largest {
                let entry = venue_fills.entry(venue.clone()).or_insert((0, 0));
                entry.0 += remainder;
                entry.1 += i128::from(level.price.mul_qty(Qty::from_i64(remainder)));
            }
        }
    }

    if !remaining.is_zero() {
        return Err(AnalyticsError::InsufficientLiquidity {
            requested: size,
            filled,
        });
    }

    let mut allocations: Vec<VenueAllocation> = venue_fills
        .into_iter()
        .filter(|(_, (units, _))| *units > 0)
        .map(|(venue, (units, ticks))| {
            let notional = ticks as f64 / SCALE_4_F64;
            let fee = notional * config.fee_rate(&venue);
            #[allow(clippy::cast_possible_truncation)]
            let avg_price =
                Px::from_i64((ticks * i128::from(SCALE_4) / i128::from(units.max(1))) as i64);
            VenueAllocation {
                venue,
                size: Qty::from_i64(units),
                notional,
                fee,
                avg_price,
            }
        })
        .collect();
    allocations.sort_by(|a, b| b.size.cmp(&a.size));

    let total_fees: f64 = allocations.iter().map(|a| a.fee).sum();
    let gross_notional = notional_ticks as f64 / SCALE_4_F64;
    let total_cost = match side {
        Side::Buy => gross_notional + total_fees,
        Side::Sell => gross_notional - total_fees,
    };
    #[allow(clippy::cast_possible_truncation)]
    let avg_price = Px::from_i64(
        (notional_ticks * i128::from(SCALE_4) / i128::from(filled.as_i64().max(1))) as i64,
    );

    Ok(RoutingPlan {
        symbol: merged.symbol,
        ts: merged.ts,
        side,
        total_size: filled,
        allocations,
        avg_price,
        total_fees,
        total_cost,
        best_single_venue: None,
        savings_vs_single: None,
    })
}

/// All-in cost of filling `size` on a single venue, `None` when the
/// venue's book cannot cover it
fn single_venue_cost(
    config: &RoutingConfig,
    book: &BookSnapshot,
    side: Side,
    size: Qty,
) -> Option<f64> {
    let ladder = book.side_levels(side.opposite());
    let mut remaining = size;
    let mut notional_ticks: i128 = 0;
    for level in ladder {
        if remaining.is_zero() {
            break;
        }
        let fill = remaining.min(level.size);
        remaining = remaining.sub(fill);
        notional_ticks += i128::from(level.price.mul_qty(fill));
    }
    if !remaining.is_zero() {
        return None;
    }
    let notional = notional_ticks as f64 / SCALE_4_F64;
    let fee = notional * config.fee_rate(&book.venue);
    Some(match side {
        Side::Buy => notional + fee,
        Side::Sell => notional - fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshots::{RawOrderBook, normalize};

    fn book(venue: &str, bids: &[(i64, i64)], asks: &[(i64, i64)]) -> BookSnapshot {
        normalize(
            venue,
            Symbol::new(1),
            RawOrderBook {
                bids: bids
                    .iter()
                    .map(|&(p, q)| (Px::from_units(p), Qty::from_units(q)))
                    .collect(),
                asks: asks
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
    fn test_route_prefers_better_prices_across_venues() {
        let books = vec![
            book("binance", &[(99, 10)], &[(101, 5), (103, 20)]),
            book("kraken", &[(98, 10)], &[(102, 5), (104, 20)]),
        ];
        let plan = smart_route(
            &RoutingConfig::default(),
            &books,
            Side::Buy,
            Qty::from_units(10),
        )
        .unwrap();

        // 5 @ 101 (binance) then 5 @ 102 (kraken)
        assert_eq!(plan.total_size, Qty::from_units(10));
        assert_eq!(plan.allocations.len(), 2);
        assert_eq!(plan.avg_price, Px::new(101.5));
        assert!(plan.total_fees > 0.0);
    }

    #[test]
    fn test_shared_price_splits_proportionally() {
        let books = vec![
            book("binance", &[(99, 10)], &[(101, 6)]),
            book("kraken", &[(98, 10)], &[(101, 3)]),
        ];
        let plan = smart_route(
            &RoutingConfig::default(),
            &books,
            Side::Buy,
            Qty::from_units(3),
        )
        .unwrap();

        // 2/1 split mirrors the 6/3 contributions
        let binance = plan
            .allocations
            .iter()
            .find(|a| a.venue == "binance")
            .unwrap();
        let kraken = plan
            .allocations
            .iter()
            .find(|a| a.venue == "kraken")
            .unwrap();
        assert_eq!(binance.size, Qty::from_units(2));
        assert_eq!(kraken.size, Qty::from_units(1));
    }

    #[test]
    fn test_savings_vs_best_single_venue() {
        // Single venue forces walking to 103; routed stays at 101/102
        let books = vec![
            book("binance", &[(99, 10)], &[(101, 5), (103, 20)]),
            book("kraken", &[(98, 10)], &[(102, 5), (104, 20)]),
        ];
        let plan = smart_route(
            &RoutingConfig::default(),
            &books,
            Side::Buy,
            Qty::from_units(10),
        )
        .unwrap();

        let (venue, _) = plan.best_single_venue.clone().unwrap();
        assert_eq!(venue, "binance");
        assert!(plan.savings_vs_single.unwrap() > 0.0);
    }

    #[test]
    fn test_merged_insufficient_liquidity() {
        let books = vec![book("binance", &[(99, 10)], &[(101, 5)])];
        let err = smart_route(
            &RoutingConfig::default(),
            &books,
            Side::Buy,
            Qty::from_units(50),
        );
        match err {
            Err(AnalyticsError::InsufficientLiquidity { requested, filled }) => {
                assert_eq!(requested, Qty::from_units(50));
                assert_eq!(filled, Qty::from_units(5));
            }
            other => panic!("expected InsufficientLiquidity, got {other:?}"),
        }
    }

    #[test]
    fn test_sell_side_routing() {
        let books = vec![
            book("binance", &[(100, 5)], &[(102, 5)]),
            book("kraken", &[(99, 5)], &[(103, 5)]),
        ];
        let plan = smart_route(
            &RoutingConfig::default(),
            &books,
            Side::Sell,
            Qty::from_units(8),
        )
        .unwrap();
        // 5 @ 100 then 3 @ 99
        assert_eq!(plan.total_size, Qty::from_units(8));
        assert!(plan.avg_price > Px::from_units(99));
        assert!(plan.avg_price < Px::from_units(100));
    }
}
