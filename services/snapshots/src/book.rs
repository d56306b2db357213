//! Canonical order-book snapshot and raw-payload normalization

use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Px, Qty, Side, Symbol, Ts};

/// One ladder rung: a price with the aggregate size resting at it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price of this level
    pub price: Px,
    /// Aggregate size resting at this price
    pub size: Qty,
}

impl PriceLevel {
    /// Create a new price level
    #[must_use]
    pub const fn new(price: Px, size: Qty) -> Self {
        Self { price, size }
    }

    /// Notional value of this level in ticks (price x size)
    #[must_use]
    pub const fn notional(&self) -> i64 {
        self.price.mul_qty(self.size)
    }
}

/// Raw order book as returned by a venue gateway, prior to normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOrderBook {
    /// Raw bid levels in venue order (price, size)
    pub bids: Vec<(Px, Qty)>,
    /// Raw ask levels in venue order (price, size)
    pub asks: Vec<(Px, Qty)>,
    /// Venue sequence nonce for this payload
    pub sequence: u64,
    /// Venue timestamp of the payload
    pub ts: Ts,
}

/// Full book state at an instant, normalized and enriched with level-1
/// and pre-aggregated depth metrics.
///
/// Invariants: bids sorted strictly descending, asks strictly ascending,
/// one level per price per side, all sizes positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Venue the book was observed on
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Observation timestamp (UTC nanoseconds)
    pub ts: Ts,
    /// Bid levels, strictly descending by price
    pub bids: Vec<PriceLevel>,
    /// Ask levels, strictly ascending by price
    pub asks: Vec<PriceLevel>,
    /// Best bid price, if the bid side is non-empty
    pub best_bid: Option<Px>,
    /// Best ask price, if the ask side is non-empty
    pub best_ask: Option<Px>,
    /// Spread (best ask - best bid), when both sides are non-empty
    pub spread: Option<Px>,
    /// Spread as a percentage of the mid price
    pub spread_pct: Option<f64>,
    /// Mid price, when both sides are non-empty
    pub mid: Option<Px>,
    /// Bid-side notional over the top 10 levels, in ticks
    pub bid_depth_10: i64,
    /// Ask-side notional over the top 10 levels, in ticks
    pub ask_depth_10: i64,
    /// Bid-side notional over the top 50 levels, in ticks
    pub bid_depth_50: i64,
    /// Ask-side notional over the top 50 levels, in ticks
    pub ask_depth_50: i64,
    /// Whether both sides carry as many levels as were requested
    pub is_complete: bool,
}

impl BookSnapshot {
    /// Number of bid levels
    #[must_use]
    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    /// Number of ask levels
    #[must_use]
    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    /// Ladder for one side. `Side::Buy` is the bid ladder.
    #[must_use]
    pub fn side_levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Sum of base-quantity size over the top `depth` levels of a side
    #[must_use]
    pub fn depth_qty(&self, side: Side, depth: usize) -> Qty {
        self.side_levels(side)
            .iter()
            .take(depth)
            .fold(Qty::ZERO, |acc, l| acc.add(l.size))
    }

    /// Sum of notional (price x size, in ticks) over the top `depth` levels
    #[must_use]
    pub fn depth_notional(&self, side: Side, depth: usize) -> i64 {
        self.side_levels(side)
            .iter()
            .take(depth)
            .map(PriceLevel::notional)
            .sum()
    }

    /// Total notional across both full ladders, in ticks
    #[must_use]
    pub fn total_notional(&self) -> i64 {
        self.depth_notional(Side::Buy, self.bids.len())
            + self.depth_notional(Side::Sell, self.asks.len())
    }

    /// Total base quantity across both full ladders
    #[must_use]
    pub fn total_qty(&self) -> Qty {
        self.depth_qty(Side::Buy, self.bids.len())
            .add(self.depth_qty(Side::Sell, self.asks.len()))
    }
}

/// Normalize a raw venue payload into a canonical snapshot.
///
/// Sorts bids descending and asks ascending, merges duplicate prices,
/// drops non-positive sizes, and derives level-1 and depth metrics.
/// A crossed book (best ask below best bid) is rejected: the invariant
/// `spread >= 0` must hold for every stored snapshot.
pub fn normalize(
    venue: &str,
    symbol: Symbol,
    raw: RawOrderBook,
    requested_limit: usize,
) -> AnalyticsResult<BookSnapshot> {
    let mut bids = collapse_levels(raw.bids);
    let mut asks = collapse_levels(raw.asks);
    bids.sort_by(|a, b| b.price.cmp(&a.price));
    asks.sort_by(|a, b| a.price.cmp(&b.price));

    let best_bid = bids.first().map(|l| l.price);
    let best_ask = asks.first().map(|l| l.price);

    let (spread, mid) = match (best_bid, best_ask) {
        (Some(bid), Some(ask)) => {
            if ask < bid {
                return Err(AnalyticsError::InvalidParameter {
                    name: "order_book",
                    reason: format!("crossed book on {venue}: bid {bid} above ask {ask}"),
                });
            }
            let mid = Px::from_i64((bid.as_i64() + ask.as_i64()) / 2);
            (Some(ask.sub(bid)), Some(mid))
        }
        _ => (None, None),
    };

    let spread_pct = match (spread, mid) {
        (Some(s), Some(m)) if !m.is_zero() => Some(s.as_f64() / m.as_f64() * 100.0),
        _ => None,
    };

    let depth = |levels: &[PriceLevel], n: usize| -> i64 {
        levels.iter().take(n).map(PriceLevel::notional).sum()
    };

    let is_complete =
        requested_limit > 0 && bids.len() >= requested_limit && asks.len() >= requested_limit;

    Ok(BookSnapshot {
        venue: venue.to_string(),
        symbol,
        ts: raw.ts,
        bid_depth_10: depth(&bids, 10),
        ask_depth_10: depth(&asks, 10),
        bid_depth_50: depth(&bids, 50),
        ask_depth_50: depth(&asks, 50),
        best_bid,
        best_ask,
        spread,
        spread_pct,
        mid,
        bids,
        asks,
        is_complete,
    })
}

/// Merge duplicate prices (summing sizes) and drop non-positive sizes
fn collapse_levels(raw: Vec<(Px, Qty)>) -> Vec<PriceLevel> {
    let mut merged: Vec<PriceLevel> = Vec::with_capacity(raw.len());
    for (price, size) in raw {
        if size.as_i64() <= 0 {
            continue;
        }
        if let Some(existing) = merged.iter_mut().find(|l| l.price == price) {
            existing.size = existing.size.add(size);
        } else {
            merged.push(PriceLevel::new(price, size));
        }
    }
    merged
}
