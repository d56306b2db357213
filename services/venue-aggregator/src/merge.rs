//! Cross-venue book merging

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{Px, Qty, Symbol, Ts};
use snapshots::BookSnapshot;

/// One merged ladder rung with its contributing venues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedLevel {
    /// Price of the level
    pub price: Px,
    /// Summed size across venues
    pub size: Qty,
    /// Per-venue size contributions at this price
    pub contributions: Vec<(String, Qty)>,
}

impl MergedLevel {
    /// Venue tags contributing to this level
    #[must_use]
    pub fn venues(&self) -> Vec<&str> {
        self.contributions.iter().map(|(v, _)| v.as_str()).collect()
    }

    /// Notional of the merged level, in ticks
    #[must_use]
    pub fn notional(&self) -> i64 {
        self.price.mul_qty(self.size)
    }
}

/// Cross-venue merged order book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedBook {
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest contributing snapshot
    pub ts: Ts,
    /// Venues that contributed
    pub venues: Vec<String>,
    /// Merged bids, descending
    pub bids: Vec<MergedLevel>,
    /// Merged asks, ascending
    pub asks: Vec<MergedLevel>,
    /// Best bid across venues and the venue offering it
    pub best_bid: Option<(Px, String)>,
    /// Best ask across venues and the venue offering it
    pub best_ask: Option<(Px, String)>,
    /// Total bid-side size
    pub total_bid_size: Qty,
    /// Total ask-side size
    pub total_ask_size: Qty,
}

/// Merge per-venue snapshots of one symbol into a single book.
///
/// Levels at an identical price sum their sizes and union their venue
/// tags. An empty input yields an empty book.
#[must_use]
pub fn merge_books(books: &[BookSnapshot]) -> AggregatedBook {
    let symbol = books.first().map_or(Symbol::new(0), |b| b.symbol);
    let ts = books
        .iter()
        .map(|b| b.ts)
        .max()
        .unwrap_or(Ts::from_nanos(0));
    let venues: Vec<String> = books.iter().map(|b| b.venue.clone()).collect();

    let mut bid_map: FxHashMap<i64, MergedLevel> = FxHashMap::default();
    let mut ask_map: FxHashMap<i64, MergedLevel> = FxHashMap::default();
    let mut best_bid: Option<(Px, String)> = None;
    let mut best_ask: Option<(Px, String)> = None;

    for book in books {
        if let Some(bid) = book.best_bid {
            if best_bid.as_ref().is_none_or(|(p, _)| bid > *p) {
                best_bid = Some((bid, book.venue.clone()));
            }
        }
        if let Some(ask) = book.best_ask {
            if best_ask.as_ref().is_none_or(|(p, _)| ask < *p) {
                best_ask = Some((ask, book.venue.clone()));
            }
        }
        for level in &book.bids {
            merge_level(&mut bid_map, &book.venue, level.price, level.size);
        }
        for level in &book.asks {
            merge_level(&mut ask_map, &book.venue, level.price, level.size);
        }
    }

    let mut bids: Vec<MergedLevel> = bid_map.into_values().collect();
    let mut asks: Vec<MergedLevel> = ask_map.into_values().collect();
    bids.sort_by(|a, b| b.price.cmp(&a.price));
    asks.sort_by(|a, b| a.price.cmp(&b.price));

    let total_bid_size = bids.iter().fold(Qty::ZERO, |acc, l| acc.add(l.size));
    let total_ask_size = asks.iter().fold(Qty::ZERO, |acc, l| acc.add(l.size));

    AggregatedBook {
        symbol,
        ts,
        venues,
        bids,
        asks,
        best_bid,
        best_ask,
        total_bid_size,
        total_ask_size,
    }
}

fn merge_level(map: &mut FxHashMap<i64, MergedLevel>, venue: &str, price: Px, size: Qty) {
    let entry = map.entry(price.as_i64()).or_insert_with(|| MergedLevel {
        price,
        size: Qty::ZERO,
        contributions: Vec::new(),
    });
    entry.size = entry.size.add(size);
    if let Some((_, existing)) = entry
        .contributions
        .iter_mut()
        .find(|(v, _)| v == venue)
    {
        *existing = existing.add(size);
    } else {
        entry.contributions.push((venue.to_string(), size));
    }
}
