//! Incremental book changes derived by price-keyed snapshot comparison

use crate::book::{BookSnapshot, PriceLevel};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{Px, Qty, Symbol, Ts};

/// Kind of change a delta captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaKind {
    /// Only new price levels appeared
    Add,
    /// At least one price level was removed
    Remove,
    /// Size changes on existing levels (or no change at all)
    Update,
}

/// Incremental change between two snapshots of the same (venue, symbol).
///
/// Deltas are derived, never authored directly. A removed level is
/// emitted with size zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDelta {
    /// Venue of both snapshots
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newer snapshot
    pub ts: Ts,
    /// Change kind
    pub kind: DeltaKind,
    /// Changed bid levels (size zero marks a removal)
    pub bid_changes: Vec<PriceLevel>,
    /// Changed ask levels (size zero marks a removal)
    pub ask_changes: Vec<PriceLevel>,
}

impl BookDelta {
    /// True when the delta carries no level changes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bid_changes.is_empty() && self.ask_changes.is_empty()
    }

    /// Total number of changed levels across both sides
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.bid_changes.len() + self.ask_changes.len()
    }
}

/// Compare two snapshots price-by-price and emit the incremental delta.
///
/// `diff(s, s)` yields an empty `Update` delta.
#[must_use]
pub fn diff(old: &BookSnapshot, new: &BookSnapshot) -> BookDelta {
    let (bid_changes, bid_removed) = diff_side(&old.bids, &new.bids);
    let (ask_changes, ask_removed) = diff_side(&old.asks, &new.asks);

    let any_removed = bid_removed || ask_removed;

    // Kind: Add iff every change is a brand-new price, Remove iff any
    // removal is present, otherwise Update.
    let all_new = bid_changes
        .iter()
        .chain(ask_changes.iter())
        .all(|l| !l.size.is_zero())
        && bid_changes
            .iter()
            .all(|l| !old.bids.iter().any(|o| o.price == l.price))
        && ask_changes
            .iter()
            .all(|l| !old.asks.iter().any(|o| o.price == l.price));

    let kind = if any_removed {
        DeltaKind::Remove
    } else if all_new && (!bid_changes.is_empty() || !ask_changes.is_empty()) {
        DeltaKind::Add
    } else {
        DeltaKind::Update
    };

    BookDelta {
        venue: new.venue.clone(),
        symbol: new.symbol,
        ts: new.ts,
        kind,
        bid_changes,
        ask_changes,
    }
}

/// Price-keyed set comparison for one side. Returns the changed levels
/// and whether any removal occurred.
fn diff_side(old: &[PriceLevel], new: &[PriceLevel]) -> (Vec<PriceLevel>, bool) {
    let old_map: FxHashMap<Px, Qty> = old.iter().map(|l| (l.price, l.size)).collect();
    let new_map: FxHashMap<Px, Qty> = new.iter().map(|l| (l.price, l.size)).collect();

    let mut changes = Vec::new();
    let mut removed = false;

    for level in new {
        match old_map.get(&level.price) {
            Some(old_size) if *old_size == level.size => {}
            _ => changes.push(*level),
        }
    }
    for level in old {
        if !new_map.contains_key(&level.price) {
            changes.push(PriceLevel::new(level.price, Qty::ZERO));
            removed = true;
        }
    }

    (changes, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{RawOrderBook, normalize};
    use services_common::Symbol;

    fn snapshot(bids: &[(i64, i64)], asks: &[(i64, i64)]) -> BookSnapshot {
        normalize(
            "binance",
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
                sequence: 1,
                ts: Ts::from_secs(1_700_000_000),
            },
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let s = snapshot(&[(100, 2), (99, 3)], &[(101, 1)]);
        let delta = diff(&s, &s);
        assert!(delta.is_empty());
        assert_eq!(delta.kind, DeltaKind::Update);
    }

    #[test]
    fn test_diff_add_only() {
        let old = snapshot(&[(100, 2)], &[(101, 1)]);
        let new = snapshot(&[(100, 2), (99, 3)], &[(101, 1)]);
        let delta = diff(&old, &new);
        assert_eq!(delta.kind, DeltaKind::Add);
        assert_eq!(delta.bid_changes.len(), 1);
        assert_eq!(delta.bid_changes[0].price, Px::from_units(99));
    }

    #[test]
    fn test_diff_removal_emits_zero_size() {
        let old = snapshot(&[(100, 2), (99, 3)], &[(101, 1)]);
        let new = snapshot(&[(100, 2)], &[(101, 1)]);
        let delta = diff(&old, &new);
        assert_eq!(delta.kind, DeltaKind::Remove);
        assert_eq!(delta.bid_changes.len(), 1);
        assert_eq!(delta.bid_changes[0].price, Px::from_units(99));
        assert!(delta.bid_changes[0].size.is_zero());
    }

    #[test]
    fn test_diff_size_change_is_update() {
        let old = snapshot(&[(100, 2)], &[(101, 1)]);
        let new = snapshot(&[(100, 5)], &[(101, 1)]);
        let delta = diff(&old, &new);
        assert_eq!(delta.kind, DeltaKind::Update);
        assert_eq!(delta.bid_changes[0].size, Qty::from_units(5));
    }

    #[test]
    fn test_diff_removal_wins_over_add() {
        let old = snapshot(&[(100, 2)], &[(101, 1)]);
        let new = snapshot(&[(99, 4)], &[(101, 1)]);
        let delta = diff(&old, &new);
        // New price appeared AND one was removed: Remove takes precedence
        assert_eq!(delta.kind, DeltaKind::Remove);
        assert_eq!(delta.change_count(), 2);
    }
}
