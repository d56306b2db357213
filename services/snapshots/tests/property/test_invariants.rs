//! Property-based invariants for snapshot normalization and diffing
//!
//! - Bids sorted strictly descending, asks strictly ascending
//! - Spread is non-negative whenever both sides are non-empty
//! - Prices are unique per side
//! - `diff(s, s)` is always empty

use proptest::prelude::*;
use services_common::{Px, Qty, Symbol, Ts};
use snapshots::{BookSnapshot, RawOrderBook, diff, normalize};

fn arb_side() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((1_i64..5_000, 0_i64..1_000), 0..30)
}

fn build(bids: &[(i64, i64)], asks: &[(i64, i64)]) -> BookSnapshot {
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
                .map(|&(p, q)| (Px::from_units(p + 5_000), Qty::from_units(q)))
                .collect(),
            sequence: 0,
            ts: Ts::from_secs(1_700_000_000),
        },
        0,
    )
    .expect("shifted ask side cannot cross")
}

proptest! {
    #[test]
    fn prop_ladders_sorted_and_unique(bids in arb_side(), asks in arb_side()) {
        let snap = build(&bids, &asks);

        for pair in snap.bids.windows(2) {
            prop_assert!(pair[0].price > pair[1].price);
        }
        for pair in snap.asks.windows(2) {
            prop_assert!(pair[0].price < pair[1].price);
        }
        for level in snap.bids.iter().chain(snap.asks.iter()) {
            prop_assert!(level.size.as_i64() > 0);
        }
    }

    #[test]
    fn prop_spread_non_negative(bids in arb_side(), asks in arb_side()) {
        let snap = build(&bids, &asks);
        if let (Some(bid), Some(ask)) = (snap.best_bid, snap.best_ask) {
            prop_assert!(ask >= bid);
            prop_assert!(snap.spread.expect("both sides present").as_i64() >= 0);
            let mid = snap.mid.expect("both sides present");
            prop_assert!(mid >= bid);
            prop_assert!(mid <= ask);
        } else {
            prop_assert!(snap.spread.is_none());
            prop_assert!(snap.mid.is_none());
        }
    }

    #[test]
    fn prop_self_diff_is_empty(bids in arb_side(), asks in arb_side()) {
        let snap = build(&bids, &asks);
        let delta = diff(&snap, &snap);
        prop_assert!(delta.is_empty());
    }

    #[test]
    fn prop_diff_detects_every_removal(bids in arb_side(), asks in arb_side()) {
        let snap = build(&bids, &asks);
        if snap.bids.len() < 2 {
            return Ok(());
        }
        // Drop the worst bid and diff against the original
        let mut reduced = snap.clone();
        reduced.bids.pop();
        let delta = diff(&snap, &reduced);
        prop_assert!(delta.bid_changes.iter().any(|l| l.size.is_zero()));
    }
}
