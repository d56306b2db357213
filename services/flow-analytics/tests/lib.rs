//! Test module organization for the flow-analytics service
//!
//! Unit tests cover the documented numeric scenarios end to end;
//! property tests verify the range and determinism invariants the
//! downstream consumers rely on.

pub mod unit {
    pub mod test_scenarios;
}

pub mod property {
    pub mod test_invariants;
}

/// Shared builders for snapshot windows
pub mod utils {
    use services_common::{Px, Qty, Symbol, Ts};
    use snapshots::{BookSnapshot, RawOrderBook, normalize};

    /// Snapshot with explicit unit-priced ladders, 1 second per index
    pub fn snapshot(index: u64, bids: &[(i64, i64)], asks: &[(i64, i64)]) -> BookSnapshot {
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
                sequence: index,
                ts: Ts::from_secs(1_700_000_000 + index),
            },
            0,
        )
        .expect("test snapshot must normalize")
    }

    /// Window whose mid follows `mids` with a fixed 2-unit spread and
    /// book volume wobbling with the index
    pub fn window_from_mids(mids: &[i64]) -> Vec<BookSnapshot> {
        mids.iter()
            .enumerate()
            .map(|(i, &mid)| {
                snapshot(
                    i as u64,
                    &[(mid - 1, 10 + (i as i64 % 5))],
                    &[(mid + 1, 10 + ((i as i64 + 2) % 5))],
                )
            })
            .collect()
    }
}
