//! Property-based invariants for the detection engines
//!
//! - Iceberg detection never fires with fewer than 5 observed
//!   appearances at a price
//! - Spoofing detection never fires when the execution rate is >= 20%
//!   or below the placement/cancellation minimums
//! - Every large-order detection sits at or above the z-score threshold
//!   and references a price actually present in the book

use detection::{
    IcebergConfig, LargeOrderConfig, SpoofingConfig, detect_icebergs, detect_large_orders,
    detect_spoofing,
};
use proptest::prelude::*;
use services_common::{Px, Qty, Symbol, Ts};
use snapshots::{BookSnapshot, RawOrderBook, normalize};

/// Window generator: each snapshot draws levels from a shared pool of
/// candidate prices, so levels blink in and out across snapshots.
fn arb_window() -> impl Strategy<Value = Vec<BookSnapshot>> {
    let candidate_prices = 90_i64..110;
    let level = (candidate_prices, 1_i64..500);
    let side = prop::collection::vec(level, 1..8);
    prop::collection::vec((side.clone(), side), 6..30).prop_map(|raws| {
        raws.into_iter()
            .enumerate()
            .map(|(i, (bids, asks))| {
                normalize(
                    "binance",
                    Symbol::new(1),
                    RawOrderBook {
                        bids: bids
                            .into_iter()
                            .map(|(p, q)| (Px::from_units(p), Qty::from_units(q)))
                            .collect(),
                        asks: asks
                            .into_iter()
                            .map(|(p, q)| (Px::from_units(p + 100), Qty::from_units(q)))
                            .collect(),
                        sequence: i as u64,
                        ts: Ts::from_secs(1_700_000_000 + i as u64),
                    },
                    0,
                )
                .expect("shifted asks cannot cross")
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_iceberg_needs_five_appearances(window in arb_window()) {
        let config = IcebergConfig::default();
        for detection in detect_icebergs(&config, &window) {
            prop_assert!(detection.renewal_count >= 5);
            prop_assert!(detection.consistency > config.min_consistency);
            prop_assert!(
                detection.estimated_total_size >= detection.visible_size,
                "hidden-size estimate must not undercut the visible slice"
            );
        }
    }

    #[test]
    fn prop_spoofing_threshold_gates(window in arb_window()) {
        let config = SpoofingConfig::default();
        for detection in detect_spoofing(&config, &window) {
            prop_assert!(detection.placements >= config.min_placements);
            prop_assert!(detection.cancellations >= config.min_cancellations);
            prop_assert!(detection.execution_rate < config.max_execution_rate);
            prop_assert!(detection.avg_lifetime_secs < config.max_avg_lifetime_secs);
        }
    }

    #[test]
    fn prop_large_orders_are_real_outliers(window in arb_window()) {
        let config = LargeOrderConfig::default();
        let Some(snapshot) = window.last() else {
            return Ok(());
        };
        let Ok(detections) = detect_large_orders(&config, snapshot) else {
            return Ok(()); // book too shallow for a distribution
        };
        for detection in detections {
            prop_assert!(detection.z_score >= config.std_dev_threshold);
            let present = snapshot
                .bids
                .iter()
                .chain(snapshot.asks.iter())
                .any(|l| l.price == detection.price);
            prop_assert!(present, "flagged price must exist in the snapshot");
            prop_assert!(detection.market_share >= 0.0 && detection.market_share <= 1.0);
        }
    }
}
