//! Property-based invariants for the flow analytics
//!
//! - Imbalance at any depth stays in [-1, 1], and is 0 when both sides
//!   are empty
//! - Pressure stays in [-100, 100]
//! - VPIN stays in [0, 100] and is deterministic over its window
//! - The noise efficiency ratio stays in [0, 1]

use crate::utils::{snapshot, window_from_mids};
use flow_analytics::{
    ImbalanceConfig, VpinConfig, compute_imbalance, compute_noise, compute_vpin,
    imbalance_at_depth,
};
use proptest::prelude::*;
use services_common::SCALE_4;

/// Ladder generator: up to 12 levels per side with positive sizes
fn arb_ladder() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((1_i64..10_000, 1_i64..10_000), 0..12)
}

/// Mid-price path generator
fn arb_mids() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(50_i64..5_000, 10..120)
}

proptest! {
    #[test]
    fn prop_imbalance_bounded(bids in arb_ladder(), asks in arb_ladder(), depth in 1_usize..60) {
        // Keep the book uncrossed: bids below 10_000, asks above
        let bids: Vec<(i64, i64)> = bids.iter().map(|&(p, q)| (p, q)).collect();
        let asks: Vec<(i64, i64)> = asks.iter().map(|&(p, q)| (p + 10_000, q)).collect();
        let snap = snapshot(0, &bids, &asks);

        let imbalance = imbalance_at_depth(&snap, depth);
        prop_assert!(imbalance >= -1.0);
        prop_assert!(imbalance <= 1.0);
    }

    #[test]
    fn prop_pressure_bounded(bids in arb_ladder(), asks in arb_ladder()) {
        let bids: Vec<(i64, i64)> = bids.iter().map(|&(p, q)| (p, q)).collect();
        let asks: Vec<(i64, i64)> = asks.iter().map(|&(p, q)| (p + 10_000, q)).collect();
        let snap = snapshot(0, &bids, &asks);

        let record = compute_imbalance(&ImbalanceConfig::default(), &snap, None);
        prop_assert!(record.pressure_score >= -100.0);
        prop_assert!(record.pressure_score <= 100.0);
    }

    #[test]
    fn prop_vpin_bounded_and_deterministic(mids in arb_mids()) {
        let window = window_from_mids(&mids);
        let config = VpinConfig {
            bucket_notional: 10 * SCALE_4,
            bucket_count: 3,
        };

        let first = compute_vpin(&config, &window);
        let second = compute_vpin(&config, &window);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert!(a.vpin >= 0.0);
                prop_assert!(a.vpin <= 100.0);
                prop_assert_eq!(a.vpin, b.vpin);
                prop_assert_eq!(a.buckets_formed, b.buckets_formed);
            }
            (Err(_), Err(_)) => {} // insufficient buckets both times is consistent
            _ => prop_assert!(false, "vpin determinism violated"),
        }
    }

    #[test]
    fn prop_efficiency_ratio_bounded(mids in arb_mids()) {
        let window = window_from_mids(&mids);
        if let Ok(report) = compute_noise(&window) {
            prop_assert!(report.efficiency_ratio >= 0.0);
            prop_assert!(report.efficiency_ratio <= 1.0);
            prop_assert!(report.noise_ratio >= 0.0);
            prop_assert!(report.noise_ratio <= 1.0);
        }
    }
}

#[test]
fn imbalance_zero_on_empty_book() {
    let snap = snapshot(0, &[], &[]);
    for depth in [5, 10, 20, 50] {
        assert_eq!(imbalance_at_depth(&snap, depth), 0.0);
    }
}
