//! End-to-end numeric scenarios for the flow analytics

use crate::utils::{snapshot, window_from_mids};
use flow_analytics::{
    ImbalanceConfig, KyleConfig, LiquidityConfig, ToxicityConfig, TradingRecommendation,
    VpinConfig, compute_imbalance, compute_kyle_lambda, compute_liquidity, compute_noise,
    compute_toxicity, compute_verdict, compute_vpin, imbalance_at_depth,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use services_common::SCALE_4;

mod imbalance_scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reference_book_imbalance_is_zero() {
        // bids [[100,2],[99,3]] / asks [[101,1],[102,4]]: size depth 5 vs 5
        let snap = snapshot(0, &[(100, 2), (99, 3)], &[(101, 1), (102, 4)]);
        assert_eq!(imbalance_at_depth(&snap, 2), 0.0);
    }

    #[rstest]
    #[case(&[(100, 10)], &[], 1.0)]
    #[case(&[], &[(101, 10)], -1.0)]
    #[case(&[], &[], 0.0)]
    fn imbalance_edge_cases(
        #[case] bids: &[(i64, i64)],
        #[case] asks: &[(i64, i64)],
        #[case] expected: f64,
    ) {
        let snap = snapshot(0, bids, asks);
        assert_eq!(imbalance_at_depth(&snap, 10), expected);
    }

    #[test]
    fn pressure_momentum_chain() {
        let config = ImbalanceConfig::default();
        let bullish = snapshot(0, &[(100, 80)], &[(101, 20)]);
        let bearish = snapshot(1, &[(100, 20)], &[(101, 80)]);

        let first = compute_imbalance(&config, &bullish, None);
        assert_eq!(first.momentum, 0.0);
        assert!(first.pressure_score > 0.0);

        let second = compute_imbalance(&config, &bearish, Some(&first));
        assert!(second.pressure_score < 0.0);
        assert!(second.momentum < 0.0);
    }
}

mod microstructure_scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn vpin_identical_windows_identical_outputs() {
        let mids: Vec<i64> = (0..300).map(|i| 100 + (i % 7) - 3).collect();
        let window = window_from_mids(&mids);
        let config = VpinConfig {
            bucket_notional: 20 * SCALE_4,
            bucket_count: 10,
        };

        let first = compute_vpin(&config, &window).expect("enough buckets");
        let second = compute_vpin(&config, &window).expect("enough buckets");
        assert_eq!(first.vpin, second.vpin);
        assert_eq!(first.buckets_formed, second.buckets_formed);
        assert!(first.vpin >= 0.0 && first.vpin <= 100.0);
    }

    #[test]
    fn toxicity_trend_vs_chop() {
        let trend = compute_toxicity(
            &ToxicityConfig::default(),
            &window_from_mids(&[100, 101, 102, 103, 104, 105, 106, 107, 108, 109]),
        )
        .expect("long enough window");
        let chop = compute_toxicity(
            &ToxicityConfig::default(),
            &window_from_mids(&[100, 104, 99, 105, 98, 106, 97, 107, 96, 108]),
        )
        .expect("long enough window");
        assert!(chop.price_reversal_rate > trend.price_reversal_rate);
    }

    #[test]
    fn kyle_lambda_scales_inversely_with_depth() {
        // Constant ladder size makes volume change proportional to the
        // price change, so lambda recovers the inverse book depth: a
        // thinner book shows more impact per unit of volume.
        fn window_with_depth(qty: i64) -> Vec<snapshots::BookSnapshot> {
            let pattern = [1_i64, 2, 3];
            let mut mid = 1_000_i64;
            (0..16_usize)
                .map(|i| {
                    if i > 0 {
                        mid += pattern[(i - 1) % pattern.len()];
                    }
                    snapshot(i as u64, &[(mid - 1, qty)], &[(mid + 1, qty)])
                })
                .collect()
        }

        let config = KyleConfig::default();
        let thin = compute_kyle_lambda(&config, &window_with_depth(5)).expect("points");
        let deep = compute_kyle_lambda(&config, &window_with_depth(500)).expect("points");
        assert!(thin.lambda > deep.lambda);
        assert!((thin.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn full_verdict_pipeline() {
        let mids: Vec<i64> = (0..300).map(|i| 100 + (i % 5) - 2).collect();
        let window = window_from_mids(&mids);

        let vpin = compute_vpin(
            &VpinConfig {
                bucket_notional: 20 * SCALE_4,
                bucket_count: 10,
            },
            &window,
        )
        .expect("buckets");
        let toxicity = compute_toxicity(&ToxicityConfig::default(), &window).expect("window");
        let noise = compute_noise(&window).expect("window");
        let kyle = compute_kyle_lambda(&KyleConfig::default(), &window).expect("points");

        let report = compute_verdict(vpin, toxicity, noise, kyle);
        assert!(report.quality_score >= 0.0 && report.quality_score <= 100.0);
        if report.vpin.vpin > 70.0 || report.toxicity.toxicity_score > 75.0 {
            assert_eq!(report.recommendation, TradingRecommendation::Avoid);
        }
    }
}

mod liquidity_scenarios {
    use super::*;

    #[test]
    fn deeper_books_score_higher() {
        let config = LiquidityConfig::default();
        let thin = snapshot(0, &[(100, 1)], &[(101, 1)]);
        let deep_levels: Vec<(i64, i64)> = (0..50).map(|i| (100 - i, 100)).collect();
        let deep_asks: Vec<(i64, i64)> = (0..50).map(|i| (101 + i, 100)).collect();
        let deep = snapshot(0, &deep_levels, &deep_asks);

        let thin_score = compute_liquidity(&config, &thin, &[]);
        let deep_score = compute_liquidity(&config, &deep, &[]);
        assert!(deep_score.score > thin_score.score);
    }
}
