//! Market-noise and efficiency measurement
//!
//! Kaufman's efficiency ratio over the mid-price path, plus lag-1
//! autocorrelation of mid moves and a tick-size estimate (the smallest
//! nonzero stepwise move observed).

use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Px, Symbol, Ts, stats};
use snapshots::BookSnapshot;

/// Noise/efficiency report over a snapshot window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseReport {
    /// Venue of the window
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest snapshot
    pub ts: Ts,
    /// Kaufman efficiency ratio: |net move| / sum |stepwise moves|, in [0, 1]
    pub efficiency_ratio: f64,
    /// 1 - efficiency ratio
    pub noise_ratio: f64,
    /// Lag-1 autocorrelation of mid moves
    pub autocorrelation: f64,
    /// Smallest nonzero stepwise mid move observed
    pub tick_size_estimate: Px,
}

/// Minimum snapshots with a defined mid
pub const MIN_NOISE_SAMPLES: usize = 3;

/// Compute the noise report over an ascending snapshot window.
pub fn compute_noise(window: &[BookSnapshot]) -> AnalyticsResult<NoiseReport> {
    let mids: Vec<(Ts, f64, Px)> = window
        .iter()
        .filter_map(|s| s.mid.map(|m| (s.ts, m.as_f64(), m)))
        .collect();

    if mids.len() < MIN_NOISE_SAMPLES {
        return Err(AnalyticsError::InsufficientData {
            required: MIN_NOISE_SAMPLES,
            available: mids.len(),
        });
    }

    let values: Vec<f64> = mids.iter().map(|(_, m, _)| *m).collect();
    let moves: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let net_move = (values[values.len() - 1] - values[0]).abs();
    let path_length: f64 = moves.iter().map(|m| m.abs()).sum();

    // A path with no movement at all is trivially efficient
    let efficiency_ratio = if path_length > 0.0 {
        (net_move / path_length).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let tick_ticks = window
        .iter()
        .filter_map(|s| s.mid)
        .collect::<Vec<_>>()
        .windows(2)
        .map(|w| (w[1].as_i64() - w[0].as_i64()).abs())
        .filter(|d| *d > 0)
        .min()
        .unwrap_or(0);

    let (venue, symbol, ts) = {
        let (ts, _, _) = mids[mids.len() - 1];
        let last = window.last().map_or((String::new(), Symbol::new(0)), |s| {
            (s.venue.clone(), s.symbol)
        });
        (last.0, last.1, ts)
    };

    Ok(NoiseReport {
        venue,
        symbol,
        ts,
        efficiency_ratio,
        noise_ratio: 1.0 - efficiency_ratio,
        autocorrelation: stats::autocorrelation_lag1(&moves),
        tick_size_estimate: Px::from_i64(tick_ticks),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use services_common::Qty;
    use snapshots::{RawOrderBook, normalize};

    fn window_from_mids(mids: &[i64]) -> Vec<BookSnapshot> {
        mids.iter()
            .enumerate()
            .map(|(i, &mid)| {
                normalize(
                    "binance",
                    Symbol::new(1),
                    RawOrderBook {
                        bids: vec![(Px::from_units(mid - 1), Qty::from_units(10))],
                        asks: vec![(Px::from_units(mid + 1), Qty::from_units(10))],
                        sequence: i as u64,
                        ts: Ts::from_secs(1_700_000_000 + i as u64),
                    },
                    0,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_trending_path_is_efficient() {
        let report = compute_noise(&window_from_mids(&[100, 101, 102, 103, 104])).unwrap();
        assert!((report.efficiency_ratio - 1.0).abs() < 1e-9);
        assert!(report.noise_ratio.abs() < 1e-9);
    }

    #[test]
    fn test_choppy_path_is_noisy() {
        let report = compute_noise(&window_from_mids(&[100, 101, 100, 101, 100, 101, 100]))
            .unwrap();
        assert!(report.efficiency_ratio < 0.2);
        assert!(report.noise_ratio > 0.8);
        assert!(report.autocorrelation < 0.0);
    }

    #[test]
    fn test_tick_size_is_min_nonzero_move() {
        let report = compute_noise(&window_from_mids(&[100, 105, 105, 106, 110])).unwrap();
        assert_eq!(report.tick_size_estimate, Px::from_units(1));
    }

    #[test]
    fn test_flat_path_counts_as_efficient() {
        let report = compute_noise(&window_from_mids(&[100, 100, 100, 100])).unwrap();
        assert_eq!(report.efficiency_ratio, 1.0);
        assert_eq!(report.tick_size_estimate, Px::ZERO);
    }

    #[test]
    fn test_minimum_samples() {
        let err = compute_noise(&window_from_mids(&[100, 101]));
        assert!(matches!(
            err,
            Err(AnalyticsError::InsufficientData { required: 3, available: 2 })
        ));
    }
}
