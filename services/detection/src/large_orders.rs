//! Large/whale order detection via per-level notional outliers

use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Px, Qty, SCALE_4_F64, Side, Symbol, Ts, stats};
use snapshots::BookSnapshot;
use tracing::debug;

/// Classification by z-score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderClassification {
    /// z-score > 5
    Whale,
    /// z-score > 4
    Institutional,
    /// z-score > 3
    LargeRetail,
    /// Flagged but below the named bands: possibly hidden size
    PotentialIceberg,
}

impl OrderClassification {
    /// Band a z-score
    #[must_use]
    pub fn from_z_score(z: f64) -> Self {
        if z > 5.0 {
            Self::Whale
        } else if z > 4.0 {
            Self::Institutional
        } else if z > 3.0 {
            Self::LargeRetail
        } else {
            Self::PotentialIceberg
        }
    }
}

/// Detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargeOrderConfig {
    /// Standard deviations above the mean a level must sit to be flagged
    pub std_dev_threshold: f64,
    /// Minimum levels across both sides for a meaningful distribution
    pub min_levels: usize,
}

impl Default for LargeOrderConfig {
    fn default() -> Self {
        Self {
            std_dev_threshold: 3.0,
            min_levels: 10,
        }
    }
}

/// One flagged outlier level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargeOrderDetection {
    /// Venue of the snapshot
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Side the level rests on
    pub side: Side,
    /// Price of the flagged level
    pub price: Px,
    /// Size of the flagged level
    pub size: Qty,
    /// Notional of the level, in currency units
    pub notional: f64,
    /// Standard deviations above the mean level notional
    pub z_score: f64,
    /// Percentile rank of the level within the snapshot, in [0, 100]
    pub percentile_rank: f64,
    /// Z-score band
    pub classification: OrderClassification,
    /// Share of the level's side notional, in [0, 1]
    pub market_share: f64,
    /// Distance from mid price, in percent (negative = below mid)
    pub distance_from_mid_pct: Option<f64>,
}

/// Flag per-level notional outliers in the latest snapshot.
///
/// Fails with `InsufficientData` when the book carries fewer levels
/// than `config.min_levels` across both sides.
pub fn detect_large_orders(
    config: &LargeOrderConfig,
    snapshot: &BookSnapshot,
) -> AnalyticsResult<Vec<LargeOrderDetection>> {
    let level_count = snapshot.bid_level_count() + snapshot.ask_level_count();
    if level_count < config.min_levels {
        return Err(AnalyticsError::InsufficientData {
            required: config.min_levels,
            available: level_count,
        });
    }

    let notionals: Vec<f64> = snapshot
        .bids
        .iter()
        .chain(snapshot.asks.iter())
        .map(|l| l.notional() as f64 / SCALE_4_F64)
        .collect();

    let mean = stats::mean(&notionals);
    let std_dev = stats::std_dev(&notionals);
    if std_dev <= 0.0 {
        // Perfectly uniform book: nothing is an outlier
        return Ok(Vec::new());
    }
    let threshold = config.std_dev_threshold.mul_add(std_dev, mean);

    let bid_total = snapshot.depth_notional(Side::Buy, snapshot.bids.len()) as f64 / SCALE_4_F64;
    let ask_total = snapshot.depth_notional(Side::Sell, snapshot.asks.len()) as f64 / SCALE_4_F64;
    let mid = snapshot.mid.map(|m| m.as_f64());

    let mut detections = Vec::new();
    for (side, levels, side_total) in [
        (Side::Buy, &snapshot.bids, bid_total),
        (Side::Sell, &snapshot.asks, ask_total),
    ] {
        for level in levels.iter() {
            let notional = level.notional() as f64 / SCALE_4_F64;
            if notional < threshold {
                continue;
            }
            let z_score = (notional - mean) / std_dev;
            detections.push(LargeOrderDetection {
                venue: snapshot.venue.clone(),
                symbol: snapshot.symbol,
                ts: snapshot.ts,
                side,
                price: level.price,
                size: level.size,
                notional,
                z_score,
                percentile_rank: stats::percentile_rank(&notionals, notional),
                classification: OrderClassification::from_z_score(z_score),
                market_share: if side_total > 0.0 {
                    notional / side_total
                } else {
                    0.0
                },
                distance_from_mid_pct: mid.map(|m| (level.price.as_f64() - m) / m * 100.0),
            });
        }
    }

    debug!(
        venue = %snapshot.venue,
        flagged = detections.len(),
        threshold,
        "large-order scan complete"
    );
    Ok(detections)
}
