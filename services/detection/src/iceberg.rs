//! Iceberg detection via renewal-pattern matching
//!
//! An iceberg re-displays a consistent visible slice after each partial
//! fill. Over a lookback window, a price that keeps reappearing after
//! vanishing, always with roughly the same size, is a renewal pattern.
//! The hidden-size estimate is a conservative heuristic, not a bound.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{Px, Qty, Side, Symbol, Ts, stats};
use snapshots::BookSnapshot;
use tracing::debug;

/// Detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcebergConfig {
    /// Minimum appearances (first sighting plus renewals) at a price
    pub min_appearances: usize,
    /// Minimum consistency (0-100) the size series must reach
    pub min_consistency: f64,
    /// Multiplier in the hidden-size estimate
    /// (`avg x appearances x multiplier - avg`); uncalibrated heuristic
    pub hidden_size_multiplier: f64,
}

impl Default for IcebergConfig {
    fn default() -> Self {
        Self {
            min_appearances: 5,
            min_consistency: 70.0,
            hidden_size_multiplier: 2.0,
        }
    }
}

/// A price exhibiting the renewal pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcebergDetection {
    /// Venue of the window
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest snapshot in the window
    pub ts: Ts,
    /// Side the renewals were observed on
    pub side: Side,
    /// Renewing price
    pub price: Px,
    /// Average visible size across appearances
    pub visible_size: Qty,
    /// Heuristic estimate of total (visible + hidden) size
    pub estimated_total_size: Qty,
    /// Appearances counted (first sighting plus re-appearances)
    pub renewal_count: usize,
    /// Size consistency across appearances, in [0, 100]
    pub consistency: f64,
}

/// Per-price appearance bookkeeping, rebuilt for each analysis window
#[derive(Default)]
struct AppearanceTrack {
    sizes: Vec<f64>,
    appearances: usize,
}

/// Scan a lookback window for renewal patterns.
///
/// An appearance is counted when a price shows up in a snapshot after
/// being absent from the previous one (the first sighting counts). A
/// price resting untouched through the whole window accrues a single
/// appearance and cannot fire.
#[must_use]
pub fn detect_icebergs(
    config: &IcebergConfig,
    window: &[BookSnapshot],
) -> Vec<IcebergDetection> {
    let mut tracks: FxHashMap<(Side, i64), AppearanceTrack> = FxHashMap::default();
    let mut prev_present: std::collections::HashSet<(Side, i64)> =
        std::collections::HashSet::new();

    for snapshot in window {
        let mut current_present = std::collections::HashSet::new();
        for (side, levels) in [(Side::Buy, &snapshot.bids), (Side::Sell, &snapshot.asks)] {
            for level in levels.iter() {
                let key = (side, level.price.as_i64());
                current_present.insert(key);
                if !prev_present.contains(&key) {
                    let track = tracks.entry(key).or_default();
                    track.appearances += 1;
                    track.sizes.push(level.size.as_f64());
                }
            }
        }
        prev_present = current_present;
    }

    let newest_ts = window.last().map_or(Ts::from_nanos(0), |s| s.ts);
    let (venue, symbol) = window
        .last()
        .map_or((String::new(), Symbol::new(0)), |s| {
            (s.venue.clone(), s.symbol)
        });

    let mut detections = Vec::new();
    for ((side, price_ticks), track) in &tracks {
        if track.appearances < config.min_appearances {
            continue;
        }
        let cv = stats::coefficient_of_variation(&track.sizes);
        let consistency = ((1.0 - cv) * 100.0).clamp(0.0, 100.0);
        if consistency <= config.min_consistency {
            continue;
        }
        let avg_size = stats::mean(&track.sizes);
        let estimated_total =
            avg_size.mul_add(track.appearances as f64 * config.hidden_size_multiplier, -avg_size);
        detections.push(IcebergDetection {
            venue: venue.clone(),
            symbol,
            ts: newest_ts,
            side: *side,
            price: Px::from_i64(*price_ticks),
            visible_size: Qty::new(avg_size),
            estimated_total_size: Qty::new(estimated_total.max(avg_size)),
            renewal_count: track.appearances,
            consistency,
        });
    }

    detections.sort_by(|a, b| b.renewal_count.cmp(&a.renewal_count));
    debug!(candidates = tracks.len(), flagged = detections.len(), "iceberg scan complete");
    detections
}
