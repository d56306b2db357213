//! Spoofing/layering detection via order-lifecycle tracking
//!
//! Tracks per-(side, price) placement and cancellation events across
//! consecutive snapshot diffs. The lifecycle arena is keyed by price and
//! scoped to one lookback window, so it cannot grow without bound.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{NANOS_PER_SEC, Px, Side, Symbol, Ts};
use snapshots::BookSnapshot;
use tracing::debug;

/// Pattern classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpoofingKind {
    /// More than 20 placements inside the window
    QuoteStuffing,
    /// Cancellations exceed 80% of placements
    Spoofing,
    /// Repeated placement/cancel at stacked prices
    Layering,
}

/// Detection severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Pattern present but weak
    Low,
    /// Clear pattern
    Medium,
    /// Aggressive pattern
    High,
    /// Sustained aggressive pattern
    Critical,
}

/// Detector thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoofingConfig {
    /// Minimum placements inside the window
    pub min_placements: usize,
    /// Minimum cancellations inside the window
    pub min_cancellations: usize,
    /// Maximum average lifetime for flagged orders, in seconds
    pub max_avg_lifetime_secs: f64,
    /// Maximum execution rate for flagged orders, in [0, 1]
    pub max_execution_rate: f64,
}

impl Default for SpoofingConfig {
    fn default() -> Self {
        Self {
            min_placements: 5,
            min_cancellations: 3,
            max_avg_lifetime_secs: 30.0,
            max_execution_rate: 0.2,
        }
    }
}

/// A price exhibiting a manipulative placement/cancel pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoofingDetection {
    /// Venue of the window
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest snapshot in the window
    pub ts: Ts,
    /// Side the pattern sits on
    pub side: Side,
    /// Price the pattern was observed at
    pub price: Px,
    /// Placements observed in the window
    pub placements: usize,
    /// Cancellations observed in the window
    pub cancellations: usize,
    /// Mean seconds between placement and cancellation
    pub avg_lifetime_secs: f64,
    /// (placements - cancellations) / placements, floored at 0
    pub execution_rate: f64,
    /// Pattern classification
    pub kind: SpoofingKind,
    /// Severity of the pattern
    pub severity: Severity,
}

/// Per-price lifecycle counters, rebuilt for each analysis window
#[derive(Default)]
struct Lifecycle {
    placements: usize,
    cancellations: usize,
    lifetime_nanos_sum: u64,
    placed_at: Option<Ts>,
}

/// Scan consecutive snapshot diffs for spoofing patterns.
///
/// A placement is a price going absent -> present between snapshots; a
/// cancellation is present -> absent, with the elapsed time since its
/// placement recorded as the order's lifetime.
#[must_use]
pub fn detect_spoofing(
    config: &SpoofingConfig,
    window: &[BookSnapshot],
) -> Vec<SpoofingDetection> {
    let mut arena: FxHashMap<(Side, i64), Lifecycle> = FxHashMap::default();

    for pair in window.windows(2) {
        let (old, new) = (&pair[0], &pair[1]);
        for (side, old_levels, new_levels) in [
            (Side::Buy, &old.bids, &new.bids),
            (Side::Sell, &old.asks, &new.asks),
        ] {
            // Placements: in new, absent from old
            for level in new_levels.iter() {
                if !old_levels.iter().any(|o| o.price == level.price) {
                    let entry = arena.entry((side, level.price.as_i64())).or_default();
                    entry.placements += 1;
                    entry.placed_at = Some(new.ts);
                }
            }
            // Cancellations: in old, absent from new
            for level in old_levels.iter() {
                if !new_levels.iter().any(|n| n.price == level.price) {
                    let entry = arena.entry((side, level.price.as_i64())).or_default();
                    entry.cancellations += 1;
                    let placed = entry.placed_at.take().unwrap_or(old.ts);
                    entry.lifetime_nanos_sum += new.ts.nanos_since(placed);
                }
            }
        }
    }

    let newest_ts = window.last().map_or(Ts::from_nanos(0), |s| s.ts);
    let (venue, symbol) = window
        .last()
        .map_or((String::new(), Symbol::new(0)), |s| {
            (s.venue.clone(), s.symbol)
        });

    let mut detections = Vec::new();
    for ((side, price_ticks), lifecycle) in &arena {
        if lifecycle.placements < config.min_placements
            || lifecycle.cancellations < config.min_cancellations
        {
            continue;
        }
        let avg_lifetime_secs = if lifecycle.cancellations > 0 {
            lifecycle.lifetime_nanos_sum as f64
                / lifecycle.cancellations as f64
                / NANOS_PER_SEC as f64
        } else {
            f64::MAX
        };
        if avg_lifetime_secs >= config.max_avg_lifetime_secs {
            continue;
        }
        let execution_rate = (lifecycle.placements as f64 - lifecycle.cancellations as f64)
            .max(0.0)
            / lifecycle.placements as f64;
        if execution_rate >= config.max_execution_rate {
            continue;
        }

        let cancel_ratio = lifecycle.cancellations as f64 / lifecycle.placements as f64;
        let kind = if lifecycle.placements > 20 {
            SpoofingKind::QuoteStuffing
        } else if cancel_ratio > 0.8 {
            SpoofingKind::Spoofing
        } else {
            SpoofingKind::Layering
        };

        let severity = if lifecycle.placements > 20 && execution_rate < 0.05 {
            Severity::Critical
        } else if execution_rate < 0.05 {
            Severity::High
        } else if execution_rate < 0.1 {
            Severity::Medium
        } else {
            Severity::Low
        };

        detections.push(SpoofingDetection {
            venue: venue.clone(),
            symbol,
            ts: newest_ts,
            side: *side,
            price: Px::from_i64(*price_ticks),
            placements: lifecycle.placements,
            cancellations: lifecycle.cancellations,
            avg_lifetime_secs,
            execution_rate,
            kind,
            severity,
        });
    }

    detections.sort_by(|a, b| b.severity.cmp(&a.severity));
    debug!(tracked = arena.len(), flagged = detections.len(), "spoofing scan complete");
    detections
}

#[cfg(test)]
mod tests {
    use super::*;
    use services_common::Qty;
    use snapshots::{RawOrderBook, normalize};

    /// Window where `spoof_price` flips in/out every snapshot on the bid
    /// side; snapshots are 1s apart.
    fn flicker_window(count: usize, spoof_price: i64) -> Vec<BookSnapshot> {
        (0..count)
            .map(|i| {
                let mut bids = vec![(Px::from_units(100), Qty::from_units(10))];
                if i % 2 == 1 {
                    bids.push((Px::from_units(spoof_price), Qty::from_units(500)));
                }
                normalize(
                    "binance",
                    Symbol::new(1),
                    RawOrderBook {
                        bids,
                        asks: vec![(Px::from_units(101), Qty::from_units(10))],
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
    fn test_flickering_level_is_flagged() {
        // 24 snapshots: ~12 placements, ~11 cancellations, 1s lifetimes
        let window = flicker_window(24, 95);
        let detections = detect_spoofing(&SpoofingConfig::default(), &window);
        assert_eq!(detections.len(), 1);
        let hit = &detections[0];
        assert_eq!(hit.price, Px::from_units(95));
        assert_eq!(hit.side, Side::Buy);
        assert!(hit.placements >= 5);
        assert!(hit.cancellations >= 3);
        assert!(hit.avg_lifetime_secs < 30.0);
        assert!(hit.execution_rate < 0.2);
        assert_eq!(hit.kind, SpoofingKind::Spoofing);
    }

    #[test]
    fn test_stable_book_is_clean() {
        let window: Vec<BookSnapshot> = (0..20)
            .map(|i| {
                normalize(
                    "binance",
                    Symbol::new(1),
                    RawOrderBook {
                        bids: vec![(Px::from_units(100), Qty::from_units(10))],
                        asks: vec![(Px::from_units(101), Qty::from_units(10))],
                        sequence: i,
                        ts: Ts::from_secs(1_700_000_000 + i),
                    },
                    0,
                )
                .unwrap()
            })
            .collect();
        assert!(detect_spoofing(&SpoofingConfig::default(), &window).is_empty());
    }

    #[test]
    fn test_below_thresholds_not_flagged() {
        // 8 snapshots: ~4 placements, below min_placements
        let window = flicker_window(8, 95);
        assert!(detect_spoofing(&SpoofingConfig::default(), &window).is_empty());
    }

    #[test]
    fn test_long_lifetimes_not_flagged() {
        // Same flicker but snapshots 60s apart: lifetimes too long
        let window: Vec<BookSnapshot> = (0..24usize)
            .map(|i| {
                let mut bids = vec![(Px::from_units(100), Qty::from_units(10))];
                if i % 2 == 1 {
                    bids.push((Px::from_units(95), Qty::from_units(500)));
                }
                normalize(
                    "binance",
                    Symbol::new(1),
                    RawOrderBook {
                        bids,
                        asks: vec![(Px::from_units(101), Qty::from_units(10))],
                        sequence: i as u64,
                        ts: Ts::from_secs(1_700_000_000 + (i as u64) * 60),
                    },
                    0,
                )
                .unwrap()
            })
            .collect();
        assert!(detect_spoofing(&SpoofingConfig::default(), &window).is_empty());
    }
}
