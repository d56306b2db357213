//! VPIN: Volume-Synchronized Probability of Informed Trading
//!
//! Partitions a trailing snapshot sequence into fixed-notional volume
//! buckets, classifying inter-snapshot volume change as buy or sell via
//! the tick rule on mid-price direction. VPIN is the mean absolute
//! buy/sell imbalance over the last K buckets, scaled to 0-100.

use crate::toxicity::ToxicityLevel;
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, SCALE_4, Symbol, Ts};
use snapshots::BookSnapshot;
use tracing::debug;

/// VPIN bucketing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpinConfig {
    /// Fixed notional per volume bucket, in ticks (default $1M)
    pub bucket_notional: i64,
    /// Number of trailing buckets VPIN is averaged over
    pub bucket_count: usize,
}

impl Default for VpinConfig {
    fn default() -> Self {
        Self {
            bucket_notional: 1_000_000 * SCALE_4,
            bucket_count: 50,
        }
    }
}

/// One completed fixed-notional bucket
#[derive(Debug, Clone, Copy)]
struct VolumeBucket {
    buy_volume: f64,
    sell_volume: f64,
}

/// Informed-trading probability metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpinMetrics {
    /// Venue of the window
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest snapshot in the window
    pub ts: Ts,
    /// VPIN in [0, 100]
    pub vpin: f64,
    /// Notional per bucket, in ticks
    pub bucket_notional: i64,
    /// Buckets formed from the window
    pub buckets_formed: usize,
    /// Total classified buy volume (notional units)
    pub buy_volume: f64,
    /// Total classified sell volume (notional units)
    pub sell_volume: f64,
    /// Toxicity band over the VPIN value
    pub toxicity_level: ToxicityLevel,
}

/// Compute VPIN over an ascending window of snapshots.
///
/// Fails with `InsufficientBuckets` when fewer than
/// `config.bucket_count` buckets can be formed. Deterministic: the same
/// window always yields the same metrics.
pub fn compute_vpin(
    config: &VpinConfig,
    window: &[BookSnapshot],
) -> AnalyticsResult<VpinMetrics> {
    if config.bucket_notional <= 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "bucket_notional",
            reason: "must be positive".to_string(),
        });
    }
    if config.bucket_count == 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "bucket_count",
            reason: "must be positive".to_string(),
        });
    }

    let mut buckets: Vec<VolumeBucket> = Vec::new();
    let mut current = VolumeBucket {
        buy_volume: 0.0,
        sell_volume: 0.0,
    };
    let mut current_fill = 0.0;
    let bucket_notional = config.bucket_notional as f64 / SCALE_4 as f64;

    for pair in window.windows(2) {
        let (old, new) = (&pair[0], &pair[1]);
        let (Some(old_mid), Some(new_mid)) = (old.mid, new.mid) else {
            continue;
        };

        let volume = ((new.total_notional() - old.total_notional()).abs()) as f64
            / SCALE_4 as f64;
        if volume <= 0.0 {
            continue;
        }

        // Tick rule on mid direction; tie splits proportional to the
        // per-side volume changes.
        let (buy_part, sell_part) = if new_mid > old_mid {
            (volume, 0.0)
        } else if new_mid < old_mid {
            (0.0, volume)
        } else {
            let ask_change = (new.ask_depth_50 - old.ask_depth_50).abs() as f64;
            let bid_change = (new.bid_depth_50 - old.bid_depth_50).abs() as f64;
            let total_change = ask_change + bid_change;
            if total_change <= 0.0 {
                (volume / 2.0, volume / 2.0)
            } else {
                (
                    volume * ask_change / total_change,
                    volume * bid_change / total_change,
                )
            }
        };

        // Pour the classified volume into fixed-notional buckets,
        // splitting across boundaries.
        let mut remaining_buy = buy_part;
        let mut remaining_sell = sell_part;
        while remaining_buy + remaining_sell > 0.0 {
            let remaining_total = remaining_buy + remaining_sell;
            let room = bucket_notional - current_fill;
            let take = remaining_total.min(room);
            let buy_share = remaining_buy / remaining_total;

            current.buy_volume += take * buy_share;
            current.sell_volume += take * (1.0 - buy_share);
            current_fill += take;
            remaining_buy -= take * buy_share;
            remaining_sell -= take * (1.0 - buy_share);

            if current_fill >= bucket_notional - f64::EPSILON {
                buckets.push(current);
                current = VolumeBucket {
                    buy_volume: 0.0,
                    sell_volume: 0.0,
                };
                current_fill = 0.0;
            }
            if take <= 0.0 {
                break;
            }
        }
    }

    if buckets.len() < config.bucket_count {
        return Err(AnalyticsError::InsufficientBuckets {
            required: config.bucket_count,
            available: buckets.len(),
        });
    }

    let tail = &buckets[buckets.len() - config.bucket_count..];
    let mut imbalance_sum = 0.0;
    let mut volume_sum = 0.0;
    let mut buy_total = 0.0;
    let mut sell_total = 0.0;
    for bucket in tail {
        imbalance_sum += (bucket.buy_volume - bucket.sell_volume).abs();
        volume_sum += bucket.buy_volume + bucket.sell_volume;
        buy_total += bucket.buy_volume;
        sell_total += bucket.sell_volume;
    }

    let vpin = if volume_sum > 0.0 {
        (imbalance_sum / volume_sum * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let newest = window.last().map_or(Ts::from_nanos(0), |s| s.ts);
    let (venue, symbol) = window
        .last()
        .map_or((String::new(), Symbol::new(0)), |s| {
            (s.venue.clone(), s.symbol)
        });
    debug!(vpin, buckets = buckets.len(), "vpin computed");

    Ok(VpinMetrics {
        venue,
        symbol,
        ts: newest,
        vpin,
        bucket_notional: config.bucket_notional,
        buckets_formed: buckets.len(),
        buy_volume: buy_total,
        sell_volume: sell_total,
        toxicity_level: ToxicityLevel::from_score(vpin),
    })
}
