//! Session volume profiles: POC and value area

use crate::bars::TradePrint;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Px, Qty, Symbol, Ts};
use tracing::debug;

/// Profile parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Price rounding step, in ticks
    pub price_step: i64,
    /// Share of total volume the value area captures, in (0, 1]
    pub value_area_fraction: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            price_step: services_common::SCALE_4, // 1.0
            value_area_fraction: 0.70,
        }
    }
}

/// Volume resting at one rounded price across the session
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolumeLevel {
    /// Rounded price
    pub price: Px,
    /// Total volume
    pub volume: Qty,
    /// Aggressor-buy volume
    pub buy_volume: Qty,
    /// Aggressor-sell volume
    pub sell_volume: Qty,
    /// Trades at the level
    pub trades: u32,
}

/// Volume profile over an arbitrary trade window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Instrument
    pub symbol: Symbol,
    /// First trade timestamp
    pub start_ts: Ts,
    /// Last trade timestamp
    pub end_ts: Ts,
    /// Levels, ascending by price
    pub levels: Vec<VolumeLevel>,
    /// Point of control: price with the highest volume
    pub poc: Px,
    /// Value-area high
    pub vah: Px,
    /// Value-area low
    pub val: Px,
    /// Total session volume
    pub total_volume: Qty,
}

/// Build a volume profile over a trade window.
///
/// Rounds prices down to `price_step`, finds the POC, then expands
/// outward from it (preferring the higher-volume neighbor) until the
/// configured share of total volume is captured, yielding VAH/VAL.
pub fn build_profile(
    config: &ProfileConfig,
    trades: &[TradePrint],
) -> AnalyticsResult<SessionProfile> {
    if config.price_step <= 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "price_step",
            reason: "must be positive".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&config.value_area_fraction) || config.value_area_fraction == 0.0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "value_area_fraction",
            reason: "must be in (0, 1]".to_string(),
        });
    }
    if trades.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let mut level_map: FxHashMap<i64, VolumeLevel> = FxHashMap::default();
    for trade in trades {
        let rounded = (trade.price.as_i64() / config.price_step) * config.price_step;
        let level = level_map.entry(rounded).or_insert(VolumeLevel {
            price: Px::from_i64(rounded),
            volume: Qty::ZERO,
            buy_volume: Qty::ZERO,
            sell_volume: Qty::ZERO,
            trades: 0,
        });
        level.volume = level.volume.add(trade.size);
        level.trades += 1;
        if trade.is_buy {
            level.buy_volume = level.buy_volume.add(trade.size);
        } else {
            level.sell_volume = level.sell_volume.add(trade.size);
        }
    }

    let mut levels: Vec<VolumeLevel> = level_map.into_values().collect();
    levels.sort_by(|a, b| a.price.cmp(&b.price));

    let total_volume = levels.iter().fold(Qty::ZERO, |acc, l| acc.add(l.volume));
    let poc_index = levels
        .iter()
        .enumerate()
        .max_by_key(|(_, l)| l.volume.as_i64())
        .map_or(0, |(i, _)| i);

    // Expand outward from the POC until the value-area share is reached
    let target = total_volume.as_f64() * config.value_area_fraction;
    let mut captured = levels[poc_index].volume.as_f64();
    let mut low = poc_index;
    let mut high = poc_index;
    while captured < target {
        let below = low.checked_sub(1).map(|i| levels[i].volume.as_i64());
        let above = (high + 1 < levels.len()).then(|| levels[high + 1].volume.as_i64());
        match (below, above) {
            (None, None) => break,
            (Some(_), None) => {
                low -= 1;
                captured += levels[low].volume.as_f64();
            }
            (None, Some(_)) => {
                high += 1;
                captured += levels[high].volume.as_f64();
            }
            (Some(b), Some(a)) => {
                if b >= a {
                    low -= 1;
                    captured += levels[low].volume.as_f64();
                } else {
                    high += 1;
                    captured += levels[high].volume.as_f64();
                }
            }
        }
    }

    let profile = SessionProfile {
        symbol: trades[0].symbol,
        start_ts: trades[0].ts,
        end_ts: trades[trades.len() - 1].ts,
        poc: levels[poc_index].price,
        vah: levels[high].price,
        val: levels[low].price,
        total_volume,
        levels,
    };
    debug!(
        levels = profile.levels.len(),
        poc = %profile.poc,
        vah = %profile.vah,
        val = %profile.val,
        "session profile built"
    );
    Ok(profile)
}
