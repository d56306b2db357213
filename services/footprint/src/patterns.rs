//! Absorption and climax detection over footprint bars

use crate::bars::FootprintBar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use services_common::{Px, Qty, Symbol};
use tracing::debug;

/// Pattern thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Multiple of average window volume a bar must carry to count as
    /// high volume
    pub volume_multiple: f64,
    /// Maximum price move (percent) an absorption bar may show
    pub absorption_max_move_pct: f64,
    /// Minimum |delta| / volume for a climax bar
    pub climax_delta_ratio: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            volume_multiple: 2.0,
            absorption_max_move_pct: 0.1,
            climax_delta_ratio: 0.6,
        }
    }
}

/// High volume met by no price movement: someone is soaking up flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsorptionEvent {
    /// Instrument
    pub symbol: Symbol,
    /// Bar open time
    pub bar_open: DateTime<Utc>,
    /// Bar volume
    pub volume: Qty,
    /// Price move across the bar, in percent
    pub price_move_pct: f64,
    /// True when the absorbed flow was predominantly selling
    /// (buyers absorbed it, a bullish read)
    pub absorbed_selling: bool,
    /// Price the absorption happened around
    pub price: Px,
}

/// Outsized one-directional volume: a buying or selling climax
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimaxEvent {
    /// Instrument
    pub symbol: Symbol,
    /// Bar open time
    pub bar_open: DateTime<Utc>,
    /// Bar volume
    pub volume: Qty,
    /// Bar volume as a multiple of the window average
    pub volume_multiple: f64,
    /// Signed delta ratio of the bar, in [-1, 1]
    pub delta_ratio: f64,
    /// True for a buying climax, false for a selling climax
    pub is_buying_climax: bool,
}

/// Flag bars with high volume but almost no price movement.
#[must_use]
pub fn detect_absorption(config: &PatternConfig, bars: &[FootprintBar]) -> Vec<AbsorptionEvent> {
    let Some(avg_volume) = average_volume(bars) else {
        return Vec::new();
    };

    let events: Vec<AbsorptionEvent> = bars
        .iter()
        .filter(|bar| {
            bar.volume.as_f64() >= avg_volume * config.volume_multiple
                && bar.range_pct() < config.absorption_max_move_pct
        })
        .map(|bar| AbsorptionEvent {
            symbol: bar.symbol,
            bar_open: bar.open_time,
            volume: bar.volume,
            price_move_pct: bar.range_pct(),
            absorbed_selling: bar.delta < 0,
            price: bar.close,
        })
        .collect();

    debug!(bars = bars.len(), events = events.len(), "absorption scan complete");
    events
}

/// Flag bars whose volume and one-sidedness both spike.
#[must_use]
pub fn detect_climax(config: &PatternConfig, bars: &[FootprintBar]) -> Vec<ClimaxEvent> {
    let Some(avg_volume) = average_volume(bars) else {
        return Vec::new();
    };

    let events: Vec<ClimaxEvent> = bars
        .iter()
        .filter(|bar| {
            bar.volume.as_f64() > avg_volume * config.volume_multiple
                && bar.delta_ratio().abs() > config.climax_delta_ratio
        })
        .map(|bar| ClimaxEvent {
            symbol: bar.symbol,
            bar_open: bar.open_time,
            volume: bar.volume,
            volume_multiple: bar.volume.as_f64() / avg_volume,
            delta_ratio: bar.delta_ratio(),
            is_buying_climax: bar.delta > 0,
        })
        .collect();

    debug!(bars = bars.len(), events = events.len(), "climax scan complete");
    events
}

fn average_volume(bars: &[FootprintBar]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let avg = bars.iter().map(|b| b.volume.as_f64()).sum::<f64>() / bars.len() as f64;
    (avg > 0.0).then_some(avg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bars::{FootprintConfig, TradePrint, build_footprint_bars};
    use services_common::Ts;

    fn trade(secs: u64, price: f64, size: i64, is_buy: bool) -> TradePrint {
        TradePrint {
            symbol: Symbol::new(1),
            ts: Ts::from_secs(secs),
            price: Px::new(price),
            size: Qty::from_units(size),
            is_buy,
        }
    }

    /// Nine quiet two-sided bars plus one heavy bar shaped by `f`
    fn window_with_heavy_bar(heavy: Vec<TradePrint>) -> Vec<FootprintBar> {
        let mut trades = Vec::new();
        for bar in 0..9u64 {
            trades.push(trade(bar * 60, 100.0, 3, true));
            trades.push(trade(bar * 60 + 30, 100.5, 3, false));
        }
        trades.extend(heavy);
        build_footprint_bars(&FootprintConfig::default(), &trades).unwrap()
    }

    #[test]
    fn test_absorption_on_flat_heavy_bar() {
        // Heavy selling into an unmoving price
        let bars = window_with_heavy_bar(vec![
            trade(540, 100.0, 40, false),
            trade(550, 100.0, 40, false),
            trade(560, 100.0, 10, true),
        ]);
        let events = detect_absorption(&PatternConfig::default(), &bars);
        assert_eq!(events.len(), 1);
        assert!(events[0].absorbed_selling);
        assert!(events[0].price_move_pct < 0.1);
    }

    #[test]
    fn test_no_absorption_when_price_moves() {
        let bars = window_with_heavy_bar(vec![
            trade(540, 100.0, 40, false),
            trade(550, 98.0, 40, false),
        ]);
        let events = detect_absorption(&PatternConfig::default(), &bars);
        assert!(events.is_empty());
    }

    #[test]
    fn test_buying_climax() {
        let bars = window_with_heavy_bar(vec![
            trade(540, 100.0, 70, true),
            trade(550, 101.0, 10, false),
        ]);
        let events = detect_climax(&PatternConfig::default(), &bars);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_buying_climax);
        assert!(events[0].delta_ratio > 0.6);
        assert!(events[0].volume_multiple > 2.0);
    }

    #[test]
    fn test_balanced_heavy_bar_is_not_climax() {
        let bars = window_with_heavy_bar(vec![
            trade(540, 100.0, 40, true),
            trade(550, 100.0, 40, false),
        ]);
        assert!(detect_climax(&PatternConfig::default(), &bars).is_empty());
    }

    #[test]
    fn test_empty_window() {
        assert!(detect_absorption(&PatternConfig::default(), &[]).is_empty());
        assert!(detect_climax(&PatternConfig::default(), &[]).is_empty());
    }
}
