//! Footprint bars: per-bar, per-price buy/sell volume

use crate::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Px, Qty, Symbol, Ts};
use tracing::debug;

/// One executed trade as reported by a venue
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TradePrint {
    /// Instrument
    pub symbol: Symbol,
    /// Execution timestamp
    pub ts: Ts,
    /// Execution price
    pub price: Px,
    /// Executed size
    pub size: Qty,
    /// Whether the aggressor was the buyer
    pub is_buy: bool,
}

/// Builder parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintConfig {
    /// Bar timeframe
    pub timeframe: Timeframe,
    /// Price rounding step for footprint rows, in ticks
    pub price_step: i64,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::M1,
            price_step: services_common::SCALE_4, // 1.0
        }
    }
}

/// Buy/sell volume traded at one rounded price inside a bar
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceRow {
    /// Rounded price
    pub price: Px,
    /// Aggressor-buy volume
    pub buy_volume: Qty,
    /// Aggressor-sell volume
    pub sell_volume: Qty,
}

impl PriceRow {
    /// Total volume in the row
    #[must_use]
    pub const fn total(&self) -> Qty {
        self.buy_volume.add(self.sell_volume)
    }

    /// Signed (buy - sell) / total imbalance; 0 for an empty row
    #[must_use]
    pub fn imbalance(&self) -> f64 {
        let total = self.total().as_f64();
        if total <= 0.0 {
            return 0.0;
        }
        (self.buy_volume.as_f64() - self.sell_volume.as_f64()) / total
    }
}

/// One complete footprint bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintBar {
    /// Instrument
    pub symbol: Symbol,
    /// Timeframe
    pub timeframe: Timeframe,
    /// Bar open time (UTC)
    pub open_time: DateTime<Utc>,
    /// Bar close time (UTC)
    pub close_time: DateTime<Utc>,
    /// Open price
    pub open: Px,
    /// High price
    pub high: Px,
    /// Low price
    pub low: Px,
    /// Close price
    pub close: Px,
    /// Total volume
    pub volume: Qty,
    /// Aggressor-buy volume
    pub buy_volume: Qty,
    /// Aggressor-sell volume
    pub sell_volume: Qty,
    /// Buy minus sell volume, in size units
    pub delta: i64,
    /// Per-price rows, ascending by price
    pub rows: Vec<PriceRow>,
    /// Point of control: the row with the highest total volume
    pub poc: Px,
    /// Trades folded into the bar
    pub trade_count: u32,
}

impl FootprintBar {
    /// Signed delta as a share of total volume, in [-1, 1]
    #[must_use]
    pub fn delta_ratio(&self) -> f64 {
        let total = self.volume.as_f64();
        if total <= 0.0 {
            return 0.0;
        }
        (self.delta as f64 / services_common::SCALE_4_F64) / total
    }

    /// Absolute price move across the bar, in percent of the open
    #[must_use]
    pub fn range_pct(&self) -> f64 {
        if self.open.is_zero() {
            return 0.0;
        }
        (self.close.as_f64() - self.open.as_f64()).abs() / self.open.as_f64() * 100.0
    }
}

/// Bucket trades into timeframe bars with per-price footprint rows.
///
/// Trades must be in ascending time order; prices round down to
/// `price_step`. Fails with `InvalidParameter` on a non-positive step
/// and with `InsufficientData` when no trades are supplied.
pub fn build_footprint_bars(
    config: &FootprintConfig,
    trades: &[TradePrint],
) -> AnalyticsResult<Vec<FootprintBar>> {
    if config.price_step <= 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "price_step",
            reason: "must be positive".to_string(),
        });
    }
    if trades.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let bar_secs = config.timeframe.duration_seconds();
    let mut by_bar: FxHashMap<i64, Vec<&TradePrint>> = FxHashMap::default();
    for trade in trades {
        #[allow(clippy::cast_possible_wrap)]
        let trade_secs = (trade.ts.as_nanos() / 1_000_000_000) as i64;
        by_bar
            .entry((trade_secs / bar_secs) * bar_secs)
            .or_default()
            .push(trade);
    }
    let mut opens: Vec<i64> = by_bar.keys().copied().collect();
    opens.sort_unstable();

    let mut bars: Vec<FootprintBar> = Vec::with_capacity(opens.len());
    for open_secs in opens {
        let bar_trades = &by_bar[&open_secs];
        let first = bar_trades[0];
        let mut bar = FootprintBar {
            symbol: first.symbol,
            timeframe: config.timeframe,
            open_time: DateTime::from_timestamp(open_secs, 0).unwrap_or_default(),
            close_time: DateTime::from_timestamp(open_secs + bar_secs, 0).unwrap_or_default(),
            open: first.price,
            high: first.price,
            low: first.price,
            close: first.price,
            volume: Qty::ZERO,
            buy_volume: Qty::ZERO,
            sell_volume: Qty::ZERO,
            delta: 0,
            rows: Vec::new(),
            poc: first.price,
            trade_count: 0,
        };
        let mut rows: FxHashMap<i64, PriceRow> = FxHashMap::default();

        for trade in bar_trades {
            if trade.price > bar.high {
                bar.high = trade.price;
            }
            if trade.price < bar.low {
                bar.low = trade.price;
            }
            bar.close = trade.price;
            bar.volume = bar.volume.add(trade.size);
            bar.trade_count += 1;
            if trade.is_buy {
                bar.buy_volume = bar.buy_volume.add(trade.size);
            } else {
                bar.sell_volume = bar.sell_volume.add(trade.size);
            }

            let rounded = (trade.price.as_i64() / config.price_step) * config.price_step;
            let row = rows.entry(rounded).or_insert(PriceRow {
                price: Px::from_i64(rounded),
                buy_volume: Qty::ZERO,
                sell_volume: Qty::ZERO,
            });
            if trade.is_buy {
                row.buy_volume = row.buy_volume.add(trade.size);
            } else {
                row.sell_volume = row.sell_volume.add(trade.size);
            }
        }

        bar.delta = bar.buy_volume.as_i64() - bar.sell_volume.as_i64();
        let mut sorted_rows: Vec<PriceRow> = rows.into_values().collect();
        sorted_rows.sort_by(|a, b| a.price.cmp(&b.price));
        bar.poc = sorted_rows
            .iter()
            .max_by_key(|r| r.total().as_i64())
            .map_or(bar.close, |r| r.price);
        bar.rows = sorted_rows;
        bars.push(bar);
    }

    debug!(bars = bars.len(), trades = trades.len(), "footprint bars built");
    Ok(bars)
}
