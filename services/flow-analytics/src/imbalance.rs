//! Multi-depth order-book imbalance and pressure

use serde::{Deserialize, Serialize};
use services_common::{Side, Symbol, Ts};
use snapshots::BookSnapshot;

/// Depths the signed imbalance is computed at
pub const IMBALANCE_DEPTHS: [usize; 4] = [5, 10, 20, 50];

/// Weights for the pressure blend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImbalanceConfig {
    /// Weight of the depth-10 signed imbalance in the pressure score
    pub imbalance_weight: f64,
    /// Weight of the normalized quote-currency volume imbalance
    pub volume_weight: f64,
}

impl Default for ImbalanceConfig {
    fn default() -> Self {
        Self {
            imbalance_weight: 0.6,
            volume_weight: 0.4,
        }
    }
}

/// Pressure state derived from one snapshot.
///
/// Signed imbalance is base-quantity based and always in [-1, 1]; the
/// quote-currency volume imbalance is notional (ticks). Momentum is the
/// first difference of pressure across consecutive records and defaults
/// to 0 on the first observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImbalanceRecord {
    /// Venue of the underlying snapshot
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Signed imbalance over the top 5 levels
    pub imbalance_5: f64,
    /// Signed imbalance over the top 10 levels
    pub imbalance_10: f64,
    /// Signed imbalance over the top 20 levels
    pub imbalance_20: f64,
    /// Signed imbalance over the top 50 levels
    pub imbalance_50: f64,
    /// Bid-minus-ask notional over the top 50 levels, in ticks
    pub volume_imbalance: i64,
    /// Pressure score in [-100, 100]
    pub pressure_score: f64,
    /// First difference of pressure vs. the previous record
    pub momentum: f64,
    /// Running sum of pressure across the records seen so far
    pub cumulative_pressure: f64,
}

impl ImbalanceRecord {
    /// Signed imbalance at one of the standard depths
    #[must_use]
    pub fn at_depth(&self, depth: usize) -> f64 {
        match depth {
            5 => self.imbalance_5,
            10 => self.imbalance_10,
            20 => self.imbalance_20,
            _ => self.imbalance_50,
        }
    }

    /// True when all four depth imbalances share the same sign
    #[must_use]
    pub fn signs_consistent(&self) -> bool {
        let values = [
            self.imbalance_5,
            self.imbalance_10,
            self.imbalance_20,
            self.imbalance_50,
        ];
        values.iter().all(|v| *v >= 0.0) || values.iter().all(|v| *v <= 0.0)
    }
}

/// Signed size imbalance at one depth: (bid - ask) / (bid + ask).
///
/// 0 when both sides are empty at that depth.
#[must_use]
pub fn imbalance_at_depth(snapshot: &BookSnapshot, depth: usize) -> f64 {
    let bid = snapshot.depth_qty(Side::Buy, depth).as_f64();
    let ask = snapshot.depth_qty(Side::Sell, depth).as_f64();
    let total = bid + ask;
    if total <= 0.0 {
        return 0.0;
    }
    (bid - ask) / total
}

/// Derive the imbalance/pressure record for a snapshot.
///
/// `prev` is the previous record for the same (venue, symbol), used for
/// momentum and the cumulative sum; pass `None` on first observation.
#[must_use]
pub fn compute_imbalance(
    config: &ImbalanceConfig,
    snapshot: &BookSnapshot,
    prev: Option<&ImbalanceRecord>,
) -> ImbalanceRecord {
    let imbalance_10 = imbalance_at_depth(snapshot, 10);

    let bid_notional = snapshot.bid_depth_50;
    let ask_notional = snapshot.ask_depth_50;
    let volume_imbalance = bid_notional - ask_notional;
    let notional_total = bid_notional + ask_notional;
    let normalized_volume = if notional_total > 0 {
        volume_imbalance as f64 / notional_total as f64
    } else {
        0.0
    };

    let pressure_score = ((config.imbalance_weight * imbalance_10
        + config.volume_weight * normalized_volume)
        * 100.0)
        .clamp(-100.0, 100.0);

    let momentum = prev.map_or(0.0, |p| pressure_score - p.pressure_score);
    let cumulative_pressure =
        prev.map_or(pressure_score, |p| p.cumulative_pressure + pressure_score);

    ImbalanceRecord {
        venue: snapshot.venue.clone(),
        symbol: snapshot.symbol,
        ts: snapshot.ts,
        imbalance_5: imbalance_at_depth(snapshot, 5),
        imbalance_10,
        imbalance_20: imbalance_at_depth(snapshot, 20),
        imbalance_50: imbalance_at_depth(snapshot, 50),
        volume_imbalance,
        pressure_score,
        momentum,
        cumulative_pressure,
    }
}
