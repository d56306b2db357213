//! Composite liquidity scoring with regime bands

use serde::{Deserialize, Serialize};
use services_common::{SCALE_4, Symbol, Ts, stats};
use snapshots::BookSnapshot;
use tracing::debug;

/// Liquidity regime over the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityRegime {
    /// Score >= 80
    Abundant,
    /// Score >= 60
    Normal,
    /// Score >= 40
    Scarce,
    /// Score < 40
    Crisis,
}

impl LiquidityRegime {
    /// Fixed band thresholds over the composite score
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Abundant
        } else if score >= 60.0 {
            Self::Normal
        } else if score >= 40.0 {
            Self::Scarce
        } else {
            Self::Crisis
        }
    }
}

/// Scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityConfig {
    /// Notional (ticks) at which the depth component saturates at 100
    pub depth_reference_notional: i64,
    /// Spread percent at which the spread component reaches 0
    pub max_spread_pct: f64,
    /// Level count per side at which the density component saturates
    pub expected_levels_per_side: usize,
    /// Weight of the depth component
    pub depth_weight: f64,
    /// Weight of the spread-tightness component
    pub spread_weight: f64,
    /// Weight of the level-count density component
    pub volume_weight: f64,
    /// Weight of the stability component
    pub stability_weight: f64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            // $1M notional of top-10 depth saturates the depth component
            depth_reference_notional: 1_000_000 * SCALE_4,
            max_spread_pct: 0.5,
            expected_levels_per_side: 50,
            depth_weight: 0.35,
            spread_weight: 0.30,
            volume_weight: 0.20,
            stability_weight: 0.15,
        }
    }
}

/// Composite book-quality score in [0, 100] with component breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityScore {
    /// Venue of the scored snapshot
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Composite score in [0, 100]
    pub score: f64,
    /// Depth component (notional vs. reference)
    pub depth_score: f64,
    /// Spread-tightness component
    pub spread_score: f64,
    /// Level-count density component
    pub volume_score: f64,
    /// Mid-price stability component (neutral 50 without history)
    pub stability_score: f64,
    /// Regime band over the composite score
    pub regime: LiquidityRegime,
}

/// Score a snapshot, optionally against a trailing window of history
/// for the stability component.
///
/// With fewer than three historical snapshots the stability component
/// stays at the neutral 50.
#[must_use]
pub fn compute_liquidity(
    config: &LiquidityConfig,
    snapshot: &BookSnapshot,
    history: &[BookSnapshot],
) -> LiquidityScore {
    let depth_notional = snapshot.bid_depth_10 + snapshot.ask_depth_10;
    let depth_score = if config.depth_reference_notional > 0 {
        (depth_notional as f64 / config.depth_reference_notional as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    let spread_score = snapshot.spread_pct.map_or(0.0, |pct| {
        if config.max_spread_pct <= 0.0 {
            return 0.0;
        }
        ((1.0 - pct / config.max_spread_pct) * 100.0).clamp(0.0, 100.0)
    });

    let level_total = snapshot.bid_level_count() + snapshot.ask_level_count();
    let expected_total = config.expected_levels_per_side * 2;
    let volume_score = if expected_total > 0 {
        (level_total as f64 / expected_total as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    let stability_score = stability_from_history(history);

    let score = (config.depth_weight * depth_score
        + config.spread_weight * spread_score
        + config.volume_weight * volume_score
        + config.stability_weight * stability_score)
        .clamp(0.0, 100.0);

    let regime = LiquidityRegime::from_score(score);
    debug!(venue = %snapshot.venue, symbol = %snapshot.symbol, score, ?regime, "liquidity scored");

    LiquidityScore {
        venue: snapshot.venue.clone(),
        symbol: snapshot.symbol,
        ts: snapshot.ts,
        score,
        depth_score,
        spread_score,
        volume_score,
        stability_score,
        regime,
    }
}

/// Inverse relative mid-price dispersion; neutral 50 when history is
/// too short to estimate variance.
fn stability_from_history(history: &[BookSnapshot]) -> f64 {
    let mids: Vec<f64> = history
        .iter()
        .filter_map(|s| s.mid.map(|m| m.as_f64()))
        .collect();
    if mids.len() < 3 {
        return 50.0;
    }
    let cv = stats::coefficient_of_variation(&mids);
    // 1% relative dispersion zeroes the component
    ((1.0 - cv * 100.0) * 100.0).clamp(0.0, 100.0)
}
