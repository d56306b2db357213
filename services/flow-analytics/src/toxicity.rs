//! Order-flow toxicity from effective vs. realized spread
//!
//! Adverse-selection cost is what remains of the effective spread after
//! the realized price move over a fixed delay is taken out. The score
//! blends that cost with price-reversal frequency and average per-step
//! price impact.

use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Symbol, Ts};
use snapshots::BookSnapshot;

/// Toxicity banding at 25/50/75
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToxicityLevel {
    /// Score < 25
    Low,
    /// Score < 50
    Medium,
    /// Score < 75
    High,
    /// Score >= 75
    Extreme,
}

impl ToxicityLevel {
    /// Band a 0-100 score
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            Self::Low
        } else if score < 50.0 {
            Self::Medium
        } else if score < 75.0 {
            Self::High
        } else {
            Self::Extreme
        }
    }
}

/// Toxicity computation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToxicityConfig {
    /// Snapshots of delay for the realized-spread price move
    pub realized_delay: usize,
    /// Weight of the adverse-selection component
    pub adverse_weight: f64,
    /// Weight of the price-reversal component
    pub reversal_weight: f64,
    /// Weight of the average-impact component
    pub impact_weight: f64,
}

impl Default for ToxicityConfig {
    fn default() -> Self {
        Self {
            realized_delay: 5,
            adverse_weight: 0.4,
            reversal_weight: 0.3,
            impact_weight: 0.3,
        }
    }
}

/// Adverse-selection report over a snapshot window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToxicityReport {
    /// Venue of the window
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest snapshot
    pub ts: Ts,
    /// Mean observed spread, in price units
    pub effective_spread: f64,
    /// Mean absolute mid move over the configured delay, in price units
    pub realized_spread: f64,
    /// Effective minus realized spread, floored at 0
    pub adverse_selection_cost: f64,
    /// Fraction of consecutive mid moves that reversed direction, in [0, 1]
    pub price_reversal_rate: f64,
    /// Mean per-step |mid move| relative to the effective spread, in [0, 100]
    pub avg_price_impact: f64,
    /// Composite score in [0, 100]
    pub toxicity_score: f64,
    /// Band over the composite score
    pub level: ToxicityLevel,
}

/// Compute flow toxicity over an ascending window of snapshots.
///
/// Requires at least `realized_delay + 2` snapshots with a defined mid.
pub fn compute_toxicity(
    config: &ToxicityConfig,
    window: &[BookSnapshot],
) -> AnalyticsResult<ToxicityReport> {
    if config.realized_delay == 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "realized_delay",
            reason: "must be positive".to_string(),
        });
    }

    let mids: Vec<f64> = window
        .iter()
        .filter_map(|s| s.mid.map(|m| m.as_f64()))
        .collect();
    let spreads: Vec<f64> = window
        .iter()
        .filter_map(|s| s.spread.map(|sp| sp.as_f64()))
        .collect();

    let required = config.realized_delay + 2;
    if mids.len() < required {
        return Err(AnalyticsError::InsufficientData {
            required,
            available: mids.len(),
        });
    }

    let effective_spread = spreads.iter().sum::<f64>() / spreads.len() as f64;

    // Realized spread: mean |mid move| over the delay horizon
    let realized_spread = {
        let moves: Vec<f64> = mids
            .windows(config.realized_delay + 1)
            .map(|w| (w[config.realized_delay] - w[0]).abs())
            .collect();
        moves.iter().sum::<f64>() / moves.len() as f64
    };

    let adverse_selection_cost = (effective_spread - realized_spread).max(0.0);

    // Reversal rate over consecutive nonzero mid moves
    let moves: Vec<f64> = mids.windows(2).map(|w| w[1] - w[0]).collect();
    let mut reversals = 0usize;
    let mut comparisons = 0usize;
    for pair in moves.windows(2) {
        if pair[0] != 0.0 && pair[1] != 0.0 {
            comparisons += 1;
            if pair[0].signum() != pair[1].signum() {
                reversals += 1;
            }
        }
    }
    let price_reversal_rate = if comparisons > 0 {
        reversals as f64 / comparisons as f64
    } else {
        0.0
    };

    // Per-step impact relative to the effective spread
    let avg_price_impact = if effective_spread > 0.0 {
        let mean_move =
            moves.iter().map(|m| m.abs()).sum::<f64>() / moves.len().max(1) as f64;
        (mean_move / effective_spread * 100.0).min(100.0)
    } else {
        0.0
    };

    let adverse_ratio = if effective_spread > 0.0 {
        (adverse_selection_cost / effective_spread * 100.0).min(100.0)
    } else {
        0.0
    };

    let toxicity_score = (config.adverse_weight * adverse_ratio
        + config.reversal_weight * price_reversal_rate * 100.0
        + config.impact_weight * avg_price_impact)
        .clamp(0.0, 100.0);

    let newest = window.last().map_or(Ts::from_nanos(0), |s| s.ts);
    let (venue, symbol) = window
        .last()
        .map_or((String::new(), Symbol::new(0)), |s| {
            (s.venue.clone(), s.symbol)
        });

    Ok(ToxicityReport {
        venue,
        symbol,
        ts: newest,
        effective_spread,
        realized_spread,
        adverse_selection_cost,
        price_reversal_rate,
        avg_price_impact,
        toxicity_score,
        level: ToxicityLevel::from_score(toxicity_score),
    })
}
