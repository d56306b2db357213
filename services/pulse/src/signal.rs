//! Composite directional signal

use flow_analytics::{ImbalanceRecord, LiquidityScore};
use serde::{Deserialize, Serialize};
use services_common::{Symbol, Ts};
use tracing::debug;

/// Signal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    /// Combined score above the positive threshold
    Bullish,
    /// Combined score below the negative threshold
    Bearish,
    /// In between
    Neutral,
}

/// Divergence flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceKind {
    /// Price falling while book pressure is strongly positive
    Bullish,
    /// Price rising while book pressure is strongly negative
    Bearish,
}

/// Signal parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Weight of the depth-10 imbalance (scaled to +/-100)
    pub imbalance_weight: f64,
    /// Weight of the pressure score
    pub pressure_weight: f64,
    /// Weight of the pressure momentum
    pub momentum_weight: f64,
    /// Liquidity weight: scales magnitude only, never direction
    pub liquidity_weight: f64,
    /// |combined| threshold past which direction flips off neutral
    pub direction_threshold: f64,
    /// Signals under this confidence are filtered out
    pub min_confidence: f64,
    /// Signals under this strength are filtered out
    pub min_strength: f64,
    /// |pressure| needed before divergence can fire
    pub divergence_pressure_threshold: f64,
    /// |price change %| needed before divergence can fire
    pub divergence_price_threshold_pct: f64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            imbalance_weight: 0.35,
            pressure_weight: 0.35,
            momentum_weight: 0.20,
            liquidity_weight: 0.10,
            direction_threshold: 30.0,
            min_confidence: 40.0,
            min_strength: 10.0,
            divergence_pressure_threshold: 30.0,
            divergence_price_threshold_pct: 0.1,
        }
    }
}

/// Composite trading signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseSignal {
    /// Venue the inputs came from
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the underlying imbalance record
    pub ts: Ts,
    /// Direction
    pub direction: SignalDirection,
    /// Strength in [0, 100], liquidity-scaled
    pub strength: f64,
    /// Confidence in [0, 100]
    pub confidence: f64,
    /// Raw combined score before liquidity scaling, in [-100, 100]
    pub combined_score: f64,
    /// Depth-10 imbalance input
    pub imbalance_10: f64,
    /// Pressure input
    pub pressure_score: f64,
    /// Momentum input
    pub momentum: f64,
    /// Liquidity score input
    pub liquidity: f64,
    /// Human-readable explanation
    pub reason: String,
}

/// Divergence between book pressure and realized price movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivergenceSignal {
    /// Venue the inputs came from
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the underlying record
    pub ts: Ts,
    /// Divergence flavor
    pub kind: DivergenceKind,
    /// Pressure at detection time
    pub pressure_score: f64,
    /// Externally measured price change, in percent
    pub price_change_pct: f64,
}

/// Build the composite signal from an imbalance record and the current
/// liquidity score.
#[must_use]
pub fn generate_signal(
    config: &PulseConfig,
    imbalance: &ImbalanceRecord,
    liquidity: &LiquidityScore,
) -> PulseSignal {
    let combined_score = (config.imbalance_weight * imbalance.imbalance_10 * 100.0
        + config.pressure_weight * imbalance.pressure_score
        + config.momentum_weight * imbalance.momentum)
        .clamp(-100.0, 100.0);

    let direction = if combined_score > config.direction_threshold {
        SignalDirection::Bullish
    } else if combined_score < -config.direction_threshold {
        SignalDirection::Bearish
    } else {
        SignalDirection::Neutral
    };

    // Liquidity scales magnitude only: a crisis-liquidity book halves
    // conviction, an abundant one leaves it untouched.
    let liquidity_factor = (1.0 - config.liquidity_weight)
        + config.liquidity_weight * (liquidity.score / 100.0);
    let strength = (combined_score.abs() * liquidity_factor).clamp(0.0, 100.0);

    let mut confidence: f64 = 50.0;
    // Liquidity quality: up to +15
    confidence += ((liquidity.score - 50.0) * 0.3).clamp(-15.0, 15.0);
    // Cross-depth sign consistency: +15
    if imbalance.signs_consistent() {
        confidence += 15.0;
    }
    // Spread tightness: up to +10
    confidence += (liquidity.spread_score / 10.0).min(10.0);
    // Absolute depth: up to +10
    confidence += (liquidity.depth_score / 10.0).min(10.0);
    let confidence = confidence.clamp(0.0, 100.0);

    let reason = format!(
        "{direction:?}: imbalance10 {:.2}, pressure {:.1}, momentum {:.1}, liquidity {:.0} ({:?})",
        imbalance.imbalance_10, imbalance.pressure_score, imbalance.momentum,
        liquidity.score, liquidity.regime,
    );

    debug!(
        venue = %imbalance.venue,
        symbol = %imbalance.symbol,
        ?direction,
        strength,
        confidence,
        "pulse signal generated"
    );

    PulseSignal {
        venue: imbalance.venue.clone(),
        symbol: imbalance.symbol,
        ts: imbalance.ts,
        direction,
        strength,
        confidence,
        combined_score,
        imbalance_10: imbalance.imbalance_10,
        pressure_score: imbalance.pressure_score,
        momentum: imbalance.momentum,
        liquidity: liquidity.score,
        reason,
    }
}

/// Filter check before a signal is offered to consumers.
///
/// Rejects signals under the confidence/strength floors and signals
/// whose direction disagrees with the sign of the pressure input.
#[must_use]
pub fn validate_signal(config: &PulseConfig, signal: &PulseSignal) -> bool {
    if signal.confidence < config.min_confidence {
        return false;
    }
    if signal.direction != SignalDirection::Neutral && signal.strength < config.min_strength {
        return false;
    }
    match signal.direction {
        SignalDirection::Bullish if signal.pressure_score < 0.0 => false,
        SignalDirection::Bearish if signal.pressure_score > 0.0 => false,
        _ => true,
    }
}

/// Compare an externally measured price change against current pressure.
#[must_use]
pub fn detect_divergence(
    config: &PulseConfig,
    imbalance: &ImbalanceRecord,
    price_change_pct: f64,
) -> Option<DivergenceSignal> {
    if price_change_pct.abs() < config.divergence_price_threshold_pct {
        return None;
    }
    let kind = if price_change_pct < 0.0
        && imbalance.pressure_score >= config.divergence_pressure_threshold
    {
        DivergenceKind::Bullish
    } else if price_change_pct > 0.0
        && imbalance.pressure_score <= -config.divergence_pressure_threshold
    {
        DivergenceKind::Bearish
    } else {
        return None;
    };

    Some(DivergenceSignal {
        venue: imbalance.venue.clone(),
        symbol: imbalance.symbol,
        ts: imbalance.ts,
        kind,
        pressure_score: imbalance.pressure_score,
        price_change_pct,
    })
}
