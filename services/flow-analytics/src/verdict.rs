//! Combined market-quality verdict
//!
//! Aggregates VPIN, toxicity, noise and Kyle's Lambda into an overall
//! quality tier and a trading recommendation. `Avoid` is forced whenever
//! VPIN exceeds 70 or the toxicity score exceeds 75, regardless of the
//! other components.

use crate::kyle::{DepthTier, KyleLambda};
use crate::noise::NoiseReport;
use crate::toxicity::ToxicityReport;
use crate::vpin::VpinMetrics;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Overall market-quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    /// Composite quality >= 75
    Excellent,
    /// Composite quality >= 50
    Good,
    /// Composite quality >= 25
    Fair,
    /// Composite quality < 25
    Poor,
}

/// Trading recommendation derived from the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradingRecommendation {
    /// Market conditions support normal execution
    Favorable,
    /// Nothing remarkable either way
    Neutral,
    /// Degraded conditions, trade carefully
    Caution,
    /// Informed-flow or toxicity red flags, stay out
    Avoid,
}

/// VPIN level above which the recommendation is forced to `Avoid`
pub const VPIN_AVOID_THRESHOLD: f64 = 70.0;
/// Toxicity score above which the recommendation is forced to `Avoid`
pub const TOXICITY_AVOID_THRESHOLD: f64 = 75.0;

/// Combined quality report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketQualityReport {
    /// VPIN metrics the verdict was built from
    pub vpin: VpinMetrics,
    /// Toxicity report
    pub toxicity: ToxicityReport,
    /// Noise report
    pub noise: NoiseReport,
    /// Kyle's Lambda estimate
    pub kyle: KyleLambda,
    /// Composite quality score in [0, 100]
    pub quality_score: f64,
    /// Tier over the composite score
    pub overall_quality: QualityTier,
    /// Final recommendation
    pub recommendation: TradingRecommendation,
}

/// Combine the four analytics into a verdict.
#[must_use]
pub fn compute_verdict(
    vpin: VpinMetrics,
    toxicity: ToxicityReport,
    noise: NoiseReport,
    kyle: KyleLambda,
) -> MarketQualityReport {
    let depth_component = match kyle.depth_tier {
        DepthTier::Deep => 100.0,
        DepthTier::Moderate => 60.0,
        DepthTier::Shallow => 20.0,
    };

    let quality_score = (0.3 * (100.0 - vpin.vpin)
        + 0.3 * (100.0 - toxicity.toxicity_score)
        + 0.2 * (100.0 - noise.noise_ratio * 100.0)
        + 0.2 * depth_component)
        .clamp(0.0, 100.0);

    let overall_quality = if quality_score >= 75.0 {
        QualityTier::Excellent
    } else if quality_score >= 50.0 {
        QualityTier::Good
    } else if quality_score >= 25.0 {
        QualityTier::Fair
    } else {
        QualityTier::Poor
    };

    let recommendation = if vpin.vpin > VPIN_AVOID_THRESHOLD
        || toxicity.toxicity_score > TOXICITY_AVOID_THRESHOLD
    {
        TradingRecommendation::Avoid
    } else if quality_score >= 70.0 {
        TradingRecommendation::Favorable
    } else if quality_score >= 50.0 {
        TradingRecommendation::Neutral
    } else if quality_score >= 30.0 {
        TradingRecommendation::Caution
    } else {
        TradingRecommendation::Avoid
    };

    debug!(quality_score, ?overall_quality, ?recommendation, "verdict computed");

    MarketQualityReport {
        vpin,
        toxicity,
        noise,
        kyle,
        quality_score,
        overall_quality,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toxicity::ToxicityLevel;
    use services_common::{Px, SCALE_4, Symbol, Ts};

    fn vpin_with(vpin: f64) -> VpinMetrics {
        VpinMetrics {
            venue: "binance".to_string(),
            symbol: Symbol::new(1),
            ts: Ts::from_secs(0),
            vpin,
            bucket_notional: SCALE_4,
            buckets_formed: 50,
            buy_volume: 1.0,
            sell_volume: 1.0,
            toxicity_level: ToxicityLevel::from_score(vpin),
        }
    }

    fn toxicity_with(score: f64) -> ToxicityReport {
        ToxicityReport {
            venue: "binance".to_string(),
            symbol: Symbol::new(1),
            ts: Ts::from_secs(0),
            effective_spread: 1.0,
            realized_spread: 0.5,
            adverse_selection_cost: 0.5,
            price_reversal_rate: 0.1,
            avg_price_impact: 5.0,
            toxicity_score: score,
            level: ToxicityLevel::from_score(score),
        }
    }

    fn noise_with(noise_ratio: f64) -> NoiseReport {
        NoiseReport {
            venue: "binance".to_string(),
            symbol: Symbol::new(1),
            ts: Ts::from_secs(0),
            efficiency_ratio: 1.0 - noise_ratio,
            noise_ratio,
            autocorrelation: 0.0,
            tick_size_estimate: Px::from_i64(1),
        }
    }

    fn kyle_with(tier: DepthTier) -> KyleLambda {
        KyleLambda {
            venue: "binance".to_string(),
            symbol: Symbol::new(1),
            ts: Ts::from_secs(0),
            lambda: match tier {
                DepthTier::Deep => 1e-6,
                DepthTier::Moderate => 5e-5,
                DepthTier::Shallow => 1e-3,
            },
            r_squared: 0.8,
            sample_size: 10,
            depth_tier: tier,
        }
    }

    #[test]
    fn test_healthy_market_is_favorable() {
        let report = compute_verdict(
            vpin_with(10.0),
            toxicity_with(10.0),
            noise_with(0.2),
            kyle_with(DepthTier::Deep),
        );
        assert_eq!(report.recommendation, TradingRecommendation::Favorable);
        assert_eq!(report.overall_quality, QualityTier::Excellent);
    }

    #[test]
    fn test_high_vpin_forces_avoid() {
        let report = compute_verdict(
            vpin_with(71.0),
            toxicity_with(5.0),
            noise_with(0.1),
            kyle_with(DepthTier::Deep),
        );
        assert_eq!(report.recommendation, TradingRecommendation::Avoid);
    }

    #[test]
    fn test_high_toxicity_forces_avoid() {
        let report = compute_verdict(
            vpin_with(5.0),
            toxicity_with(76.0),
            noise_with(0.1),
            kyle_with(DepthTier::Deep),
        );
        assert_eq!(report.recommendation, TradingRecommendation::Avoid);
    }

    #[test]
    fn test_shallow_noisy_market_degrades() {
        let report = compute_verdict(
            vpin_with(40.0),
            toxicity_with(45.0),
            noise_with(0.9),
            kyle_with(DepthTier::Shallow),
        );
        assert!(matches!(
            report.recommendation,
            TradingRecommendation::Caution | TradingRecommendation::Avoid
        ));
        assert!(report.quality_score < 50.0);
    }
}
