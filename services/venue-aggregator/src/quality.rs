//! Venue quality scoring and ranking

use serde::{Deserialize, Serialize};
use services_common::{SCALE_4, Symbol, Ts};
use snapshots::BookSnapshot;

/// Venue tier over the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VenueTier {
    /// Overall >= 75
    Tier1,
    /// Overall >= 50
    Tier2,
    /// Overall < 50
    Tier3,
}

impl VenueTier {
    /// Band an overall score
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::Tier1
        } else if score >= 50.0 {
            Self::Tier2
        } else {
            Self::Tier3
        }
    }
}

/// Scoring parameters (mirrors the liquidity scorer's shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Notional (ticks) at which the depth subscore saturates
    pub depth_reference_notional: i64,
    /// Spread percent at which the spread subscore reaches 0
    pub max_spread_pct: f64,
    /// Level count per side at which the density subscore saturates
    pub expected_levels_per_side: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            depth_reference_notional: 1_000_000 * SCALE_4,
            max_spread_pct: 0.5,
            expected_levels_per_side: 50,
        }
    }
}

/// Ranked quality score for one venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueQualityScore {
    /// Venue scored
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Depth subscore in [0, 100]
    pub liquidity_score: f64,
    /// Spread-tightness subscore in [0, 100]
    pub spread_score: f64,
    /// Level-density subscore in [0, 100]
    pub depth_score: f64,
    /// Stability subscore (neutral 50 without history)
    pub stability_score: f64,
    /// Weighted overall score in [0, 100]
    pub overall: f64,
    /// Tier band over the overall score
    pub tier: VenueTier,
    /// 1-based rank by descending overall score
    pub rank: usize,
}

/// Score each venue snapshot and rank descending by overall score.
///
/// Scoring is per-venue, so a missing venue simply does not appear —
/// individual venue failures degrade the ranking, never fail it.
#[must_use]
pub fn score_venues(config: &QualityConfig, books: &[BookSnapshot]) -> Vec<VenueQualityScore> {
    let mut scores: Vec<VenueQualityScore> = books
        .iter()
        .map(|book| {
            let depth_notional = book.bid_depth_10 + book.ask_depth_10;
            let liquidity_score = if config.depth_reference_notional > 0 {
                (depth_notional as f64 / config.depth_reference_notional as f64 * 100.0)
                    .min(100.0)
            } else {
                0.0
            };

            let spread_score = book.spread_pct.map_or(0.0, |pct| {
                if config.max_spread_pct <= 0.0 {
                    return 0.0;
                }
                ((1.0 - pct / config.max_spread_pct) * 100.0).clamp(0.0, 100.0)
            });

            let level_total = book.bid_level_count() + book.ask_level_count();
            let expected = config.expected_levels_per_side * 2;
            let depth_score = if expected > 0 {
                (level_total as f64 / expected as f64 * 100.0).min(100.0)
            } else {
                0.0
            };

            // Stability needs history this surface does not carry yet
            let stability_score = 50.0;

            let overall = (0.35 * liquidity_score
                + 0.30 * spread_score
                + 0.20 * depth_score
                + 0.15 * stability_score)
                .clamp(0.0, 100.0);

            VenueQualityScore {
                venue: book.venue.clone(),
                symbol: book.symbol,
                ts: book.ts,
                liquidity_score,
                spread_score,
                depth_score,
                stability_score,
                overall,
                tier: VenueTier::from_score(overall),
                rank: 0,
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.overall
            .partial_cmp(&a.overall)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, score) in scores.iter_mut().enumerate() {
        score.rank = i + 1;
    }
    scores
}
