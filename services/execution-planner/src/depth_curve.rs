//! Depth curves: impact sampled across a range of order sizes

use crate::impact::{ImpactConfig, estimate_impact};
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Qty, Side, Symbol, Ts};
use snapshots::BookSnapshot;

/// Curve sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthCurveConfig {
    /// Number of size steps sampled
    pub steps: usize,
    /// Largest sampled size, as a multiple of the average level size
    pub max_size_multiple: f64,
    /// Impact-split parameters forwarded to each sample
    pub impact: ImpactConfig,
}

impl Default for DepthCurveConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            max_size_multiple: 10.0,
            impact: ImpactConfig::default(),
        }
    }
}

/// One sampled point on the curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DepthPoint {
    /// Sampled order size
    pub size: Qty,
    /// Impact at that size, in percent
    pub impact_pct: f64,
    /// Share of side liquidity consumed, in [0, 100]
    pub liquidity_consumed_pct: f64,
}

/// Impact-vs-size curve for one side of a book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthCurve {
    /// Venue of the book
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Order side sampled
    pub side: Side,
    /// Sampled points, ascending by size; truncated where the book ran out
    pub points: Vec<DepthPoint>,
    /// d(impact)/d(size) across the curve endpoints, percent per unit
    pub elasticity: f64,
}

/// Sample the impact curve for `side`.
///
/// Sizes step linearly up to `max_size_multiple` times the average
/// level size of the walked ladder; the curve truncates at the first
/// size the book cannot fill. Fails with `InsufficientData` when the
/// walked ladder is empty or no point can be sampled.
pub fn build_depth_curve(
    config: &DepthCurveConfig,
    snapshot: &BookSnapshot,
    side: Side,
) -> AnalyticsResult<DepthCurve> {
    if config.steps == 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "steps",
            reason: "must be positive".to_string(),
        });
    }

    let ladder = snapshot.side_levels(side.opposite());
    if ladder.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let avg_level_size = snapshot
        .depth_qty(side.opposite(), ladder.len())
        .as_f64()
        / ladder.len() as f64;
    let max_size = avg_level_size * config.max_size_multiple;
    let step_size = max_size / config.steps as f64;

    let mut points = Vec::with_capacity(config.steps);
    for i in 1..=config.steps {
        let size = Qty::new(step_size * i as f64);
        if size.is_zero() {
            continue;
        }
        match estimate_impact(&config.impact, snapshot, side, size) {
            Ok(estimate) => points.push(DepthPoint {
                size,
                impact_pct: estimate.impact_pct,
                liquidity_consumed_pct: estimate.liquidity_consumed_pct,
            }),
            Err(AnalyticsError::InsufficientLiquidity { .. }) => break,
            Err(other) => return Err(other),
        }
    }

    if points.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let elasticity = if points.len() >= 2 {
        let first = &points[0];
        let last = &points[points.len() - 1];
        let size_span = last.size.as_f64() - first.size.as_f64();
        if size_span > 0.0 {
            (last.impact_pct - first.impact_pct) / size_span
        } else {
            0.0
        }
    } else {
        0.0
    };

    Ok(DepthCurve {
        venue: snapshot.venue.clone(),
        symbol: snapshot.symbol,
        ts: snapshot.ts,
        side,
        points,
        elasticity,
    })
}
