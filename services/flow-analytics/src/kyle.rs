//! Kyle's Lambda: price-impact coefficient
//!
//! Ordinary least squares of |mid change| on |book volume change| across
//! consecutive snapshot pairs. Lambda proxies market depth: the larger
//! the coefficient, the more one unit of volume moves price.

use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, SCALE_4, Symbol, Ts, stats};
use snapshots::BookSnapshot;

/// Market-depth tier over lambda
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthTier {
    /// lambda < 1e-5: very deep market
    Deep,
    /// lambda < 1e-4: moderate depth
    Moderate,
    /// Otherwise: shallow market
    Shallow,
}

impl DepthTier {
    /// Band a lambda estimate
    #[must_use]
    pub fn from_lambda(lambda: f64) -> Self {
        if lambda < 1e-5 {
            Self::Deep
        } else if lambda < 1e-4 {
            Self::Moderate
        } else {
            Self::Shallow
        }
    }
}

/// Regression parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KyleConfig {
    /// Minimum valid (nonzero-volume) regression points
    pub min_points: usize,
}

impl Default for KyleConfig {
    fn default() -> Self {
        Self { min_points: 5 }
    }
}

/// Price-impact regression result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KyleLambda {
    /// Venue of the window
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest snapshot
    pub ts: Ts,
    /// Impact coefficient: price units moved per notional unit traded
    pub lambda: f64,
    /// Goodness of fit in [0, 1]
    pub r_squared: f64,
    /// Regression points used
    pub sample_size: usize,
    /// Depth tier over lambda
    pub depth_tier: DepthTier,
}

/// Estimate Kyle's Lambda over an ascending snapshot window.
///
/// Pairs with zero volume change are excluded; fewer than
/// `config.min_points` remaining pairs (or zero volume variance, which
/// leaves the regression undefined) fails with `InsufficientData`.
pub fn compute_kyle_lambda(
    config: &KyleConfig,
    window: &[BookSnapshot],
) -> AnalyticsResult<KyleLambda> {
    let mut price_changes = Vec::new();
    let mut volume_changes = Vec::new();

    for pair in window.windows(2) {
        let (old, new) = (&pair[0], &pair[1]);
        let (Some(old_mid), Some(new_mid)) = (old.mid, new.mid) else {
            continue;
        };
        let volume_change =
            (new.total_notional() - old.total_notional()).abs() as f64 / SCALE_4 as f64;
        if volume_change <= 0.0 {
            continue;
        }
        price_changes.push((new_mid.as_f64() - old_mid.as_f64()).abs());
        volume_changes.push(volume_change);
    }

    if price_changes.len() < config.min_points {
        return Err(AnalyticsError::InsufficientData {
            required: config.min_points,
            available: price_changes.len(),
        });
    }

    // Slope of |price change| on |volume change|; variance-free volume
    // leaves lambda undefined.
    let (slope, _, r_squared) = stats::linear_regression(&volume_changes, &price_changes)
        .ok_or(AnalyticsError::InsufficientData {
            required: config.min_points,
            available: 0,
        })?;

    let lambda = slope.abs();
    let newest = window.last().map_or(Ts::from_nanos(0), |s| s.ts);
    let (venue, symbol) = window
        .last()
        .map_or((String::new(), Symbol::new(0)), |s| {
            (s.venue.clone(), s.symbol)
        });

    Ok(KyleLambda {
        venue,
        symbol,
        ts: newest,
        lambda,
        r_squared,
        sample_size: price_changes.len(),
        depth_tier: DepthTier::from_lambda(lambda),
    })
}
