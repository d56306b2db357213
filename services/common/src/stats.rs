//! Small statistics toolbox shared by the analytics engines
//!
//! Plain-f64 helpers over already-extracted samples. Engines convert
//! fixed-point values to f64 once at the computation boundary and keep
//! all notional arithmetic in ticks.

/// Arithmetic mean; 0.0 for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0.0 for fewer than two samples
#[must_use]
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Coefficient of variation (std dev / mean); 0.0 when the mean is ~0
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.abs() < f64::EPSILON {
        return 0.0;
    }
    std_dev(values) / m
}

/// Nearest-rank percentile of an unsorted sample, `pct` in [0, 100]
#[must_use]
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let clamped = pct.clamp(0.0, 100.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rank = ((clamped / 100.0 * sorted.len() as f64).ceil() as usize).max(1) - 1;
    sorted[rank.min(sorted.len() - 1)]
}

/// Percentile rank of a value within a sample, in [0, 100]
#[must_use]
pub fn percentile_rank(values: &[f64], value: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let below = values.iter().filter(|v| **v <= value).count();
    below as f64 / values.len() as f64 * 100.0
}

/// Ordinary least squares fit of y on x.
///
/// Returns `(slope, intercept, r_squared)`, or `None` when fewer than
/// two points are supplied or x carries no variance (the regression is
/// undefined, not zero).
#[must_use]
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<(f64, f64, f64)> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);

    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    let mut y_variance = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        let dy = y - my;
        covariance += dx * dy;
        x_variance += dx * dx;
        y_variance += dy * dy;
    }

    if x_variance < f64::EPSILON {
        return None;
    }

    let slope = covariance / x_variance;
    let intercept = my - slope * mx;
    let r_squared = if y_variance < f64::EPSILON {
        1.0
    } else {
        (covariance * covariance) / (x_variance * y_variance)
    };
    Some((slope, intercept, r_squared))
}

/// Lag-1 autocorrelation; 0.0 when undefined
#[must_use]
pub fn autocorrelation_lag1(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 0.0;
    }
    let m = mean(values);
    let denom: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    if denom < f64::EPSILON {
        return 0.0;
    }
    let num: f64 = values
        .windows(2)
        .map(|w| (w[0] - m) * (w[1] - m))
        .sum();
    num / denom
}
