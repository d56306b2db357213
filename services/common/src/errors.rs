//! Common error types for the analytics services

use crate::types::Qty;
use thiserror::Error;

/// Result alias used by every analytics computation
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Error vocabulary shared by all analytics engines.
///
/// Every algorithm with a minimum sample size surfaces
/// `InsufficientData` rather than defaulting to zero; the single
/// sanctioned silent default is pressure momentum on first observation.
#[derive(Debug, Clone, Error)]
pub enum AnalyticsError {
    /// Fewer snapshots/trades than the algorithm's minimum sample size
    #[error("insufficient data: {required} samples required, {available} available")]
    InsufficientData {
        /// Minimum sample count the algorithm needs
        required: usize,
        /// Samples actually available in the window
        available: usize,
    },

    /// VPIN could not form the required number of volume buckets
    #[error("insufficient volume buckets: {required} required, {available} formed")]
    InsufficientBuckets {
        /// Bucket count the VPIN window needs
        required: usize,
        /// Buckets that could be formed from the window
        available: usize,
    },

    /// The book cannot fill the requested size
    #[error("insufficient liquidity: filled {filled} of {requested}")]
    InsufficientLiquidity {
        /// Size that was requested
        requested: Qty,
        /// Size the book was able to fill
        filled: Qty,
    },

    /// A venue failed during aggregation or could not be queried
    #[error("venue {venue} unreachable: {reason}")]
    VenueUnreachable {
        /// Venue that failed
        venue: String,
        /// Failure description
        reason: String,
    },

    /// Malformed timeframe/threshold input, rejected before computation
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}
