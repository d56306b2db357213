//! Common constants used across all services
//!
//! Single source of truth for fixed-point scales and time conversions.

/// Fixed-point scale factor (4 decimal places)
pub const SCALE_4: i64 = 10_000;
/// Fixed-point scale factor as f64
pub const SCALE_4_F64: f64 = 10_000.0;

/// 1% expressed in basis points
pub const PERCENT_TO_BP: i64 = 100;

// Time constants
/// Milliseconds per second
pub const MILLIS_PER_SEC: u64 = 1_000;
/// Nanoseconds per second
pub const NANOS_PER_SEC: u64 = 1_000_000_000;
/// Nanoseconds per millisecond
pub const NANOS_PER_MILLI: u64 = 1_000_000;
/// Nanoseconds per microsecond
pub const NANOS_PER_MICRO: u64 = 1_000;
/// Seconds per minute
pub const SECS_PER_MIN: u64 = 60;
/// Seconds per hour
pub const SECS_PER_HOUR: u64 = 3_600;
/// Seconds per day
pub const SECS_PER_DAY: u64 = 86_400;
