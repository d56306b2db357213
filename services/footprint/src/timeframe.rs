//! Bar timeframes

use chrono::Duration;
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult};

/// Timeframe for footprint bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1 minute bars
    M1,
    /// 5 minute bars
    M5,
    /// 15 minute bars
    M15,
    /// 30 minute bars
    M30,
    /// 1 hour bars
    H1,
    /// 4 hour bars
    H4,
    /// Daily bars
    D1,
}

impl Timeframe {
    /// Get duration in seconds
    #[must_use]
    pub const fn duration_seconds(&self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::M30 => 1800,
            Timeframe::H1 => 3600,
            Timeframe::H4 => 14_400,
            Timeframe::D1 => 86_400,
        }
    }

    /// Get chrono duration
    #[must_use]
    pub fn to_duration(&self) -> Duration {
        Duration::seconds(self.duration_seconds())
    }

    /// Parse a timeframe string ("1m", "5m", "15m", "30m", "1h", "4h",
    /// "1d"). Malformed input is rejected before any computation.
    pub fn parse(input: &str) -> AnalyticsResult<Self> {
        match input {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(AnalyticsError::InvalidParameter {
                name: "timeframe",
                reason: format!("unsupported timeframe '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        assert_eq!(Timeframe::M1.duration_seconds(), 60);
        assert_eq!(Timeframe::H1.duration_seconds(), 3600);
        assert_eq!(Timeframe::D1.duration_seconds(), 86_400);
    }

    #[test]
    fn test_parse_roundtrip() {
        assert_eq!(Timeframe::parse("5m").unwrap(), Timeframe::M5);
        assert_eq!(Timeframe::parse("4h").unwrap(), Timeframe::H4);
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(matches!(
            Timeframe::parse("7x"),
            Err(AnalyticsError::InvalidParameter { name: "timeframe", .. })
        ));
    }
}
