//! Liquidity-concentration measurement (Herfindahl index)

use serde::{Deserialize, Serialize};
use services_common::{SCALE_4_F64, Symbol, Ts};
use snapshots::BookSnapshot;

/// One venue's share of total liquidity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueShare {
    /// Venue
    pub venue: String,
    /// Total notional on the venue, in currency units
    pub notional: f64,
    /// Market share, in percent
    pub share_pct: f64,
}

/// Cross-venue liquidity distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityDistribution {
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest contributing snapshot
    pub ts: Ts,
    /// Per-venue shares, largest first
    pub shares: Vec<VenueShare>,
    /// Herfindahl-Hirschman Index: sum of squared percent shares.
    /// 10000 when one venue holds everything.
    pub hhi: f64,
    /// Effective venue count: 10000 / HHI
    pub effective_venues: f64,
}

/// Measure how concentrated liquidity is across venues.
#[must_use]
pub fn measure_concentration(books: &[BookSnapshot]) -> LiquidityDistribution {
    let symbol = books.first().map_or(Symbol::new(0), |b| b.symbol);
    let ts = books
        .iter()
        .map(|b| b.ts)
        .max()
        .unwrap_or(services_common::Ts::from_nanos(0));

    let mut shares: Vec<VenueShare> = books
        .iter()
        .map(|book| VenueShare {
            venue: book.venue.clone(),
            notional: book.total_notional() as f64 / SCALE_4_F64,
            share_pct: 0.0,
        })
        .collect();

    let total: f64 = shares.iter().map(|s| s.notional).sum();
    if total > 0.0 {
        for share in &mut shares {
            share.share_pct = share.notional / total * 100.0;
        }
    }
    shares.sort_by(|a, b| {
        b.share_pct
            .partial_cmp(&a.share_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let hhi: f64 = shares.iter().map(|s| s.share_pct * s.share_pct).sum();
    let effective_venues = if hhi > 0.0 { 10_000.0 / hhi } else { 0.0 };

    LiquidityDistribution {
        symbol,
        ts,
        shares,
        hhi,
        effective_venues,
    }
}
