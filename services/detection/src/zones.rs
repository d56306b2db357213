//! Liquidity-zone persistence tracking
//!
//! A zone is a price that keeps holding meaningful liquidity across
//! snapshots. The tracker is the one stateful detector: zones carry
//! `last_seen`/`is_active` fields that are mutated only by `observe`
//! and the explicit `reconcile` step.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{Px, SCALE_4_F64, Side, Symbol, Ts};
use snapshots::BookSnapshot;
use tracing::debug;

/// What kind of zone the persistence pattern suggests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    /// Strong persistent bid-side liquidity
    Support,
    /// Strong persistent ask-side liquidity
    Resistance,
    /// Growing bid-side liquidity, not yet dominant
    Accumulation,
    /// Growing ask-side liquidity, not yet dominant
    Distribution,
}

/// Tracker parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Minimum notional (currency units) a level must hold to count as
    /// zone-intensity liquidity
    pub intensity_notional: f64,
    /// Snapshots a price must persist for before a zone activates
    pub min_duration_snapshots: usize,
    /// Nanoseconds without a sighting before reconcile deactivates a zone
    pub expiry_nanos: u64,
    /// Strength above which a zone reads as support/resistance
    pub strong_threshold: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            intensity_notional: 10_000.0,
            min_duration_snapshots: 5,
            expiry_nanos: 300 * 1_000_000_000, // 5 minutes
            strong_threshold: 70.0,
        }
    }
}

/// A persistent price cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityZone {
    /// Venue the zone was observed on
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Zone price level
    pub price_level: Px,
    /// Side the liquidity rests on
    pub side: Side,
    /// Running mean notional observed at the level, in currency units
    pub total_liquidity: f64,
    /// Zone classification
    pub zone_kind: ZoneKind,
    /// Persistence-weighted strength, in [0, 100]
    pub strength: f64,
    /// Confidence that the zone is real, in [0, 100]
    pub confidence: f64,
    /// Snapshots the level has been sighted in
    pub seen_count: usize,
    /// First sighting
    pub first_seen: Ts,
    /// Most recent sighting (mutated by `observe`)
    pub last_seen: Ts,
    /// Whether the zone is currently active (mutated by `reconcile`)
    pub is_active: bool,
}

/// Stateful zone tracker, one per (venue, symbol)
pub struct ZoneTracker {
    config: ZoneConfig,
    zones: FxHashMap<(Side, i64), LiquidityZone>,
    observations: usize,
}

impl ZoneTracker {
    /// Create a tracker
    #[must_use]
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            config,
            zones: FxHashMap::default(),
            observations: 0,
        }
    }

    /// Feed one snapshot into the tracker.
    ///
    /// Prices holding at least the intensity notional get their zone
    /// counters bumped; a zone activates once it persists for
    /// `min_duration_snapshots` sightings.
    pub fn observe(&mut self, snapshot: &BookSnapshot) {
        self.observations += 1;
        for (side, levels) in [(Side::Buy, &snapshot.bids), (Side::Sell, &snapshot.asks)] {
            for level in levels.iter() {
                let notional = level.notional() as f64 / SCALE_4_F64;
                if notional < self.config.intensity_notional {
                    continue;
                }
                let key = (side, level.price.as_i64());
                let entry = self.zones.entry(key).or_insert_with(|| LiquidityZone {
                    venue: snapshot.venue.clone(),
                    symbol: snapshot.symbol,
                    price_level: level.price,
                    side,
                    total_liquidity: 0.0,
                    zone_kind: match side {
                        Side::Buy => ZoneKind::Accumulation,
                        Side::Sell => ZoneKind::Distribution,
                    },
                    strength: 0.0,
                    confidence: 0.0,
                    seen_count: 0,
                    first_seen: snapshot.ts,
                    last_seen: snapshot.ts,
                    is_active: false,
                });

                // Running mean of observed notional
                entry.total_liquidity = (entry.total_liquidity * entry.seen_count as f64
                    + notional)
                    / (entry.seen_count + 1) as f64;
                entry.seen_count += 1;
                entry.last_seen = snapshot.ts;

                let persistence = entry.seen_count as f64 / self.observations as f64;
                let intensity_ratio =
                    (entry.total_liquidity / self.config.intensity_notional).min(2.0) / 2.0;
                entry.strength = (50.0 * persistence + 50.0 * intensity_ratio).min(100.0);
                entry.confidence = (persistence * 100.0).min(100.0);

                if entry.seen_count >= self.config.min_duration_snapshots {
                    entry.is_active = true;
                }
                entry.zone_kind = match (side, entry.strength >= self.config.strong_threshold) {
                    (Side::Buy, true) => ZoneKind::Support,
                    (Side::Buy, false) => ZoneKind::Accumulation,
                    (Side::Sell, true) => ZoneKind::Resistance,
                    (Side::Sell, false) => ZoneKind::Distribution,
                };
            }
        }
    }

    /// Deactivate zones not sighted within the expiry horizon and drop
    /// never-activated stale candidates. Returns deactivation count.
    pub fn reconcile(&mut self, now: Ts) -> usize {
        let expiry = self.config.expiry_nanos;
        let mut deactivated = 0;
        self.zones.retain(|_, zone| {
            let stale = now.nanos_since(zone.last_seen) > expiry;
            if stale && zone.is_active {
                zone.is_active = false;
                deactivated += 1;
                debug!(price = %zone.price_level, side = %zone.side, "zone deactivated");
                true
            } else {
                // Stale candidates that never activated are dropped to
                // keep the arena bounded by the analysis horizon
                !(stale && !zone.is_active)
            }
        });
        deactivated
    }

    /// Currently active zones, strongest first
    #[must_use]
    pub fn active_zones(&self) -> Vec<&LiquidityZone> {
        let mut zones: Vec<&LiquidityZone> =
            self.zones.values().filter(|z| z.is_active).collect();
        zones.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        zones
    }

    /// All tracked zones, active or not
    #[must_use]
    pub fn all_zones(&self) -> Vec<&LiquidityZone> {
        self.zones.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services_common::Qty;
    use snapshots::{RawOrderBook, normalize};

    fn snapshot_at(secs: u64, big_bid: bool) -> BookSnapshot {
        let mut bids = vec![(Px::from_units(100), Qty::from_units(1))];
        if big_bid {
            bids.push((Px::from_units(98), Qty::from_units(200)));
        }
        normalize(
            "binance",
            Symbol::new(1),
            RawOrderBook {
                bids,
                asks: vec![(Px::from_units(101), Qty::from_units(1))],
                sequence: secs,
                ts: Ts::from_secs(secs),
            },
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_zone_activates_after_min_duration() {
        let mut tracker = ZoneTracker::new(ZoneConfig::default());
        for i in 0..4 {
            tracker.observe(&snapshot_at(i, true));
            assert!(tracker.active_zones().is_empty());
        }
        tracker.observe(&snapshot_at(4, true));
        let active = tracker.active_zones();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].price_level, Px::from_units(98));
        assert_eq!(active[0].side, Side::Buy);
        assert!(active[0].seen_count >= 5);
    }

    #[test]
    fn test_small_levels_never_become_zones() {
        let mut tracker = ZoneTracker::new(ZoneConfig::default());
        for i in 0..10 {
            tracker.observe(&snapshot_at(i, false));
        }
        assert!(tracker.all_zones().is_empty());
    }

    #[test]
    fn test_reconcile_deactivates_stale_zones() {
        let mut tracker = ZoneTracker::new(ZoneConfig::default());
        for i in 0..6 {
            tracker.observe(&snapshot_at(i, true));
        }
        assert_eq!(tracker.active_zones().len(), 1);

        // 10 minutes later with no sightings
        let deactivated = tracker.reconcile(Ts::from_secs(606));
        assert_eq!(deactivated, 1);
        assert!(tracker.active_zones().is_empty());
        // Zone is kept for history, just inactive
        assert_eq!(tracker.all_zones().len(), 1);
        assert!(!tracker.all_zones()[0].is_active);
    }

    #[test]
    fn test_reconcile_within_horizon_keeps_zone() {
        let mut tracker = ZoneTracker::new(ZoneConfig::default());
        for i in 0..6 {
            tracker.observe(&snapshot_at(i, true));
        }
        let deactivated = tracker.reconcile(Ts::from_secs(60));
        assert_eq!(deactivated, 0);
        assert_eq!(tracker.active_zones().len(), 1);
    }

    #[test]
    fn test_persistent_strong_zone_reads_as_support() {
        let mut tracker = ZoneTracker::new(ZoneConfig::default());
        for i in 0..20 {
            tracker.observe(&snapshot_at(i, true));
        }
        let active = tracker.active_zones();
        assert_eq!(active[0].zone_kind, ZoneKind::Support);
        assert!(active[0].confidence > 90.0);
    }
}
