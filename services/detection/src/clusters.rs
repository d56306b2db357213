//! Order clustering into support/resistance zones

use serde::{Deserialize, Serialize};
use services_common::{Px, Qty, SCALE_4_F64, Side, Symbol, Ts};
use snapshots::{BookSnapshot, PriceLevel};
use tracing::debug;

/// What the cluster is likely there for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterIntention {
    /// Strong bid-side cluster defending a price
    Support,
    /// Strong ask-side cluster capping a price
    Resistance,
    /// Weaker bid-side build-up
    Accumulation,
    /// Weaker ask-side build-up
    Distribution,
}

/// Clustering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Price-range tolerance binding levels into one cluster, in percent
    pub price_tolerance_pct: f64,
    /// Minimum member levels per cluster
    pub min_members: usize,
    /// Strength above which a cluster reads as support/resistance
    pub strong_threshold: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            price_tolerance_pct: 0.5,
            min_members: 3,
            strong_threshold: 70.0,
        }
    }
}

/// A group of same-side levels packed within the price tolerance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCluster {
    /// Venue of the snapshot
    pub venue: String,
    /// Instrument
    pub symbol: Symbol,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Side the cluster sits on
    pub side: Side,
    /// Lowest member price
    pub price_low: Px,
    /// Highest member price
    pub price_high: Px,
    /// Size-weighted center price
    pub center_price: Px,
    /// Member level count
    pub member_count: usize,
    /// Aggregate size
    pub total_size: Qty,
    /// Aggregate notional, in currency units
    pub total_notional: f64,
    /// Blend of member density and notional share, in [0, 100]
    pub strength: f64,
    /// Intention heuristic from side and strength
    pub intention: ClusterIntention,
}

/// Group same-side levels within the price tolerance.
#[must_use]
pub fn detect_clusters(config: &ClusterConfig, snapshot: &BookSnapshot) -> Vec<OrderCluster> {
    let bid_total = snapshot.depth_notional(Side::Buy, snapshot.bids.len()) as f64 / SCALE_4_F64;
    let ask_total = snapshot.depth_notional(Side::Sell, snapshot.asks.len()) as f64 / SCALE_4_F64;

    let mut clusters = Vec::new();
    for (side, levels, side_total) in [
        (Side::Buy, &snapshot.bids, bid_total),
        (Side::Sell, &snapshot.asks, ask_total),
    ] {
        clusters.extend(cluster_side(config, snapshot, side, levels, side_total));
    }

    clusters.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    debug!(venue = %snapshot.venue, clusters = clusters.len(), "cluster scan complete");
    clusters
}

fn cluster_side(
    config: &ClusterConfig,
    snapshot: &BookSnapshot,
    side: Side,
    levels: &[PriceLevel],
    side_total: f64,
) -> Vec<OrderCluster> {
    let mut clusters = Vec::new();
    let mut members: Vec<PriceLevel> = Vec::new();

    // Ladders are price-sorted, so a greedy sweep anchored at the first
    // member finds maximal tolerance-bound groups.
    for level in levels {
        let anchor_price = members.first().map(|l| l.price.as_f64());
        match anchor_price {
            Some(anchor) => {
                let distance_pct = ((level.price.as_f64() - anchor) / anchor).abs() * 100.0;
                if distance_pct <= config.price_tolerance_pct {
                    members.push(*level);
                } else {
                    if let Some(cluster) =
                        build_cluster(config, snapshot, side, &members, side_total)
                    {
                        clusters.push(cluster);
                    }
                    members.clear();
                    members.push(*level);
                }
            }
            None => members.push(*level),
        }
    }
    if let Some(cluster) = build_cluster(config, snapshot, side, &members, side_total) {
        clusters.push(cluster);
    }
    clusters
}

fn build_cluster(
    config: &ClusterConfig,
    snapshot: &BookSnapshot,
    side: Side,
    members: &[PriceLevel],
    side_total: f64,
) -> Option<OrderCluster> {
    if members.len() < config.min_members {
        return None;
    }

    let total_size = members.iter().fold(Qty::ZERO, |acc, l| acc.add(l.size));
    let total_notional: f64 = members
        .iter()
        .map(|l| l.notional() as f64 / SCALE_4_F64)
        .sum();

    let weighted_price: f64 = members
        .iter()
        .map(|l| l.price.as_f64() * (l.notional() as f64 / SCALE_4_F64))
        .sum::<f64>()
        / total_notional.max(f64::EPSILON);

    let notional_share = if side_total > 0.0 {
        (total_notional / side_total).min(1.0)
    } else {
        0.0
    };
    let density = (members.len() as f64 / 10.0).min(1.0);
    let strength = 50.0 * density + 50.0 * notional_share;

    let strong = strength >= config.strong_threshold;
    let intention = match (side, strong) {
        (Side::Buy, true) => ClusterIntention::Support,
        (Side::Buy, false) => ClusterIntention::Accumulation,
        (Side::Sell, true) => ClusterIntention::Resistance,
        (Side::Sell, false) => ClusterIntention::Distribution,
    };

    let mut prices: Vec<Px> = members.iter().map(|l| l.price).collect();
    prices.sort();

    Some(OrderCluster {
        venue: snapshot.venue.clone(),
        symbol: snapshot.symbol,
        ts: snapshot.ts,
        side,
        price_low: *prices.first()?,
        price_high: *prices.last()?,
        center_price: Px::new(weighted_price),
        member_count: members.len(),
        total_size,
        total_notional,
        strength,
        intention,
    })
}
