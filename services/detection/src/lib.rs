//! Detection engines for anomalous and manipulative order-flow patterns
//!
//! Statistical and lifecycle-based detectors over snapshot windows:
//! - Large/whale orders (per-level notional outliers)
//! - Iceberg orders (renewal-pattern matching)
//! - Spoofing/layering (placement/cancel lifecycle tracking)
//! - Order clustering (support/resistance zones)
//! - Liquidity-zone persistence with explicit reconciliation
//!
//! Lifecycle state is rebuilt per analysis window — detectors hold no
//! long-lived mutable state apart from the zone tracker, whose
//! `last_seen`/`is_active` fields are mutated only by its reconcile
//! step.

#![warn(missing_docs)]

pub mod clusters;
pub mod iceberg;
pub mod large_orders;
pub mod spoofing;
pub mod zones;

pub use clusters::{ClusterConfig, ClusterIntention, OrderCluster, detect_clusters};
pub use iceberg::{IcebergConfig, IcebergDetection, detect_icebergs};
pub use large_orders::{
    LargeOrderConfig, LargeOrderDetection, OrderClassification, detect_large_orders,
};
pub use spoofing::{Severity, SpoofingConfig, SpoofingDetection, SpoofingKind, detect_spoofing};
pub use zones::{LiquidityZone, ZoneConfig, ZoneKind, ZoneTracker};
