//! Snapshot access layer
//!
//! Normalizes raw venue order books into the canonical snapshot/delta
//! representation used by every downstream analytics engine:
//! - Level-1 derivation (best bid/ask, spread, mid) and pre-aggregated
//!   notional depth at 10/50 levels
//! - Price-keyed diffing into incremental deltas
//! - The `MarketDataGateway` and `SnapshotStore` collaborator traits
//!   with a bounded in-memory reference store
//!
//! Snapshots are append-only: created once at ingestion, never mutated.

#![warn(missing_docs)]

pub mod book;
pub mod delta;
pub mod gateway;
pub mod service;
pub mod store;

pub use book::{BookSnapshot, PriceLevel, RawOrderBook, normalize};
pub use delta::{BookDelta, DeltaKind, diff};
pub use gateway::MarketDataGateway;
pub use service::SnapshotService;
pub use store::{MemoryStore, SnapshotStore};
