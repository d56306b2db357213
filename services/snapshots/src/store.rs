//! Snapshot persistence collaborator
//!
//! The engine never owns durable storage; it talks to this trait. The
//! bounded `MemoryStore` is the reference implementation used by tests
//! and the demo binary.

use crate::book::BookSnapshot;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use services_common::{AnalyticsError, AnalyticsResult, Symbol, Ts};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Time-series persistence for snapshots, keyed by (venue, symbol, ts)
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist one snapshot (append-only)
    async fn store(&self, snapshot: BookSnapshot) -> AnalyticsResult<()>;

    /// Most recent snapshot for a (venue, symbol).
    ///
    /// Fails with `InsufficientData` when none exists.
    async fn latest(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<BookSnapshot>;

    /// Snapshots within `[from, to]` in ascending time order, capped at
    /// `limit` most recent rows.
    ///
    /// Fails with `InsufficientData` when no rows exist in the window.
    async fn range(
        &self,
        venue: &str,
        symbol: Symbol,
        from: Ts,
        to: Ts,
        limit: usize,
    ) -> AnalyticsResult<Vec<BookSnapshot>>;

    /// The `limit` most recent snapshots in ascending time order.
    ///
    /// Fails with `InsufficientData` when none exist.
    async fn recent(
        &self,
        venue: &str,
        symbol: Symbol,
        limit: usize,
    ) -> AnalyticsResult<Vec<BookSnapshot>>;
}

type SeriesKey = (String, Symbol);
type Series = BTreeMap<u64, BookSnapshot>;

/// Bounded in-memory snapshot store.
///
/// Retains at most `max_per_series` snapshots per (venue, symbol),
/// evicting the oldest first.
pub struct MemoryStore {
    series: Arc<RwLock<FxHashMap<SeriesKey, Series>>>,
    max_per_series: usize,
}

impl MemoryStore {
    /// Default per-series retention
    pub const DEFAULT_RETENTION: usize = 10_000;

    /// Create a store with default retention
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(Self::DEFAULT_RETENTION)
    }

    /// Create a store retaining at most `max_per_series` snapshots per key
    #[must_use]
    pub fn with_retention(max_per_series: usize) -> Self {
        Self {
            series: Arc::new(RwLock::new(FxHashMap::default())),
            max_per_series: max_per_series.max(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn store(&self, snapshot: BookSnapshot) -> AnalyticsResult<()> {
        let key = (snapshot.venue.clone(), snapshot.symbol);
        let ts = snapshot.ts.as_nanos();
        let mut series = self.series.write().await;
        let entry = series.entry(key).or_default();
        entry.insert(ts, snapshot);
        while entry.len() > self.max_per_series {
            let oldest = *entry.keys().next().unwrap_or(&0);
            entry.remove(&oldest);
            debug!(ts = oldest, "evicted oldest snapshot past retention");
        }
        Ok(())
    }

    async fn latest(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<BookSnapshot> {
        let series = self.series.read().await;
        series
            .get(&(venue.to_string(), symbol))
            .and_then(|s| s.values().next_back().cloned())
            .ok_or(AnalyticsError::InsufficientData {
                required: 1,
                available: 0,
            })
    }

    async fn range(
        &self,
        venue: &str,
        symbol: Symbol,
        from: Ts,
        to: Ts,
        limit: usize,
    ) -> AnalyticsResult<Vec<BookSnapshot>> {
        let series = self.series.read().await;
        let rows: Vec<BookSnapshot> = series
            .get(&(venue.to_string(), symbol))
            .map(|s| {
                s.range(from.as_nanos()..=to.as_nanos())
                    .map(|(_, snap)| snap.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if rows.is_empty() {
            return Err(AnalyticsError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let skip = rows.len().saturating_sub(limit.max(1));
        Ok(rows.into_iter().skip(skip).collect())
    }

    async fn recent(
        &self,
        venue: &str,
        symbol: Symbol,
        limit: usize,
    ) -> AnalyticsResult<Vec<BookSnapshot>> {
        let series = self.series.read().await;
        let rows: Vec<BookSnapshot> = series
            .get(&(venue.to_string(), symbol))
            .map(|s| {
                let skip = s.len().saturating_sub(limit.max(1));
                s.values().skip(skip).cloned().collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if rows.is_empty() {
            return Err(AnalyticsError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        Ok(rows)
    }
}
