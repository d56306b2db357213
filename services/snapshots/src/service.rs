//! Snapshot capture service: gateway + store wired by constructor DI

use crate::book::{BookSnapshot, normalize};
use crate::delta::{BookDelta, diff};
use crate::gateway::MarketDataGateway;
use crate::store::SnapshotStore;
use services_common::{AnalyticsResult, Symbol, Ts};
use std::sync::Arc;
use tracing::debug;

/// Fetches raw books from one venue gateway, normalizes them and
/// persists the result via the store collaborator.
pub struct SnapshotService {
    gateway: Arc<dyn MarketDataGateway>,
    store: Arc<dyn SnapshotStore>,
}

impl SnapshotService {
    /// Wire a service from its collaborators
    #[must_use]
    pub fn new(gateway: Arc<dyn MarketDataGateway>, store: Arc<dyn SnapshotStore>) -> Self {
        Self { gateway, store }
    }

    /// Venue this service captures from
    #[must_use]
    pub fn venue(&self) -> &str {
        self.gateway.venue()
    }

    /// Fetch, normalize and persist one snapshot; returns the stored copy
    pub async fn capture(
        &self,
        symbol: Symbol,
        depth_limit: usize,
    ) -> AnalyticsResult<BookSnapshot> {
        let raw = self.gateway.fetch_order_book(symbol, depth_limit).await?;
        let snapshot = normalize(self.gateway.venue(), symbol, raw, depth_limit)?;
        debug!(
            venue = %snapshot.venue,
            %symbol,
            bids = snapshot.bid_level_count(),
            asks = snapshot.ask_level_count(),
            "captured snapshot"
        );
        self.store.store(snapshot.clone()).await?;
        Ok(snapshot)
    }

    /// Latest persisted snapshot for this venue
    pub async fn latest(&self, symbol: Symbol) -> AnalyticsResult<BookSnapshot> {
        self.store.latest(self.gateway.venue(), symbol).await
    }

    /// Historical window `[from, to]`, ascending, capped at `limit`
    pub async fn historical(
        &self,
        symbol: Symbol,
        from: Ts,
        to: Ts,
        limit: usize,
    ) -> AnalyticsResult<Vec<BookSnapshot>> {
        self.store
            .range(self.gateway.venue(), symbol, from, to, limit)
            .await
    }

    /// Delta between the two most recent persisted snapshots, when at
    /// least two exist
    pub async fn latest_delta(&self, symbol: Symbol) -> AnalyticsResult<Option<BookDelta>> {
        let recent = self.store.recent(self.gateway.venue(), symbol, 2).await?;
        if recent.len() < 2 {
            return Ok(None);
        }
        Ok(Some(diff(&recent[0], &recent[1])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::RawOrderBook;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use services_common::{Px, Qty};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Gateway returning a book whose top bid size grows each call
    struct ScriptedGateway {
        calls: AtomicU64,
    }

    #[async_trait]
    impl MarketDataGateway for ScriptedGateway {
        fn venue(&self) -> &str {
            "binance"
        }

        async fn fetch_order_book(
            &self,
            _symbol: Symbol,
            _depth_limit: usize,
        ) -> AnalyticsResult<RawOrderBook> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawOrderBook {
                bids: vec![(Px::from_units(100), Qty::from_units(1 + call as i64))],
                asks: vec![(Px::from_units(101), Qty::from_units(2))],
                sequence: call,
                ts: Ts::from_secs(1_700_000_000 + call),
            })
        }
    }

    #[tokio::test]
    async fn test_capture_persists_and_diffs() {
        let service = SnapshotService::new(
            Arc::new(ScriptedGateway {
                calls: AtomicU64::new(0),
            }),
            Arc::new(MemoryStore::new()),
        );
        let symbol = Symbol::new(7);

        service.capture(symbol, 1).await.unwrap();
        service.capture(symbol, 1).await.unwrap();

        let latest = service.latest(symbol).await.unwrap();
        assert_eq!(latest.bids[0].size, Qty::from_units(2));

        let delta = service.latest_delta(symbol).await.unwrap().unwrap();
        assert_eq!(delta.bid_changes.len(), 1);
        assert_eq!(delta.bid_changes[0].size, Qty::from_units(2));
    }
}
