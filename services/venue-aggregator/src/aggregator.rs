//! Concurrent multi-venue fetch fan-out
//!
//! One symbol, N venue gateways: fetches fan out concurrently with a
//! per-venue timeout and join. A venue that fails or times out is
//! logged and excluded; the aggregation continues with what arrived.
//! Dropping the returned future aborts all in-flight fetches without
//! corrupting any state (every computation downstream is pure).

use crate::arbitrage::{ArbitrageConfig, ArbitrageOpportunity, scan_arbitrage};
use crate::concentration::{LiquidityDistribution, measure_concentration};
use crate::merge::{AggregatedBook, merge_books};
use crate::quality::{QualityConfig, VenueQualityScore, score_venues};
use crate::routing::{RoutingConfig, RoutingPlan, smart_route};
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Qty, Side, Symbol};
use snapshots::{BookSnapshot, MarketDataGateway, normalize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fan-out parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Per-venue fetch timeout, in milliseconds
    pub venue_timeout_ms: u64,
    /// Depth requested from each venue
    pub depth_limit: usize,
    /// Router fee schedule
    pub routing: RoutingConfig,
    /// Arbitrage scan parameters
    pub arbitrage: ArbitrageConfig,
    /// Venue quality parameters
    pub quality: QualityConfig,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            venue_timeout_ms: 2_000,
            depth_limit: 50,
            routing: RoutingConfig::default(),
            arbitrage: ArbitrageConfig::default(),
            quality: QualityConfig::default(),
        }
    }
}

/// Result of one fan-out: the snapshots that arrived plus the venues
/// that had to be excluded
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Normalized per-venue snapshots
    pub books: Vec<BookSnapshot>,
    /// (venue, reason) for every excluded venue
    pub excluded: Vec<(String, String)>,
}

/// Multi-venue aggregation service over gateway adapters
pub struct MultiVenueAggregator {
    gateways: Vec<Arc<dyn MarketDataGateway>>,
    config: AggregatorConfig,
}

impl MultiVenueAggregator {
    /// Wire an aggregator from its venue gateways
    #[must_use]
    pub fn new(gateways: Vec<Arc<dyn MarketDataGateway>>, config: AggregatorConfig) -> Self {
        Self { gateways, config }
    }

    /// Venues this aggregator queries
    #[must_use]
    pub fn venues(&self) -> Vec<&str> {
        self.gateways.iter().map(|g| g.venue()).collect()
    }

    /// Fan out fetches to every venue and normalize what arrives.
    ///
    /// Fails with `VenueUnreachable` only when every venue failed.
    pub async fn fetch_books(&self, symbol: Symbol) -> AnalyticsResult<FetchOutcome> {
        let timeout = Duration::from_millis(self.config.venue_timeout_ms);
        let depth = self.config.depth_limit;

        let fetches = self.gateways.iter().map(|gateway| {
            let gateway = Arc::clone(gateway);
            async move {
                let venue = gateway.venue().to_string();
                let result =
                    tokio::time::timeout(timeout, gateway.fetch_order_book(symbol, depth)).await;
                match result {
                    Ok(Ok(raw)) => match normalize(&venue, symbol, raw, depth) {
                        Ok(book) => Ok(book),
                        Err(err) => Err((venue, err.to_string())),
                    },
                    Ok(Err(err)) => Err((venue, err.to_string())),
                    Err(_) => Err((venue, format!("timed out after {}ms", timeout.as_millis()))),
                }
            }
        });

        let mut books = Vec::new();
        let mut excluded = Vec::new();
        for result in futures::future::join_all(fetches).await {
            match result {
                Ok(book) => books.push(book),
                Err((venue, reason)) => {
                    warn!(venue = %venue, reason = %reason, "venue excluded from aggregation");
                    excluded.push((venue, reason));
                }
            }
        }

        if books.is_empty() {
            let reasons = excluded
                .iter()
                .map(|(v, r)| format!("{v}: {r}"))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AnalyticsError::VenueUnreachable {
                venue: "all".to_string(),
                reason: reasons,
            });
        }

        debug!(
            %symbol,
            arrived = books.len(),
            excluded = excluded.len(),
            "venue fan-out complete"
        );
        Ok(FetchOutcome { books, excluded })
    }

    /// Fetch and merge the cross-venue book
    pub async fn aggregate(&self, symbol: Symbol) -> AnalyticsResult<AggregatedBook> {
        let outcome = self.fetch_books(symbol).await?;
        Ok(merge_books(&outcome.books))
    }

    /// Fetch and build a best-execution routing plan
    pub async fn route(
        &self,
        symbol: Symbol,
        side: Side,
        size: Qty,
    ) -> AnalyticsResult<RoutingPlan> {
        let outcome = self.fetch_books(symbol).await?;
        smart_route(&self.config.routing, &outcome.books, side, size)
    }

    /// Fetch and scan for cross-venue arbitrage
    pub async fn arbitrage(&self, symbol: Symbol) -> AnalyticsResult<Vec<ArbitrageOpportunity>> {
        let outcome = self.fetch_books(symbol).await?;
        Ok(scan_arbitrage(&self.config.arbitrage, &outcome.books))
    }

    /// Fetch and rank venue quality
    pub async fn venue_quality(&self, symbol: Symbol) -> AnalyticsResult<Vec<VenueQualityScore>> {
        let outcome = self.fetch_books(symbol).await?;
        Ok(score_venues(&self.config.quality, &outcome.books))
    }

    /// Fetch and measure liquidity concentration
    pub async fn concentration(&self, symbol: Symbol) -> AnalyticsResult<LiquidityDistribution> {
        let outcome = self.fetch_books(symbol).await?;
        Ok(measure_concentration(&outcome.books))
    }
}
