//! Market-data gateway abstraction
//!
//! One capability per venue adapter: fetch the current order book. The
//! multi-venue aggregator depends only on this trait, never on a
//! concrete venue.

use crate::book::RawOrderBook;
use async_trait::async_trait;
use services_common::{AnalyticsResult, Symbol};

/// Venue adapter for raw order-book acquisition
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Venue this adapter speaks to
    fn venue(&self) -> &str;

    /// Fetch the current raw order book for a symbol, up to
    /// `depth_limit` levels per side.
    ///
    /// Fails with `VenueUnreachable` when the venue cannot be queried.
    async fn fetch_order_book(
        &self,
        symbol: Symbol,
        depth_limit: usize,
    ) -> AnalyticsResult<RawOrderBook>;
}
