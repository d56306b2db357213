//! Cross-venue arbitrage scanning

use crate::routing::RoutingConfig;
use serde::{Deserialize, Serialize};
use services_common::{Px, Qty, SCALE_4_F64, Symbol, Ts};
use snapshots::BookSnapshot;
use tracing::debug;

/// Risk grade attached to an opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionRisk {
    /// High confidence and meaningful size
    Low,
    /// Workable but thin on confidence or size
    Medium,
    /// Marginal: likely gone before both legs fill
    High,
}

/// Scan parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageConfig {
    /// Minimum net profit (percent of buy notional) to emit
    pub min_profit_pct: f64,
    /// Notional (currency units) at which the size factor saturates
    pub size_reference_notional: f64,
    /// Fee schedule shared with the router
    pub fees: RoutingConfig,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_profit_pct: 0.1,
            size_reference_notional: 10_000.0,
            fees: RoutingConfig::default(),
        }
    }
}

/// A cross-venue mispricing that survives fee netting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    /// Instrument
    pub symbol: Symbol,
    /// Timestamp of the newest contributing snapshot
    pub ts: Ts,
    /// Venue to buy on
    pub buy_venue: String,
    /// Best ask on the buy venue
    pub buy_price: Px,
    /// Venue to sell on
    pub sell_venue: String,
    /// Best bid on the sell venue
    pub sell_price: Px,
    /// Tradeable size: min of both top-of-book sizes
    pub max_size: Qty,
    /// Profit before fees, in currency units
    pub gross_profit: f64,
    /// Profit after both venues' fees, in currency units
    pub net_profit: f64,
    /// Net profit as a percent of buy notional
    pub net_profit_pct: f64,
    /// Blend of margin, spread tightness and size, in [0, 100]
    pub confidence: f64,
    /// Execution-risk grade
    pub execution_risk: ExecutionRisk,
}

/// Compare every ordered venue pair's top of book.
///
/// An opportunity is emitted only when the fee-netted profit percent
/// meets `min_profit_pct`; identical prices never qualify.
#[must_use]
pub fn scan_arbitrage(
    config: &ArbitrageConfig,
    books: &[BookSnapshot],
) -> Vec<ArbitrageOpportunity> {
    let mut opportunities = Vec::new();

    for buy_book in books {
        let (Some(buy_price), Some(buy_top)) =
            (buy_book.best_ask, buy_book.asks.first().map(|l| l.size))
        else {
            continue;
        };
        for sell_book in books {
            if sell_book.venue == buy_book.venue {
                continue;
            }
            let (Some(sell_price), Some(sell_top)) =
                (sell_book.best_bid, sell_book.bids.first().map(|l| l.size))
            else {
                continue;
            };
            if sell_price <= buy_price {
                continue;
            }

            let max_size = buy_top.min(sell_top);
            let buy_notional = buy_price.mul_qty(max_size) as f64 / SCALE_4_F64;
            let sell_notional = sell_price.mul_qty(max_size) as f64 / SCALE_4_F64;
            let gross_profit = sell_notional - buy_notional;
            let fees = buy_notional * config.fees.fee_rate(&buy_book.venue)
                + sell_notional * config.fees.fee_rate(&sell_book.venue);
            let net_profit = gross_profit - fees;
            let net_profit_pct = if buy_notional > 0.0 {
                net_profit / buy_notional * 100.0
            } else {
                0.0
            };

            if net_profit_pct < config.min_profit_pct {
                continue;
            }

            let margin_factor = (net_profit_pct / 1.0).min(1.0);
            let tightness_factor = {
                let buy_spread = buy_book.spread_pct.unwrap_or(1.0);
                let sell_spread = sell_book.spread_pct.unwrap_or(1.0);
                (1.0 - ((buy_spread + sell_spread) / 2.0).min(1.0)).max(0.0)
            };
            let size_factor = (buy_notional / config.size_reference_notional).min(1.0);
            let confidence = 40.0f64.mul_add(
                margin_factor,
                30.0f64.mul_add(tightness_factor, 30.0 * size_factor),
            );

            let execution_risk = if confidence >= 70.0 {
                ExecutionRisk::Low
            } else if confidence >= 40.0 {
                ExecutionRisk::Medium
            } else {
                ExecutionRisk::High
            };

            opportunities.push(ArbitrageOpportunity {
                symbol: buy_book.symbol,
                ts: buy_book.ts.max(sell_book.ts),
                buy_venue: buy_book.venue.clone(),
                buy_price,
                sell_venue: sell_book.venue.clone(),
                sell_price,
                max_size,
                gross_profit,
                net_profit,
                net_profit_pct,
                confidence,
                execution_risk,
            });
        }
    }

    opportunities.sort_by(|a, b| {
        b.net_profit_pct
            .partial_cmp(&a.net_profit_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    debug!(pairs_flagged = opportunities.len(), "arbitrage scan complete");
    opportunities
}
