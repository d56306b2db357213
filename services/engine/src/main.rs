//! Microflow engine demo binary
//!
//! Drives the full analytics surface from a synthetic random-walk
//! market-data gateway: ingests snapshots for a pair of venues, then
//! prints imbalance, liquidity, detections, routing and the pulse
//! signal as they come alive.

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use engine::{EngineConfig, MicrostructureEngine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use services_common::{AnalyticsResult, Px, Qty, Symbol, Side, Ts};
use snapshots::{MarketDataGateway, MemoryStore, RawOrderBook};
use std::sync::Arc;
use std::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "microflow-engine", about = "Market microstructure analytics demo")]
struct Args {
    /// Snapshots to ingest per venue
    #[arg(long, default_value_t = 120)]
    ticks: usize,

    /// Milliseconds between ingests
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Book depth per side
    #[arg(long, default_value_t = 25)]
    depth: usize,

    /// RNG seed for the synthetic feed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Synthetic venue: a seeded random walk with venue-specific skew
struct SyntheticGateway {
    name: String,
    skew_ticks: i64,
    state: Mutex<WalkState>,
}

struct WalkState {
    rng: StdRng,
    mid_ticks: i64,
    sequence: u64,
}

impl SyntheticGateway {
    fn new(name: &str, skew_ticks: i64, seed: u64) -> Self {
        Self {
            name: name.to_string(),
            skew_ticks,
            state: Mutex::new(WalkState {
                rng: StdRng::seed_from_u64(seed),
                mid_ticks: Px::from_units(30_000).as_i64(),
                sequence: 0,
            }),
        }
    }
}

#[async_trait]
impl MarketDataGateway for SyntheticGateway {
    fn venue(&self) -> &str {
        &self.name
    }

    async fn fetch_order_book(
        &self,
        _symbol: Symbol,
        depth_limit: usize,
    ) -> AnalyticsResult<RawOrderBook> {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let step: i64 = state.rng.gen_range(-30_000..=30_000);
        state.mid_ticks += step;
        state.sequence += 1;

        let mid = state.mid_ticks + self.skew_ticks;
        let half_spread = state.rng.gen_range(5_000..=20_000);
        let tick = Px::from_units(1).as_i64();

        let mut bids = Vec::with_capacity(depth_limit);
        let mut asks = Vec::with_capacity(depth_limit);
        for i in 0..depth_limit as i64 {
            let base: i64 = state.rng.gen_range(5..=40);
            let wall = if state.rng.gen_bool(0.02) { 25 } else { 1 };
            bids.push((
                Px::from_i64(mid - half_spread - i * tick),
                Qty::from_units(base * wall),
            ));
            let base: i64 = state.rng.gen_range(5..=40);
            asks.push((
                Px::from_i64(mid + half_spread + i * tick),
                Qty::from_units(base),
            ));
        }

        Ok(RawOrderBook {
            bids,
            asks,
            sequence: state.sequence,
            ts: Ts::now(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let symbol = Symbol::new(1);

    let engine = MicrostructureEngine::new(
        Arc::new(MemoryStore::new()),
        vec![
            Arc::new(SyntheticGateway::new("binance", 0, args.seed)),
            Arc::new(SyntheticGateway::new("kraken", 2_500, args.seed.wrapping_add(1))),
        ],
        EngineConfig::default(),
    );

    info!(ticks = args.ticks, depth = args.depth, "ingesting synthetic snapshots");
    for tick in 0..args.ticks {
        for venue in ["binance", "kraken"] {
            if let Err(err) = engine.ingest(venue, symbol, args.depth).await {
                warn!(venue, %err, "ingest failed");
            }
        }
        if tick % 20 == 19 {
            report(&engine, symbol).await;
        }
        sleep(Duration::from_millis(args.interval_ms)).await;
    }

    info!("final multi-venue view");
    match engine.route(symbol, &[], Side::Buy, Qty::from_units(100)).await {
        Ok(plan) => info!(
            venues = plan.allocations.len(),
            avg_price = %plan.avg_price,
            fees = plan.total_fees,
            savings = ?plan.savings_vs_single,
            "smart route"
        ),
        Err(err) => warn!(%err, "routing unavailable"),
    }
    match engine.arbitrage(symbol, &[]).await {
        Ok(opps) if opps.is_empty() => info!("no arbitrage above the profit floor"),
        Ok(opps) => {
            for opp in opps {
                info!(
                    buy = %opp.buy_venue,
                    sell = %opp.sell_venue,
                    net_pct = opp.net_profit_pct,
                    ?opp.execution_risk,
                    "arbitrage opportunity"
                );
            }
        }
        Err(err) => warn!(%err, "arbitrage scan unavailable"),
    }
    if let Ok(dist) = engine.concentration(symbol, &[]).await {
        info!(hhi = dist.hhi, effective_venues = dist.effective_venues, "concentration");
    }

    footprint_demo(&engine, symbol, args.seed)?;

    Ok(())
}

/// Synthetic trade tape through the footprint branch
fn footprint_demo(engine: &MicrostructureEngine, symbol: Symbol, seed: u64) -> Result<()> {
    use footprint::TradePrint;

    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(7));
    let base_secs = Ts::now().as_nanos() / 1_000_000_000;
    let mut price = 30_000.0;
    let trades: Vec<TradePrint> = (0..600u64)
        .map(|i| {
            price += rng.gen_range(-4.0..4.0);
            TradePrint {
                symbol,
                ts: Ts::from_secs(base_secs + i),
                price: Px::new(price),
                size: Qty::from_units(rng.gen_range(1..20)),
                is_buy: rng.gen_bool(0.5),
            }
        })
        .collect();

    let bars = engine.footprint_bars(&trades)?;
    let profile = engine.session_profile(&trades)?;
    info!(
        bars = bars.len(),
        poc = %profile.poc,
        vah = %profile.vah,
        val = %profile.val,
        "footprint session"
    );
    let absorption = engine.absorption(&bars);
    let climax = engine.climax(&bars);
    info!(absorption = absorption.len(), climax = climax.len(), "footprint patterns");
    Ok(())
}

async fn report(engine: &MicrostructureEngine, symbol: Symbol) {
    for venue in ["binance", "kraken"] {
        match engine.imbalance(venue, symbol).await {
            Ok(imbalance) => info!(
                venue,
                imbalance_10 = imbalance.imbalance_10,
                pressure = imbalance.pressure_score,
                momentum = imbalance.momentum,
                "imbalance"
            ),
            Err(err) => warn!(venue, %err, "imbalance unavailable"),
        }
        if let Ok(liquidity) = engine.liquidity(venue, symbol).await {
            info!(venue, score = liquidity.score, regime = ?liquidity.regime, "liquidity");
        }
        match engine.quality_report(venue, symbol).await {
            Ok(report) => info!(
                venue,
                vpin = report.vpin.vpin,
                toxicity = report.toxicity.toxicity_score,
                quality = report.quality_score,
                recommendation = ?report.recommendation,
                "market quality"
            ),
            Err(err) => info!(venue, %err, "quality verdict still warming up"),
        }
        if let Ok(Some(signal)) = engine.pulse(venue, symbol).await {
            info!(venue, direction = ?signal.direction, strength = signal.strength,
                confidence = signal.confidence, reason = %signal.reason, "pulse");
        }
        if let Ok(detections) = engine.large_orders(venue, symbol).await {
            for hit in detections {
                info!(venue, price = %hit.price, z = hit.z_score,
                    class = ?hit.classification, "large order");
            }
        }
        let zones = engine.active_zones(venue, symbol).await;
        if !zones.is_empty() {
            info!(venue, zones = zones.len(), "active liquidity zones");
        }
    }
}
