//! The microstructure analytics facade

use detection::{
    ClusterConfig, IcebergConfig, IcebergDetection, LargeOrderConfig, LargeOrderDetection,
    LiquidityZone, OrderCluster, SpoofingConfig, SpoofingDetection, ZoneConfig, ZoneTracker,
    detect_clusters, detect_icebergs, detect_large_orders, detect_spoofing,
};
use execution_planner::{
    DepthCurve, DepthCurveConfig, ExecutionPlan, ImpactConfig, ImpactEstimate, StrategyConfig,
    build_depth_curve, estimate_impact, plan_execution,
};
use flow_analytics::{
    ImbalanceConfig, ImbalanceRecord, KyleConfig, KyleLambda, LiquidityConfig, LiquidityScore,
    MarketQualityReport, NoiseReport, ToxicityConfig, ToxicityReport, VpinConfig, VpinMetrics,
    compute_imbalance, compute_kyle_lambda, compute_liquidity, compute_noise, compute_toxicity,
    compute_verdict, compute_vpin,
};
use footprint::{
    FootprintBar, FootprintConfig, PatternConfig, ProfileConfig, SessionProfile, TradePrint,
    build_footprint_bars, build_profile,
};
use pulse::{
    DivergenceSignal, PulseConfig, PulseSignal, detect_divergence, generate_signal,
    validate_signal,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{AnalyticsError, AnalyticsResult, Qty, Side, Symbol, Ts};
use snapshots::{BookSnapshot, MarketDataGateway, SnapshotService, SnapshotStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use venue_aggregator::{
    AggregatedBook, AggregatorConfig, ArbitrageOpportunity, LiquidityDistribution,
    MultiVenueAggregator, RoutingPlan, VenueQualityScore,
};

/// Engine-wide configuration: one knob block per analytics component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Snapshots pulled for windowed computations
    pub lookback: LookbackConfig,
    /// Imbalance/pressure weights
    pub imbalance: ImbalanceConfig,
    /// Liquidity scoring
    pub liquidity: LiquidityConfig,
    /// VPIN bucketing
    pub vpin: VpinConfig,
    /// Toxicity weights
    pub toxicity: ToxicityConfig,
    /// Kyle's Lambda regression
    pub kyle: KyleConfig,
    /// Large-order outlier thresholds
    pub large_orders: LargeOrderConfig,
    /// Iceberg renewal thresholds
    pub iceberg: IcebergConfig,
    /// Spoofing lifecycle thresholds
    pub spoofing: SpoofingConfig,
    /// Order clustering
    pub clusters: ClusterConfig,
    /// Zone persistence
    pub zones: ZoneConfig,
    /// Impact split
    pub impact: ImpactConfig,
    /// Depth-curve sampling
    pub depth_curve: DepthCurveConfig,
    /// Execution-strategy selection
    pub strategy: StrategyConfig,
    /// Multi-venue fan-out, fees, arbitrage, quality
    pub aggregator: AggregatorConfig,
    /// Pulse signal weights and filters
    pub pulse: PulseConfig,
    /// Footprint bar construction
    pub footprint: FootprintConfig,
    /// Session-profile construction
    pub profile: ProfileConfig,
    /// Absorption/climax thresholds
    pub patterns: PatternConfig,
}

/// Window sizes for the rolling computations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookbackConfig {
    /// Snapshots for imbalance momentum folding
    pub imbalance: usize,
    /// Snapshots for liquidity stability history
    pub liquidity: usize,
    /// Snapshots for VPIN bucket formation
    pub vpin: usize,
    /// Snapshots for toxicity/noise/Kyle windows
    pub microstructure: usize,
    /// Snapshots for iceberg/spoofing lifecycle windows
    pub detection: usize,
}

impl Default for LookbackConfig {
    fn default() -> Self {
        Self {
            imbalance: 20,
            liquidity: 30,
            vpin: 500,
            microstructure: 60,
            detection: 60,
        }
    }
}

/// Facade over every analytics engine for one deployment
pub struct MicrostructureEngine {
    store: Arc<dyn SnapshotStore>,
    gateways: FxHashMap<String, Arc<dyn MarketDataGateway>>,
    services: FxHashMap<String, SnapshotService>,
    zone_trackers: Mutex<FxHashMap<(String, Symbol), ZoneTracker>>,
    config: EngineConfig,
}

impl MicrostructureEngine {
    /// Wire the engine from its collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        gateways: Vec<Arc<dyn MarketDataGateway>>,
        config: EngineConfig,
    ) -> Self {
        let services = gateways
            .iter()
            .map(|g| {
                (
                    g.venue().to_string(),
                    SnapshotService::new(Arc::clone(g), Arc::clone(&store)),
                )
            })
            .collect();
        let gateways = gateways
            .into_iter()
            .map(|g| (g.venue().to_string(), g))
            .collect();
        Self {
            store,
            gateways,
            services,
            zone_trackers: Mutex::new(FxHashMap::default()),
            config,
        }
    }

    /// Venues the engine can reach
    #[must_use]
    pub fn venues(&self) -> Vec<String> {
        self.gateways.keys().cloned().collect()
    }

    fn service(&self, venue: &str) -> AnalyticsResult<&SnapshotService> {
        self.services
            .get(venue)
            .ok_or_else(|| AnalyticsError::VenueUnreachable {
                venue: venue.to_string(),
                reason: "no gateway configured".to_string(),
            })
    }

    /// Fetch, normalize, persist and zone-track one snapshot
    pub async fn ingest(
        &self,
        venue: &str,
        symbol: Symbol,
        depth_limit: usize,
    ) -> AnalyticsResult<BookSnapshot> {
        let snapshot = self.service(venue)?.capture(symbol, depth_limit).await?;

        let mut trackers = self.zone_trackers.lock().await;
        trackers
            .entry((venue.to_string(), symbol))
            .or_insert_with(|| ZoneTracker::new(self.config.zones.clone()))
            .observe(&snapshot);
        Ok(snapshot)
    }

    /// Latest persisted snapshot
    pub async fn latest_snapshot(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<BookSnapshot> {
        self.store.latest(venue, symbol).await
    }

    /// Historical snapshots within `[from, to]`, ascending, capped at `limit`
    pub async fn historical(
        &self,
        venue: &str,
        symbol: Symbol,
        from: Ts,
        to: Ts,
        limit: usize,
    ) -> AnalyticsResult<Vec<BookSnapshot>> {
        self.service(venue)?.historical(symbol, from, to, limit).await
    }

    /// Delta between the two most recent persisted snapshots
    pub async fn latest_delta(
        &self,
        venue: &str,
        symbol: Symbol,
    ) -> AnalyticsResult<Option<snapshots::BookDelta>> {
        self.service(venue)?.latest_delta(symbol).await
    }

    /// Imbalance record for the latest snapshot, with momentum folded
    /// over the lookback window
    pub async fn imbalance(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<ImbalanceRecord> {
        let window = self
            .store
            .recent(venue, symbol, self.config.lookback.imbalance)
            .await?;
        let mut prev: Option<ImbalanceRecord> = None;
        for snapshot in &window {
            let record = compute_imbalance(&self.config.imbalance, snapshot, prev.as_ref());
            prev = Some(record);
        }
        prev.ok_or(AnalyticsError::InsufficientData {
            required: 1,
            available: 0,
        })
    }

    /// Liquidity score for the latest snapshot
    pub async fn liquidity(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<LiquidityScore> {
        let window = self
            .store
            .recent(venue, symbol, self.config.lookback.liquidity)
            .await?;
        let latest = window.last().ok_or(AnalyticsError::InsufficientData {
            required: 1,
            available: 0,
        })?;
        Ok(compute_liquidity(&self.config.liquidity, latest, &window))
    }

    /// VPIN over the bucket-formation window
    pub async fn vpin(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<VpinMetrics> {
        let window = self
            .store
            .recent(venue, symbol, self.config.lookback.vpin)
            .await?;
        compute_vpin(&self.config.vpin, &window)
    }

    /// Toxicity over the microstructure window
    pub async fn toxicity(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<ToxicityReport> {
        let window = self
            .store
            .recent(venue, symbol, self.config.lookback.microstructure)
            .await?;
        compute_toxicity(&self.config.toxicity, &window)
    }

    /// Noise/efficiency over the microstructure window
    pub async fn noise(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<NoiseReport> {
        let window = self
            .store
            .recent(venue, symbol, self.config.lookback.microstructure)
            .await?;
        compute_noise(&window)
    }

    /// Kyle's Lambda over the microstructure window
    pub async fn kyle_lambda(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<KyleLambda> {
        let window = self
            .store
            .recent(venue, symbol, self.config.lookback.microstructure)
            .await?;
        compute_kyle_lambda(&self.config.kyle, &window)
    }

    /// Combined quality verdict (VPIN + toxicity + noise + lambda)
    pub async fn quality_report(
        &self,
        venue: &str,
        symbol: Symbol,
    ) -> AnalyticsResult<MarketQualityReport> {
        let vpin = self.vpin(venue, symbol).await?;
        let toxicity = self.toxicity(venue, symbol).await?;
        let noise = self.noise(venue, symbol).await?;
        let kyle = self.kyle_lambda(venue, symbol).await?;
        Ok(compute_verdict(vpin, toxicity, noise, kyle))
    }

    /// Large-order outliers in the latest snapshot
    pub async fn large_orders(
        &self,
        venue: &str,
        symbol: Symbol,
    ) -> AnalyticsResult<Vec<LargeOrderDetection>> {
        let latest = self.store.latest(venue, symbol).await?;
        detect_large_orders(&self.config.large_orders, &latest)
    }

    /// Iceberg renewals over the detection window
    pub async fn icebergs(
        &self,
        venue: &str,
        symbol: Symbol,
    ) -> AnalyticsResult<Vec<IcebergDetection>> {
        let window = self
            .store
            .recent(venue, symbol, self.config.lookback.detection)
            .await?;
        Ok(detect_icebergs(&self.config.iceberg, &window))
    }

    /// Spoofing patterns over the detection window
    pub async fn spoofing(
        &self,
        venue: &str,
        symbol: Symbol,
    ) -> AnalyticsResult<Vec<SpoofingDetection>> {
        let window = self
            .store
            .recent(venue, symbol, self.config.lookback.detection)
            .await?;
        Ok(detect_spoofing(&self.config.spoofing, &window))
    }

    /// Order clusters in the latest snapshot
    pub async fn clusters(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<Vec<OrderCluster>> {
        let latest = self.store.latest(venue, symbol).await?;
        Ok(detect_clusters(&self.config.clusters, &latest))
    }

    /// Active liquidity zones for a (venue, symbol)
    pub async fn active_zones(&self, venue: &str, symbol: Symbol) -> Vec<LiquidityZone> {
        let trackers = self.zone_trackers.lock().await;
        trackers
            .get(&(venue.to_string(), symbol))
            .map(|t| t.active_zones().into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Reconcile zone liveness against `now`; returns deactivations
    pub async fn reconcile_zones(&self, venue: &str, symbol: Symbol, now: Ts) -> usize {
        let mut trackers = self.zone_trackers.lock().await;
        trackers
            .get_mut(&(venue.to_string(), symbol))
            .map_or(0, |t| t.reconcile(now))
    }

    /// Current pulse signal, if it survives validation
    pub async fn pulse(&self, venue: &str, symbol: Symbol) -> AnalyticsResult<Option<PulseSignal>> {
        let imbalance = self.imbalance(venue, symbol).await?;
        let liquidity = self.liquidity(venue, symbol).await?;
        let signal = generate_signal(&self.config.pulse, &imbalance, &liquidity);
        if validate_signal(&self.config.pulse, &signal) {
            Ok(Some(signal))
        } else {
            info!(venue, %symbol, "pulse signal filtered out");
            Ok(None)
        }
    }

    /// Divergence between book pressure and a measured price change
    pub async fn divergence(
        &self,
        venue: &str,
        symbol: Symbol,
        price_change_pct: f64,
    ) -> AnalyticsResult<Option<DivergenceSignal>> {
        let imbalance = self.imbalance(venue, symbol).await?;
        Ok(detect_divergence(&self.config.pulse, &imbalance, price_change_pct))
    }

    /// Impact estimate against the latest snapshot
    pub async fn impact(
        &self,
        venue: &str,
        symbol: Symbol,
        side: Side,
        size: Qty,
    ) -> AnalyticsResult<ImpactEstimate> {
        let latest = self.store.latest(venue, symbol).await?;
        estimate_impact(&self.config.impact, &latest, side, size)
    }

    /// Depth curve against the latest snapshot
    pub async fn depth_curve(
        &self,
        venue: &str,
        symbol: Symbol,
        side: Side,
    ) -> AnalyticsResult<DepthCurve> {
        let latest = self.store.latest(venue, symbol).await?;
        build_depth_curve(&self.config.depth_curve, &latest, side)
    }

    /// Execution plan against the latest snapshot
    pub async fn execution_plan(
        &self,
        venue: &str,
        symbol: Symbol,
        side: Side,
        size: Qty,
    ) -> AnalyticsResult<ExecutionPlan> {
        let latest = self.store.latest(venue, symbol).await?;
        plan_execution(&self.config.strategy, &latest, side, size)
    }

    fn aggregator_for(&self, venues: &[&str]) -> AnalyticsResult<MultiVenueAggregator> {
        let gateways: Vec<Arc<dyn MarketDataGateway>> = self
            .gateways
            .iter()
            .filter(|(name, _)| venues.is_empty() || venues.contains(&name.as_str()))
            .map(|(_, g)| Arc::clone(g))
            .collect();
        if gateways.is_empty() {
            return Err(AnalyticsError::InvalidParameter {
                name: "venues",
                reason: "no configured gateway matches the requested venues".to_string(),
            });
        }
        Ok(MultiVenueAggregator::new(
            gateways,
            self.config.aggregator.clone(),
        ))
    }

    /// Merged cross-venue book; an empty venue list means all venues
    pub async fn aggregate(
        &self,
        symbol: Symbol,
        venues: &[&str],
    ) -> AnalyticsResult<AggregatedBook> {
        self.aggregator_for(venues)?.aggregate(symbol).await
    }

    /// Best-execution routing plan across the requested venues
    pub async fn route(
        &self,
        symbol: Symbol,
        venues: &[&str],
        side: Side,
        size: Qty,
    ) -> AnalyticsResult<RoutingPlan> {
        self.aggregator_for(venues)?.route(symbol, side, size).await
    }

    /// Cross-venue arbitrage scan
    pub async fn arbitrage(
        &self,
        symbol: Symbol,
        venues: &[&str],
    ) -> AnalyticsResult<Vec<ArbitrageOpportunity>> {
        self.aggregator_for(venues)?.arbitrage(symbol).await
    }

    /// Venue quality ranking
    pub async fn venue_quality(
        &self,
        symbol: Symbol,
        venues: &[&str],
    ) -> AnalyticsResult<Vec<VenueQualityScore>> {
        self.aggregator_for(venues)?.venue_quality(symbol).await
    }

    /// Liquidity concentration across venues
    pub async fn concentration(
        &self,
        symbol: Symbol,
        venues: &[&str],
    ) -> AnalyticsResult<LiquidityDistribution> {
        self.aggregator_for(venues)?.concentration(symbol).await
    }

    /// Footprint bars over a window of trade prints.
    ///
    /// Trades come from the caller, not the snapshot store — the
    /// footprint branch consumes executions, not book states.
    pub fn footprint_bars(&self, trades: &[TradePrint]) -> AnalyticsResult<Vec<FootprintBar>> {
        build_footprint_bars(&self.config.footprint, trades)
    }

    /// Session volume profile (POC / value area) over trade prints
    pub fn session_profile(&self, trades: &[TradePrint]) -> AnalyticsResult<SessionProfile> {
        build_profile(&self.config.profile, trades)
    }

    /// Absorption events over pre-built footprint bars
    #[must_use]
    pub fn absorption(&self, bars: &[FootprintBar]) -> Vec<footprint::AbsorptionEvent> {
        footprint::detect_absorption(&self.config.patterns, bars)
    }

    /// Climax events over pre-built footprint bars
    #[must_use]
    pub fn climax(&self, bars: &[FootprintBar]) -> Vec<footprint::ClimaxEvent> {
        footprint::detect_climax(&self.config.patterns, bars)
    }
}
