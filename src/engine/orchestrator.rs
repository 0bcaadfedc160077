//! Engine orchestrator
//!
//! The single owner of mutable trading state. Runs the fixed-interval
//! trading cycle (data refresh, analysis, arbitrage scan, combination,
//! admission, execution, monitoring) and the read-only metrics loop.
//! Cycles never overlap: a tick that arrives while the previous cycle is
//! still executing is skipped, not queued.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use super::alerts::{Alert, AlertLevel, AlertRing};
use super::combine::{combine_signals, CombinedAction};
use super::events::{EngineEvent, EventBus};
use super::monitor::{evaluate_position, resolve_position, MonitorOutcome};
use super::state::{
    DashboardSnapshot, EngineMetrics, EngineState, EngineStatus, StateSnapshot,
};
use crate::arbitrage::{ArbitrageDetector, ArbitrageSignal};
use crate::buffer::{Asset, MarketDataBuffer, Timeframe};
use crate::config::Config;
use crate::exchange::MarketDataSource;
use crate::indicators::{
    classify_regime, classify_session, detect_patterns, find_levels, IndicatorSnapshot,
};
use crate::persistence::PersistenceSink;
use crate::risk::{
    initial_stop, take_profit_ladder, ExitReason, Position, PositionStatus, RiskManager, Trade,
    TrailingStop,
};
use crate::strategy::{
    Ensemble, Signal, StrategyContext, TradeOutcome,
};
use crate::telemetry::{increment_counter, set_gauge, CounterMetric, GaugeMetric};
use crate::venue::{MarketWindow, OrderSide, VenueClient, WindowQuote};

/// The trading engine
///
/// Construct one per process at the composition root and share it by
/// `Arc`; tests construct independent instances.
pub struct Engine {
    config: Config,
    status: Arc<RwLock<EngineStatus>>,
    state: Arc<RwLock<EngineState>>,
    risk: Arc<Mutex<RiskManager>>,
    detector: Arc<Mutex<ArbitrageDetector>>,
    buffer: Arc<RwLock<MarketDataBuffer>>,
    ensemble: Arc<Ensemble>,
    source: Arc<dyn MarketDataSource>,
    venue: Arc<dyn VenueClient>,
    sink: Arc<dyn PersistenceSink>,
    events: EventBus,
    alerts: Arc<RwLock<AlertRing>>,
    /// Single-slot cycle guard: a held lock means a cycle is in flight
    cycle_guard: Arc<Mutex<()>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Windows seen last scan, used for resolution tracking
    active_windows: Arc<RwLock<Vec<MarketWindow>>>,
}

impl Engine {
    pub fn new(
        config: Config,
        source: Arc<dyn MarketDataSource>,
        venue: Arc<dyn VenueClient>,
        sink: Arc<dyn PersistenceSink>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            ensemble: Arc::new(Ensemble::new(config.ensemble.clone())),
            detector: Arc::new(Mutex::new(ArbitrageDetector::new(config.arbitrage.clone()))),
            risk: Arc::new(Mutex::new(RiskManager::new(
                config.risk.clone(),
                Utc::now(),
                Decimal::ZERO,
            ))),
            config,
            status: Arc::new(RwLock::new(EngineStatus::Stopped)),
            state: Arc::new(RwLock::new(EngineState::new(Decimal::ZERO))),
            buffer: Arc::new(RwLock::new(MarketDataBuffer::with_defaults())),
            source,
            venue,
            sink,
            events: EventBus::new(),
            alerts: Arc::new(RwLock::new(AlertRing::new())),
            cycle_guard: Arc::new(Mutex::new(())),
            shutdown,
            tasks: Mutex::new(vec![]),
            active_windows: Arc::new(RwLock::new(vec![])),
        }
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub async fn status(&self) -> EngineStatus {
        *self.status.read().await
    }

    /// Warm the candle buffer and fetch the starting balance
    ///
    /// Failures here are fatal to `start()`: an engine that cannot see
    /// prices or its own balance must not trade.
    pub async fn initialize(&self) -> anyhow::Result<()> {
        let timeframe = self.config.engine.timeframe;
        for asset in &self.config.engine.assets {
            let candles = self
                .source
                .fetch_candles(*asset, timeframe, self.config.engine.warmup_candles)
                .await?;
            let mut buffer = self.buffer.write().await;
            for candle in candles {
                buffer.append_candle(candle);
            }
            tracing::info!(
                %asset,
                count = buffer.candle_count(*asset, timeframe),
                "warmed candle buffer"
            );
        }

        let balance = self.venue.get_balance().await?;
        {
            let mut state = self.state.write().await;
            state.balance = balance.available;
            state.peak_balance = state.peak_balance.max(balance.available);
        }
        {
            let mut risk = self.risk.lock().await;
            *risk = RiskManager::new(self.config.risk.clone(), Utc::now(), balance.available);
        }

        self.venue.start_heartbeat().await?;
        tracing::info!(balance = %balance.available, "engine initialized");
        Ok(())
    }

    /// Start the engine: initialize, then launch both loops
    pub async fn start(self: &Arc<Self>) -> anyhow::Result<()> {
        {
            let status = *self.status.read().await;
            if status != EngineStatus::Stopped {
                anyhow::bail!("cannot start from {status}");
            }
        }

        if let Err(e) = self.initialize().await {
            *self.status.write().await = EngineStatus::Error;
            self.events.emit(EngineEvent::StateUpdated {
                status: EngineStatus::Error,
            });
            return Err(e.context("engine initialization failed"));
        }

        let _ = self.shutdown.send(false);
        self.set_status(EngineStatus::Running).await;

        let cycle_task = {
            let engine = Arc::clone(self);
            let mut shutdown_rx = self.shutdown.subscribe();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(
                    engine.config.engine.cycle_interval_secs,
                ));
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                        }
                        _ = interval.tick() => {
                            engine.tick().await;
                        }
                    }
                }
            })
        };

        let metrics_task = {
            let engine = Arc::clone(self);
            let mut shutdown_rx = self.shutdown.subscribe();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(
                    engine.config.engine.metrics_interval_secs,
                ));
                loop {
                    tokio::select! {
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                        }
                        _ = interval.tick() => {
                            engine.metrics_tick().await;
                        }
                    }
                }
            })
        };

        let mut tasks = self.tasks.lock().await;
        tasks.push(cycle_task);
        tasks.push(metrics_task);
        tracing::info!("engine started");
        Ok(())
    }

    /// Pause trading: loops keep running, cycles are skipped
    pub async fn pause(&self) -> anyhow::Result<()> {
        let mut status = self.status.write().await;
        if *status != EngineStatus::Running {
            anyhow::bail!("cannot pause from {}", *status);
        }
        *status = EngineStatus::Paused;
        drop(status);
        self.events.emit(EngineEvent::StateUpdated {
            status: EngineStatus::Paused,
        });
        tracing::info!("engine paused");
        Ok(())
    }

    pub async fn resume(&self) -> anyhow::Result<()> {
        let mut status = self.status.write().await;
        if *status != EngineStatus::Paused {
            anyhow::bail!("cannot resume from {}", *status);
        }
        *status = EngineStatus::Running;
        drop(status);
        self.events.emit(EngineEvent::StateUpdated {
            status: EngineStatus::Running,
        });
        tracing::info!("engine resumed");
        Ok(())
    }

    /// Stop deterministically: halt both loops, close every open
    /// position, stop the heartbeat, then transition to Stopped
    pub async fn stop(&self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);

        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        drop(tasks);

        // Wait out any in-flight cycle before touching positions
        let _guard = self.cycle_guard.lock().await;

        let open: Vec<Position> = {
            let state = self.state.read().await;
            state.positions.values().cloned().collect()
        };
        for position in open {
            let mark = {
                let buffer = self.buffer.read().await;
                buffer
                    .latest_price(position.asset)
                    .or_else(|| buffer.latest_close(position.asset, position.timeframe))
                    .unwrap_or(position.entry_price)
            };
            let pnl = position.unrealized_pnl(mark);
            if let Err(e) = self
                .close_position(position.asset, mark, pnl, ExitReason::Shutdown)
                .await
            {
                // The shutdown continues, but every failed close is loud
                self.alert(
                    AlertLevel::Critical,
                    format!("failed to close {} on shutdown: {e:#}", position.asset),
                )
                .await;
            }
        }

        if let Err(e) = self.venue.stop_heartbeat().await {
            tracing::warn!(error = %e, "failed to stop venue heartbeat");
        }

        self.set_status(EngineStatus::Stopped).await;
        tracing::info!("engine stopped");
        Ok(())
    }

    /// One guarded tick of the trading loop
    async fn tick(&self) {
        if *self.status.read().await != EngineStatus::Running {
            return;
        }

        // Single-slot guard: skip the tick rather than queue it
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            tracing::warn!("previous cycle still running, skipping tick");
            increment_counter(CounterMetric::CyclesSkipped);
            return;
        };

        let bound = Duration::from_secs(self.config.engine.cycle_timeout_secs);
        let started = std::time::Instant::now();
        match tokio::time::timeout(bound, self.run_cycle()).await {
            Ok(Ok(())) => {
                increment_counter(CounterMetric::CyclesCompleted);
            }
            Ok(Err(e)) => {
                increment_counter(CounterMetric::CyclesFailed);
                self.alert(AlertLevel::Warning, format!("cycle failed: {e:#}"))
                    .await;
                self.events.emit(EngineEvent::Error {
                    message: format!("{e:#}"),
                });
            }
            Err(_) => {
                increment_counter(CounterMetric::CyclesFailed);
                self.alert(
                    AlertLevel::Warning,
                    format!("cycle exceeded {}s wall-time bound", bound.as_secs()),
                )
                .await;
            }
        }

        let cycle = {
            let mut state = self.state.write().await;
            state.cycle_count += 1;
            state.cycle_count
        };
        self.events.emit(EngineEvent::CycleComplete {
            cycle,
            duration_ms: started.elapsed().as_millis() as u64,
        });
    }

    /// One full trading cycle, in order: data refresh, technical
    /// analysis, arbitrage scan, combination, admission, execution,
    /// position monitoring
    pub async fn run_cycle(&self) -> anyhow::Result<()> {
        let timeframe = self.config.engine.timeframe;

        // UTC-midnight rollover: push the finished day to the sink
        let finished_day = {
            let balance = self.state.read().await.balance;
            let mut risk = self.risk.lock().await;
            risk.roll_daily(Utc::now(), balance)
        };
        if let Some(finished) = finished_day {
            if let Err(e) = self.sink.record_daily_rollup(&finished).await {
                tracing::warn!(error = %e, "failed to persist daily rollup");
            }
            self.alert(
                AlertLevel::Info,
                format!("daily stats reset, prior day pnl {}", finished.realized_pnl),
            )
            .await;
        }

        for asset in self.config.engine.assets.clone() {
            self.refresh_data(asset, timeframe).await;

            let technical = self.analyze(asset, timeframe).await;
            let arb = self.scan_arbitrage(asset, timeframe).await;

            if let Some(technical) = technical {
                self.decide_and_execute(asset, technical, arb).await;
            }
        }

        self.monitor_positions().await;
        Ok(())
    }

    /// Refresh candles and spot prices; failures degrade to stale data
    async fn refresh_data(&self, asset: Asset, timeframe: Timeframe) {
        match self.source.fetch_candles(asset, timeframe, 3).await {
            Ok(candles) => {
                let mut buffer = self.buffer.write().await;
                for candle in candles {
                    let close = candle.close;
                    let open_time = candle.open_time;
                    if buffer.append_candle(candle) {
                        self.events.emit(EngineEvent::Candle {
                            asset,
                            timeframe,
                            close,
                            timestamp: open_time,
                        });
                    }
                }
            }
            Err(e) => {
                self.alert(
                    AlertLevel::Warning,
                    format!("candle refresh failed for {asset}, using stale data: {e}"),
                )
                .await;
            }
        }

        match self.source.fetch_ticker(asset).await {
            Ok(ticker) => {
                let now = Utc::now();
                self.buffer
                    .write()
                    .await
                    .record_price(asset, now, ticker.last_price);
                self.detector
                    .lock()
                    .await
                    .record_price(asset, now, ticker.last_price);
            }
            Err(e) => {
                tracing::warn!(%asset, error = %e, "ticker refresh failed, momentum is stale");
            }
        }
    }

    /// Technical analysis for one asset; `None` when data is insufficient
    async fn analyze(&self, asset: Asset, timeframe: Timeframe) -> Option<Signal> {
        let candles = {
            let buffer = self.buffer.read().await;
            buffer.candles(asset, timeframe, self.config.engine.warmup_candles)
        };
        if candles.len() < self.config.engine.min_candles {
            tracing::debug!(
                %asset,
                have = candles.len(),
                need = self.config.engine.min_candles,
                "insufficient candles, skipping technical analysis"
            );
            return None;
        }

        let snapshot = IndicatorSnapshot::compute(&candles)?;
        let regime = classify_regime(&candles, &snapshot);
        let session = classify_session(Utc::now());
        let patterns = detect_patterns(&candles);
        let levels = find_levels(&candles);

        let ctx = StrategyContext {
            candles: &candles,
            snapshot: &snapshot,
            regime: &regime,
            session,
            patterns: &patterns,
            levels: &levels,
        };

        let performance = {
            let state = self.state.read().await;
            state.performance.clone()
        };
        let outcome = self.ensemble.analyze(&ctx, &performance);

        if outcome.signal.is_directional() {
            increment_counter(CounterMetric::SignalsEmitted);
            self.events.emit(EngineEvent::Signal {
                signal: outcome.signal.clone(),
                asset,
            });
            if let Err(e) = self.sink.record_signal(&outcome.signal).await {
                tracing::warn!(error = %e, "failed to persist signal");
            }
        }
        Some(outcome.signal)
    }

    /// Scan active windows for this asset; returns the best signal
    async fn scan_arbitrage(
        &self,
        asset: Asset,
        timeframe: Timeframe,
    ) -> Option<ArbitrageSignal> {
        let windows = match self.venue.find_active_windows(asset, timeframe).await {
            Ok(windows) => windows,
            Err(e) => {
                self.alert(
                    AlertLevel::Warning,
                    format!("window discovery failed for {asset}: {e}"),
                )
                .await;
                return None;
            }
        };

        {
            let mut active = self.active_windows.write().await;
            active.retain(|w| w.asset != asset);
            active.extend(windows.iter().cloned());
        }

        let now = Utc::now();
        let mut best: Option<ArbitrageSignal> = None;
        for window in &windows {
            let quote = match self.fetch_quote(window).await {
                Ok(quote) => quote,
                Err(e) => {
                    tracing::warn!(window = %window.id, error = %e, "quote fetch failed");
                    continue;
                }
            };

            let signal = {
                let detector = self.detector.lock().await;
                detector.analyze_window(window, &quote, now)
            };
            if let Some(signal) = signal {
                increment_counter(CounterMetric::ArbitrageDetected);
                self.events.emit(EngineEvent::ArbitrageDetected {
                    signal: signal.clone(),
                });
                let better = best
                    .as_ref()
                    .map(|b| signal.confidence > b.confidence)
                    .unwrap_or(true);
                if better {
                    best = Some(signal);
                }
            }
        }
        best
    }

    async fn fetch_quote(&self, window: &MarketWindow) -> anyhow::Result<WindowQuote> {
        let up_price = self.venue.get_price(&window.up_token_id).await?;
        let down_price = self.venue.get_price(&window.down_token_id).await?;
        Ok(WindowQuote {
            up_price,
            down_price,
        })
    }

    /// Combine signals, gate, admit, and execute for one asset
    async fn decide_and_execute(
        &self,
        asset: Asset,
        technical: Signal,
        arb: Option<ArbitrageSignal>,
    ) {
        let (direction, confidence, reasons) = match combine_signals(&technical, arb.as_ref()) {
            CombinedAction::Execute {
                direction,
                confidence,
                reasons,
            } => (direction, confidence, reasons),
            CombinedAction::Skip { reason } => {
                tracing::debug!(%asset, reason, "no trade this cycle");
                return;
            }
        };

        let has_position = {
            let state = self.state.read().await;
            state.positions.contains_key(&asset)
        };
        if has_position {
            tracing::debug!(%asset, "position already open, one per asset");
            return;
        }

        // Pick the window to trade: the arbitrage signal's window, or the
        // nearest active one for this asset
        let window = {
            let active = self.active_windows.read().await;
            match &arb {
                Some(arb) => active.iter().find(|w| w.id == arb.window_id).cloned(),
                None => active
                    .iter()
                    .filter(|w| w.asset == asset && w.is_active(Utc::now()))
                    .min_by_key(|w| w.close_time)
                    .cloned(),
            }
        };
        let Some(window) = window else {
            tracing::debug!(%asset, "no active window to trade");
            return;
        };

        // Five-minute markets get a stricter entry gate
        if window.timeframe == Timeframe::Min5 {
            let gate = &self.config.engine.five_minute_gate;
            let edge = arb.as_ref().map(|a| a.edge_percentage).unwrap_or_default();
            if confidence < gate.min_confidence || edge < gate.min_edge_pct {
                tracing::debug!(
                    %asset,
                    %confidence,
                    %edge,
                    "five-minute gate rejected entry"
                );
                return;
            }
        }

        // Risk admission: all violated reasons are reported together
        let (balance, peak_balance, open_positions) = {
            let state = self.state.read().await;
            (state.balance, state.peak_balance, state.positions.len())
        };
        let decision = {
            let mut risk = self.risk.lock().await;
            risk.can_open_trade(confidence, open_positions, balance, peak_balance, Utc::now())
        };
        if !decision.allowed {
            increment_counter(CounterMetric::RiskRejections);
            let itemized: Vec<String> =
                decision.reasons.iter().map(|r| r.to_string()).collect();
            tracing::info!(%asset, reasons = ?itemized, "risk admission rejected");
            return;
        }

        self.execute(asset, window, direction, confidence, reasons, technical)
            .await;
    }

    /// Size and place the order, then record the position
    async fn execute(
        &self,
        asset: Asset,
        window: MarketWindow,
        direction: crate::strategy::Direction,
        confidence: Decimal,
        reasons: Vec<String>,
        technical: Signal,
    ) {
        let candles = {
            let buffer = self.buffer.read().await;
            buffer.candles(asset, self.config.engine.timeframe, 60)
        };
        let snapshot = match IndicatorSnapshot::compute(&candles) {
            Some(snapshot) => snapshot,
            None => return,
        };
        let regime = classify_regime(&candles, &snapshot);
        let session = classify_session(Utc::now());

        let (balance, peak_balance) = {
            let state = self.state.read().await;
            (state.balance, state.peak_balance)
        };
        let size = {
            let risk = self.risk.lock().await;
            risk.position_size(balance, peak_balance, confidence, regime.volatility, session)
        };

        let token_id = match direction {
            crate::strategy::Direction::Short => window.down_token_id.clone(),
            _ => window.up_token_id.clone(),
        };
        let token_price = match self.venue.get_price(&token_id).await {
            Ok(price) => price,
            Err(e) => {
                self.alert(
                    AlertLevel::Warning,
                    format!("token price unavailable for {asset}: {e}"),
                )
                .await;
                return;
            }
        };

        let receipt = match self
            .venue
            .place_limit_order(&token_id, OrderSide::Buy, token_price, size)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                // Execution failure: no position is recorded, the cycle goes on
                increment_counter(CounterMetric::ExecutionFailures);
                self.alert(
                    AlertLevel::Critical,
                    format!("order rejected for {asset}: {e}"),
                )
                .await;
                return;
            }
        };

        let entry_price = {
            let buffer = self.buffer.read().await;
            buffer
                .latest_price(asset)
                .or_else(|| buffer.latest_close(asset, self.config.engine.timeframe))
                .unwrap_or(window.open_price)
        };

        let stops = &self.config.risk.stops;
        let position = Position {
            id: uuid::Uuid::new_v4(),
            asset,
            timeframe: window.timeframe,
            direction,
            window_id: window.id.clone(),
            token_id,
            entry_price,
            token_price: receipt.price,
            quantity: size,
            remaining_fraction: Decimal::ONE,
            stop_loss: initial_stop(direction, entry_price, snapshot.atr, regime.regime, stops),
            trailing: TrailingStop {
                activated: false,
                distance_pct: stops.trailing_distance_pct,
                best_price: entry_price,
            },
            take_profit_levels: take_profit_ladder(direction, entry_price, stops),
            status: PositionStatus::Open,
            opened_at: Utc::now(),
            entry_signal: technical,
            strategies: reasons
                .iter()
                .filter_map(|r| r.split(':').next())
                .filter_map(|name| match name {
                    "ema_cross" => Some(crate::strategy::StrategyKind::EmaCross),
                    "rsi_reversal" => Some(crate::strategy::StrategyKind::RsiReversal),
                    "breakout" => Some(crate::strategy::StrategyKind::Breakout),
                    "vwap_reversion" => Some(crate::strategy::StrategyKind::VwapReversion),
                    "order_flow" => Some(crate::strategy::StrategyKind::OrderFlow),
                    _ => None,
                })
                .collect(),
        };

        {
            let mut state = self.state.write().await;
            state.balance -= size;
            state.positions.insert(asset, position.clone());
        }
        {
            let mut risk = self.risk.lock().await;
            risk.record_open(Utc::now());
        }

        increment_counter(CounterMetric::TradesOpened);
        tracing::info!(
            %asset,
            direction = %position.direction,
            size = %size,
            entry = %entry_price,
            "position opened"
        );
        self.events.emit(EngineEvent::TradeOpened { position });
    }

    /// Monitor every open position; per-position failures are isolated
    async fn monitor_positions(&self) {
        let now = Utc::now();
        let assets: Vec<Asset> = {
            let state = self.state.read().await;
            state.positions.keys().copied().collect()
        };

        for asset in assets {
            let mark = {
                let buffer = self.buffer.read().await;
                buffer
                    .latest_price(asset)
                    .or_else(|| buffer.latest_close(asset, self.config.engine.timeframe))
            };
            let Some(mark) = mark else {
                tracing::warn!(%asset, "no mark price, skipping position monitor");
                continue;
            };

            // Window resolution first: a resolved window settles the
            // position regardless of stops
            let resolved = {
                let (state, windows) =
                    tokio::join!(self.state.read(), self.active_windows.read());
                state.positions.get(&asset).and_then(|position| {
                    let window = windows.iter().find(|w| w.id == position.window_id);
                    let closed = match window {
                        Some(w) => !w.is_active(now),
                        None => true,
                    };
                    if closed {
                        Some(resolve_position(position, mark))
                    } else {
                        None
                    }
                })
            };

            let outcome = match resolved {
                Some(outcome) => outcome,
                None => {
                    let stops = self.config.risk.stops.clone();
                    let mut state = self.state.write().await;
                    match state.positions.get_mut(&asset) {
                        Some(position) => evaluate_position(position, mark, &stops),
                        None => continue,
                    }
                }
            };

            match outcome {
                MonitorOutcome::Hold => {}
                MonitorOutcome::PartialClose { fraction, pnl } => {
                    let mut state = self.state.write().await;
                    state.apply_pnl(pnl);
                    tracing::info!(%asset, %fraction, %pnl, "partial take-profit");
                }
                MonitorOutcome::Close { reason, pnl } => {
                    if let Err(e) = self.close_position(asset, mark, pnl, reason).await {
                        // One failing close must not abort the others
                        self.alert(
                            AlertLevel::Critical,
                            format!("failed to close {asset}: {e:#}"),
                        )
                        .await;
                    }
                }
            }
        }

        let open = self.state.read().await.positions.len();
        self.events.emit(EngineEvent::PositionsMonitored {
            open,
            timestamp: now,
        });
    }

    /// Close a position: venue exit, bookkeeping, attribution, events
    async fn close_position(
        &self,
        asset: Asset,
        mark: Decimal,
        pnl: Decimal,
        reason: ExitReason,
    ) -> anyhow::Result<()> {
        let position = {
            let mut state = self.state.write().await;
            match state.positions.get_mut(&asset) {
                Some(position) => {
                    position.status = PositionStatus::Closing;
                    position.clone()
                }
                None => return Ok(()),
            }
        };

        // Sell the remaining tokens unless the window already settled them
        if reason != ExitReason::WindowResolved && position.remaining_notional() > Decimal::ZERO {
            let exit_price = self
                .venue
                .get_price(&position.token_id)
                .await
                .unwrap_or(position.token_price);
            self.venue
                .place_limit_order(
                    &position.token_id,
                    OrderSide::Sell,
                    exit_price,
                    position.remaining_notional(),
                )
                .await?;
        }

        let trade = Trade::from_position(&position, mark, pnl, reason, Utc::now());

        {
            let mut state = self.state.write().await;
            state.positions.remove(&asset);
            // Return the stake plus realized P&L
            state.balance += position.quantity;
            state.apply_pnl(pnl);
            state.trades.push(trade.clone());
            for strategy in &position.strategies {
                state.performance.record_trade(TradeOutcome {
                    strategy: *strategy,
                    pnl,
                    closed_at: trade.closed_at,
                });
            }
        }
        {
            let balance = self.state.read().await.balance;
            let mut risk = self.risk.lock().await;
            risk.record_close(pnl, position.quantity, balance, Utc::now());
        }
        if reason == ExitReason::WindowResolved {
            let mut detector = self.detector.lock().await;
            detector.record_outcome(asset, position.timeframe, pnl > Decimal::ZERO);
        }

        increment_counter(CounterMetric::TradesClosed);
        tracing::info!(%asset, %pnl, %reason, "position closed");
        if let Err(e) = self.sink.record_trade(&trade).await {
            tracing::warn!(error = %e, "failed to persist trade");
        }
        self.events.emit(EngineEvent::TradeClosed { trade });
        Ok(())
    }

    /// Read-only metrics tick: gauges and the dashboard snapshot
    async fn metrics_tick(&self) {
        let snapshot = self.dashboard_data().await;

        set_gauge(GaugeMetric::Balance, decimal_to_f64(snapshot.balance));
        set_gauge(GaugeMetric::PeakBalance, decimal_to_f64(snapshot.peak_balance));
        set_gauge(GaugeMetric::DrawdownPct, decimal_to_f64(snapshot.drawdown_pct));
        set_gauge(GaugeMetric::DailyPnl, decimal_to_f64(snapshot.daily_pnl));
        set_gauge(GaugeMetric::OpenPositions, snapshot.open_positions.len() as f64);
        set_gauge(
            GaugeMetric::ActiveWindows,
            self.active_windows.read().await.len() as f64,
        );

        self.events.emit(EngineEvent::DashboardUpdate { snapshot });
    }

    /// Current dashboard snapshot (read-only)
    pub async fn dashboard_data(&self) -> DashboardSnapshot {
        let state = self.state.read().await;
        let daily_pnl = {
            let risk = self.risk.lock().await;
            risk.daily().realized_pnl
        };
        let momentum = {
            let buffer = self.buffer.read().await;
            self.config
                .engine
                .assets
                .iter()
                .map(|asset| {
                    (
                        *asset,
                        buffer.momentum(*asset, self.config.engine.momentum_window_minutes),
                    )
                })
                .collect()
        };
        DashboardSnapshot {
            status: *self.status.read().await,
            balance: state.balance,
            peak_balance: state.peak_balance,
            drawdown_pct: state.drawdown_pct(),
            daily_pnl,
            open_positions: state.positions.values().cloned().collect(),
            momentum,
            recent_alerts: self.alerts.read().await.recent(20),
            cycle_count: state.cycle_count,
            timestamp: Utc::now(),
        }
    }

    /// Aggregate metrics (read-only)
    pub async fn metrics(&self) -> EngineMetrics {
        let state = self.state.read().await;
        EngineMetrics::from_state(&state)
    }

    /// Serialize durable state to JSON for crash recovery
    pub async fn serialize_state(&self) -> anyhow::Result<String> {
        let state = self.state.read().await;
        let risk_state = self.risk.lock().await.export_state();
        let snapshot = StateSnapshot::capture(&state, risk_state);
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Restore durable state from a serialized snapshot
    pub async fn restore_state(&self, json: &str) -> anyhow::Result<()> {
        let snapshot: StateSnapshot = serde_json::from_str(json)?;
        let (engine_state, risk_state) = snapshot.restore();
        {
            let mut state = self.state.write().await;
            *state = engine_state;
        }
        {
            let mut risk = self.risk.lock().await;
            risk.restore_state(risk_state);
        }
        tracing::info!("engine state restored from snapshot");
        Ok(())
    }

    async fn set_status(&self, status: EngineStatus) {
        *self.status.write().await = status;
        self.events.emit(EngineEvent::StateUpdated { status });
    }

    async fn alert(&self, level: AlertLevel, message: String) {
        match level {
            AlertLevel::Critical => tracing::error!("{message}"),
            AlertLevel::Warning => tracing::warn!("{message}"),
            AlertLevel::Info => tracing::info!("{message}"),
        }
        let alert = Alert::new(level, message);
        self.alerts.write().await.push(alert.clone());
        self.events.emit(EngineEvent::Alert { alert });
    }
}

fn decimal_to_f64(value: Decimal) -> f64 {
    f64::try_from(value).unwrap_or(0.0)
}
