//! Prometheus metrics

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Trading cycles completed
    CyclesCompleted,
    /// Trading cycles skipped (previous still running)
    CyclesSkipped,
    /// Trading cycles that failed or timed out
    CyclesFailed,
    /// Combined signals emitted
    SignalsEmitted,
    /// Arbitrage signals detected
    ArbitrageDetected,
    /// Trades opened
    TradesOpened,
    /// Trades closed
    TradesClosed,
    /// Admissions rejected by the risk manager
    RiskRejections,
    /// Venue order failures
    ExecutionFailures,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Current balance
    Balance,
    /// Peak balance
    PeakBalance,
    /// Current drawdown percentage
    DrawdownPct,
    /// Daily realized P&L
    DailyPnl,
    /// Open position count
    OpenPositions,
    /// Active market window count
    ActiveWindows,
}

impl CounterMetric {
    fn name(&self) -> &'static str {
        match self {
            CounterMetric::CyclesCompleted => "polyensemble_cycles_completed_total",
            CounterMetric::CyclesSkipped => "polyensemble_cycles_skipped_total",
            CounterMetric::CyclesFailed => "polyensemble_cycles_failed_total",
            CounterMetric::SignalsEmitted => "polyensemble_signals_emitted_total",
            CounterMetric::ArbitrageDetected => "polyensemble_arbitrage_detected_total",
            CounterMetric::TradesOpened => "polyensemble_trades_opened_total",
            CounterMetric::TradesClosed => "polyensemble_trades_closed_total",
            CounterMetric::RiskRejections => "polyensemble_risk_rejections_total",
            CounterMetric::ExecutionFailures => "polyensemble_execution_failures_total",
        }
    }
}

impl GaugeMetric {
    fn name(&self) -> &'static str {
        match self {
            GaugeMetric::Balance => "polyensemble_balance_usd",
            GaugeMetric::PeakBalance => "polyensemble_peak_balance_usd",
            GaugeMetric::DrawdownPct => "polyensemble_drawdown_pct",
            GaugeMetric::DailyPnl => "polyensemble_daily_pnl_usd",
            GaugeMetric::OpenPositions => "polyensemble_open_positions",
            GaugeMetric::ActiveWindows => "polyensemble_active_windows",
        }
    }
}

/// Increment a counter
pub fn increment_counter(metric: CounterMetric) {
    metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}
