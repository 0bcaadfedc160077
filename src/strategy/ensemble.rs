//! Strategy ensemble aggregator
//!
//! Runs all five strategies, applies adaptive and regime weights, gates on
//! majority agreement, penalizes disagreement, and rejects low-confidence
//! output. A failing strategy is replaced by a neutral signal; it never
//! aborts the cycle.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::breakout::BreakoutStrategy;
use super::ema_cross::EmaCrossStrategy;
use super::order_flow::OrderFlowStrategy;
use super::performance::StrategyPerformance;
use super::rsi_reversal::RsiReversalStrategy;
use super::types::{Direction, Signal, Strategy, StrategyContext, StrategyKind};
use super::vwap_reversion::VwapReversionStrategy;
use crate::indicators::MarketRegime;

/// Confidence assigned when the majority gate fails
const NO_CONSENSUS_CONFIDENCE: Decimal = dec!(20);
/// Multiplier applied when long and short camps both have votes
const DISAGREEMENT_PENALTY: Decimal = dec!(0.7);

/// Ensemble configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Final signals below this confidence are rejected
    pub min_confidence: Decimal,
    /// Strategies that must agree on a non-neutral direction
    pub min_agreeing: usize,
    /// Whether the majority gate is enforced at all
    pub require_majority: bool,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            min_confidence: dec!(40),
            // strict majority of five
            min_agreeing: 3,
            require_majority: true,
        }
    }
}

/// One strategy's contribution to a cycle
#[derive(Debug, Clone)]
pub struct StrategyVote {
    pub kind: StrategyKind,
    pub signal: Signal,
    /// Adaptive weight x regime multiplier
    pub weight: Decimal,
}

/// Aggregated result plus the individual votes for audit
#[derive(Debug, Clone)]
pub struct EnsembleOutcome {
    pub signal: Signal,
    pub votes: Vec<StrategyVote>,
}

/// The five-strategy ensemble
pub struct Ensemble {
    strategies: Vec<Box<dyn Strategy>>,
    config: EnsembleConfig,
}

impl Ensemble {
    /// Ensemble with the standard five strategies
    pub fn new(config: EnsembleConfig) -> Self {
        Self::with_strategies(
            vec![
                Box::new(EmaCrossStrategy),
                Box::new(RsiReversalStrategy),
                Box::new(BreakoutStrategy),
                Box::new(VwapReversionStrategy),
                Box::new(OrderFlowStrategy),
            ],
            config,
        )
    }

    /// Ensemble over an explicit strategy set (used by tests)
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>, config: EnsembleConfig) -> Self {
        Self { strategies, config }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Run every strategy and combine their votes into one signal
    pub fn analyze(
        &self,
        ctx: &StrategyContext<'_>,
        performance: &StrategyPerformance,
    ) -> EnsembleOutcome {
        let votes: Vec<StrategyVote> = self
            .strategies
            .iter()
            .map(|strategy| {
                let kind = strategy.kind();
                let signal = strategy.evaluate(ctx).unwrap_or_else(|e| {
                    tracing::warn!(strategy = %kind, error = %e, "strategy failed, substituting neutral");
                    Signal::neutral("strategy error", ctx.snapshot.clone())
                });
                let weight =
                    performance.weight(kind) * regime_multiplier(ctx.regime.regime, kind);
                StrategyVote {
                    kind,
                    signal,
                    weight,
                }
            })
            .collect();

        let signal = self.combine(ctx, &votes);
        EnsembleOutcome { signal, votes }
    }

    fn combine(&self, ctx: &StrategyContext<'_>, votes: &[StrategyVote]) -> Signal {
        let long: Vec<&StrategyVote> = votes
            .iter()
            .filter(|v| v.signal.direction == Direction::Long)
            .collect();
        let short: Vec<&StrategyVote> = votes
            .iter()
            .filter(|v| v.signal.direction == Direction::Short)
            .collect();

        if long.is_empty() && short.is_empty() {
            return Signal::neutral("all strategies neutral", ctx.snapshot.clone());
        }

        let agreeing = long.len().max(short.len());
        if self.config.require_majority && agreeing < self.config.min_agreeing {
            return Signal::new(
                Direction::Neutral,
                NO_CONSENSUS_CONFIDENCE,
                vec![format!(
                    "no consensus: {} of {} strategies agree, need {}",
                    agreeing,
                    votes.len(),
                    self.config.min_agreeing
                )],
                ctx.snapshot.clone(),
            );
        }

        let long_score = weighted_confidence(&long);
        let short_score = weighted_confidence(&short);

        let (direction, mut confidence, camp) = if long_score >= short_score {
            (Direction::Long, long_score, &long)
        } else {
            (Direction::Short, short_score, &short)
        };

        let mut reasons: Vec<String> = camp
            .iter()
            .flat_map(|v| {
                v.signal
                    .reasons
                    .first()
                    .map(|r| format!("{}: {}", v.kind, r))
            })
            .collect();

        if !long.is_empty() && !short.is_empty() {
            confidence *= DISAGREEMENT_PENALTY;
            reasons.push("directional disagreement penalty".to_string());
        }

        if confidence < self.config.min_confidence {
            return Signal::new(
                Direction::Neutral,
                confidence,
                vec![format!(
                    "combined confidence {:.1} below minimum {}",
                    confidence, self.config.min_confidence
                )],
                ctx.snapshot.clone(),
            );
        }

        Signal::new(direction, confidence, reasons, ctx.snapshot.clone())
    }
}

/// Weight-averaged confidence of a camp of votes
fn weighted_confidence(camp: &[&StrategyVote]) -> Decimal {
    let total_weight: Decimal = camp.iter().map(|v| v.weight).sum();
    if total_weight.is_zero() {
        return Decimal::ZERO;
    }
    let weighted: Decimal = camp.iter().map(|v| v.signal.confidence * v.weight).sum();
    weighted / total_weight
}

/// Fixed regime multiplier table per strategy
fn regime_multiplier(regime: MarketRegime, kind: StrategyKind) -> Decimal {
    use MarketRegime::*;
    use StrategyKind::*;

    match (regime, kind) {
        (TrendingUp | TrendingDown, EmaCross) => dec!(1.3),
        (TrendingUp | TrendingDown, Breakout) => dec!(1.2),
        (TrendingUp | TrendingDown, OrderFlow) => dec!(1.1),
        (TrendingUp | TrendingDown, RsiReversal | VwapReversion) => dec!(0.7),

        (Ranging, RsiReversal | VwapReversion) => dec!(1.3),
        (Ranging, EmaCross) => dec!(0.8),
        (Ranging, Breakout | OrderFlow) => dec!(1.0),

        (Volatile, Breakout | OrderFlow) => dec!(1.2),
        (Volatile, EmaCross) => dec!(0.9),
        (Volatile, RsiReversal | VwapReversion) => dec!(0.8),

        (Choppy, RsiReversal | VwapReversion) => dec!(1.0),
        (Choppy, _) => dec!(0.8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testutil::{context, golden_cross_candles, ContextParts};

    struct FixedStrategy {
        kind: StrategyKind,
        direction: Direction,
        confidence: Decimal,
    }

    impl Strategy for FixedStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        fn evaluate(&self, ctx: &StrategyContext<'_>) -> anyhow::Result<Signal> {
            Ok(Signal::new(
                self.direction,
                self.confidence,
                vec!["fixed".to_string()],
                ctx.snapshot.clone(),
            ))
        }
    }

    struct FailingStrategy;

    impl Strategy for FailingStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::Breakout
        }

        fn evaluate(&self, _ctx: &StrategyContext<'_>) -> anyhow::Result<Signal> {
            anyhow::bail!("synthetic failure")
        }
    }

    fn fixed(kind: StrategyKind, direction: Direction, confidence: Decimal) -> Box<dyn Strategy> {
        Box::new(FixedStrategy {
            kind,
            direction,
            confidence,
        })
    }

    fn run(strategies: Vec<Box<dyn Strategy>>, config: EnsembleConfig) -> EnsembleOutcome {
        let candles = golden_cross_candles(60);
        let parts = ContextParts::from_candles(&candles);
        let ctx = context(&candles, &parts);
        let ensemble = Ensemble::with_strategies(strategies, config);
        ensemble.analyze(&ctx, &StrategyPerformance::new())
    }

    #[test]
    fn test_majority_agreement_passes() {
        let outcome = run(
            vec![
                fixed(StrategyKind::EmaCross, Direction::Long, dec!(70)),
                fixed(StrategyKind::Breakout, Direction::Long, dec!(60)),
                fixed(StrategyKind::OrderFlow, Direction::Long, dec!(50)),
                fixed(StrategyKind::RsiReversal, Direction::Neutral, dec!(0)),
                fixed(StrategyKind::VwapReversion, Direction::Neutral, dec!(0)),
            ],
            EnsembleConfig::default(),
        );

        assert_eq!(outcome.signal.direction, Direction::Long);
        // weighted average of the three long votes (50..70)
        assert!(outcome.signal.confidence > dec!(50));
        assert!(outcome.signal.confidence < dec!(70));
    }

    #[test]
    fn test_no_consensus_forces_low_confidence() {
        let outcome = run(
            vec![
                fixed(StrategyKind::EmaCross, Direction::Long, dec!(90)),
                fixed(StrategyKind::Breakout, Direction::Neutral, dec!(0)),
                fixed(StrategyKind::OrderFlow, Direction::Neutral, dec!(0)),
                fixed(StrategyKind::RsiReversal, Direction::Neutral, dec!(0)),
                fixed(StrategyKind::VwapReversion, Direction::Neutral, dec!(0)),
            ],
            EnsembleConfig::default(),
        );

        assert_eq!(outcome.signal.direction, Direction::Neutral);
        assert_eq!(outcome.signal.confidence, NO_CONSENSUS_CONFIDENCE);
        assert!(outcome.signal.reasons[0].contains("no consensus"));
    }

    #[test]
    fn test_disagreement_penalty_applied() {
        let outcome = run(
            vec![
                fixed(StrategyKind::EmaCross, Direction::Long, dec!(80)),
                fixed(StrategyKind::Breakout, Direction::Long, dec!(80)),
                fixed(StrategyKind::OrderFlow, Direction::Long, dec!(80)),
                fixed(StrategyKind::RsiReversal, Direction::Short, dec!(40)),
                fixed(StrategyKind::VwapReversion, Direction::Neutral, dec!(0)),
            ],
            EnsembleConfig::default(),
        );

        assert_eq!(outcome.signal.direction, Direction::Long);
        // 80 weighted-average, x0.7 disagreement penalty = 56
        assert_eq!(outcome.signal.confidence, dec!(56));
        assert!(outcome
            .signal
            .reasons
            .iter()
            .any(|r| r.contains("disagreement")));
    }

    #[test]
    fn test_below_minimum_rejected() {
        let outcome = run(
            vec![
                fixed(StrategyKind::EmaCross, Direction::Long, dec!(30)),
                fixed(StrategyKind::Breakout, Direction::Long, dec!(30)),
                fixed(StrategyKind::OrderFlow, Direction::Long, dec!(30)),
                fixed(StrategyKind::RsiReversal, Direction::Neutral, dec!(0)),
                fixed(StrategyKind::VwapReversion, Direction::Neutral, dec!(0)),
            ],
            EnsembleConfig::default(),
        );

        assert_eq!(outcome.signal.direction, Direction::Neutral);
        assert!(outcome.signal.reasons[0].contains("below minimum"));
    }

    #[test]
    fn test_failing_strategy_substituted_not_fatal() {
        let outcome = run(
            vec![
                fixed(StrategyKind::EmaCross, Direction::Long, dec!(70)),
                fixed(StrategyKind::OrderFlow, Direction::Long, dec!(70)),
                Box::new(FailingStrategy),
                fixed(StrategyKind::RsiReversal, Direction::Long, dec!(70)),
                fixed(StrategyKind::VwapReversion, Direction::Neutral, dec!(0)),
            ],
            EnsembleConfig::default(),
        );

        // The failure became a neutral vote; three longs still carry it
        assert_eq!(outcome.signal.direction, Direction::Long);
        assert_eq!(outcome.votes.len(), 5);
    }

    #[test]
    fn test_all_neutral() {
        let outcome = run(
            vec![
                fixed(StrategyKind::EmaCross, Direction::Neutral, dec!(0)),
                fixed(StrategyKind::Breakout, Direction::Neutral, dec!(0)),
            ],
            EnsembleConfig::default(),
        );
        assert_eq!(outcome.signal.direction, Direction::Neutral);
        assert_eq!(outcome.signal.confidence, Decimal::ZERO);
    }

    #[test]
    fn test_threshold_two_of_five() {
        let config = EnsembleConfig {
            min_agreeing: 2,
            ..Default::default()
        };
        let outcome = run(
            vec![
                fixed(StrategyKind::EmaCross, Direction::Long, dec!(65)),
                fixed(StrategyKind::Breakout, Direction::Long, dec!(55)),
                fixed(StrategyKind::OrderFlow, Direction::Neutral, dec!(0)),
                fixed(StrategyKind::RsiReversal, Direction::Neutral, dec!(0)),
                fixed(StrategyKind::VwapReversion, Direction::Neutral, dec!(0)),
            ],
            config,
        );

        assert_eq!(outcome.signal.direction, Direction::Long);
        assert!(!outcome.signal.reasons[0].contains("no consensus"));
    }

    #[test]
    fn test_confidence_always_clamped() {
        let outcome = run(
            vec![
                fixed(StrategyKind::EmaCross, Direction::Long, dec!(100)),
                fixed(StrategyKind::Breakout, Direction::Long, dec!(100)),
                fixed(StrategyKind::OrderFlow, Direction::Long, dec!(100)),
            ],
            EnsembleConfig::default(),
        );
        assert!(outcome.signal.confidence <= dec!(100));
        assert!(outcome.signal.confidence >= Decimal::ZERO);
    }
}
