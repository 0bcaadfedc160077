//! Technical/arbitrage signal reconciliation
//!
//! Conflict-aware override rules: agreement boosts confidence, a strong
//! arbitrage signal can override a neutral technical read, and a direct
//! directional conflict always skips.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::arbitrage::ArbitrageSignal;
use crate::strategy::{Direction, Signal};

/// Agreement multiplies combined confidence by this
const AGREEMENT_BOOST: Decimal = dec!(1.1);

/// Outcome of combining the two signal sources for one asset
#[derive(Debug, Clone, PartialEq)]
pub enum CombinedAction {
    Execute {
        direction: Direction,
        confidence: Decimal,
        reasons: Vec<String>,
    },
    Skip {
        reason: String,
    },
}

impl CombinedAction {
    pub fn is_execute(&self) -> bool {
        matches!(self, CombinedAction::Execute { .. })
    }
}

/// Reconcile the ensemble signal with the best arbitrage signal
pub fn combine_signals(
    technical: &Signal,
    arbitrage: Option<&ArbitrageSignal>,
) -> CombinedAction {
    let arb = arbitrage.filter(|a| a.is_actionable());

    match arb {
        None => {
            if technical.is_directional() {
                CombinedAction::Execute {
                    direction: technical.direction,
                    confidence: technical.confidence,
                    reasons: technical.reasons.clone(),
                }
            } else {
                CombinedAction::Skip {
                    reason: "no directional signal".to_string(),
                }
            }
        }
        Some(arb) => {
            if !technical.is_directional() {
                // Strong arbitrage may override a neutral technical read
                if arb.is_strong() {
                    let mut reasons = vec![format!(
                        "arbitrage override: edge {:.2} at confidence {:.2}",
                        arb.edge_percentage, arb.confidence
                    )];
                    reasons.extend(technical.reasons.clone());
                    CombinedAction::Execute {
                        direction: arb.direction,
                        // Map the 0-1 arbitrage scale onto 0-100
                        confidence: (arb.confidence * dec!(100)).clamp(Decimal::ZERO, dec!(100)),
                        reasons,
                    }
                } else {
                    CombinedAction::Skip {
                        reason: "technical neutral, arbitrage not strong enough to override"
                            .to_string(),
                    }
                }
            } else if technical.direction == arb.direction {
                let boosted =
                    (technical.confidence * AGREEMENT_BOOST).clamp(Decimal::ZERO, dec!(100));
                let mut reasons = technical.reasons.clone();
                reasons.push("arbitrage agrees, confidence boosted".to_string());
                CombinedAction::Execute {
                    direction: technical.direction,
                    confidence: boosted,
                    reasons,
                }
            } else {
                // Direct directional conflict always skips
                CombinedAction::Skip {
                    reason: format!(
                        "directional conflict: technical {} vs arbitrage {}",
                        technical.direction, arb.direction
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::ArbAction;
    use crate::buffer::{Asset, Timeframe};
    use crate::risk::testutil::bare_snapshot;
    use chrono::{Duration, Utc};

    fn technical(direction: Direction, confidence: Decimal) -> Signal {
        Signal::new(
            direction,
            confidence,
            vec!["test".to_string()],
            bare_snapshot(dec!(100)),
        )
    }

    fn arb(direction: Direction, confidence: Decimal, action: ArbAction) -> ArbitrageSignal {
        ArbitrageSignal {
            asset: Asset::Btc,
            timeframe: Timeframe::Min15,
            window_id: "w1".to_string(),
            direction,
            confidence,
            edge_percentage: dec!(5),
            window_progress: dec!(0.3),
            action,
            token_id: "up".to_string(),
            entry_price: dec!(0.5),
            expires_at: Utc::now() + Duration::seconds(30),
        }
    }

    #[test]
    fn test_technical_only() {
        let action = combine_signals(&technical(Direction::Long, dec!(70)), None);
        match action {
            CombinedAction::Execute {
                direction,
                confidence,
                ..
            } => {
                assert_eq!(direction, Direction::Long);
                assert_eq!(confidence, dec!(70));
            }
            _ => panic!("expected execute"),
        }
    }

    #[test]
    fn test_neutral_without_arb_skips() {
        let action = combine_signals(&technical(Direction::Neutral, dec!(20)), None);
        assert!(!action.is_execute());
    }

    #[test]
    fn test_agreement_boosts() {
        let arb_signal = arb(Direction::Long, dec!(0.7), ArbAction::Buy);
        let action = combine_signals(&technical(Direction::Long, dec!(70)), Some(&arb_signal));
        match action {
            CombinedAction::Execute { confidence, .. } => {
                assert_eq!(confidence, dec!(77)); // 70 * 1.1
            }
            _ => panic!("expected execute"),
        }
    }

    #[test]
    fn test_boost_clamped_at_100() {
        let arb_signal = arb(Direction::Long, dec!(0.7), ArbAction::Buy);
        let action = combine_signals(&technical(Direction::Long, dec!(98)), Some(&arb_signal));
        match action {
            CombinedAction::Execute { confidence, .. } => assert_eq!(confidence, dec!(100)),
            _ => panic!("expected execute"),
        }
    }

    #[test]
    fn test_strong_arb_overrides_neutral() {
        let arb_signal = arb(Direction::Short, dec!(0.8), ArbAction::Sell);
        let action = combine_signals(&technical(Direction::Neutral, dec!(20)), Some(&arb_signal));
        match action {
            CombinedAction::Execute {
                direction,
                confidence,
                ..
            } => {
                assert_eq!(direction, Direction::Short);
                assert_eq!(confidence, dec!(80));
            }
            _ => panic!("expected execute"),
        }
    }

    #[test]
    fn test_weak_arb_does_not_override_neutral() {
        let arb_signal = arb(Direction::Short, dec!(0.6), ArbAction::Sell);
        let action = combine_signals(&technical(Direction::Neutral, dec!(20)), Some(&arb_signal));
        assert!(!action.is_execute());
    }

    #[test]
    fn test_conflict_always_skips() {
        let arb_signal = arb(Direction::Short, dec!(0.99), ArbAction::Sell);
        let action = combine_signals(&technical(Direction::Long, dec!(95)), Some(&arb_signal));
        match action {
            CombinedAction::Skip { reason } => assert!(reason.contains("conflict")),
            _ => panic!("expected skip"),
        }
    }

    #[test]
    fn test_wait_action_not_actionable() {
        let arb_signal = arb(Direction::Long, dec!(0.9), ArbAction::Wait);
        // WAIT is treated as no arbitrage input at all
        let action = combine_signals(&technical(Direction::Long, dec!(70)), Some(&arb_signal));
        match action {
            CombinedAction::Execute { confidence, .. } => assert_eq!(confidence, dec!(70)),
            _ => panic!("expected execute"),
        }
    }
}
