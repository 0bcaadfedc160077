//! Shared position fixtures for risk tests

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::position::{Position, PositionStatus, TrailingStop};
use super::stops::{take_profit_ladder, StopConfig};
use crate::buffer::{Asset, Timeframe};
use crate::indicators::IndicatorSnapshot;
use crate::strategy::{Direction, Signal, StrategyKind};

pub fn bare_snapshot(last_close: Decimal) -> IndicatorSnapshot {
    IndicatorSnapshot {
        timestamp: Utc::now(),
        last_close,
        last_volume: dec!(1),
        ema5: None,
        ema9: None,
        ema20: None,
        ema50: None,
        ema200: None,
        rsi: None,
        macd: None,
        bollinger: None,
        atr: None,
        adx: None,
        stochastic: None,
        vwap: None,
        obv: None,
        order_flow: None,
        volume_avg: None,
    }
}

fn open_position(direction: Direction, entry: Decimal, quantity: Decimal) -> Position {
    let config = StopConfig::default();
    let stop_offset = entry / dec!(100);
    let stop_loss = match direction {
        Direction::Short => entry + stop_offset,
        _ => entry - stop_offset,
    };
    Position {
        id: Uuid::new_v4(),
        asset: Asset::Btc,
        timeframe: Timeframe::Min15,
        direction,
        window_id: "test-window".to_string(),
        token_id: "test-token".to_string(),
        entry_price: entry,
        token_price: dec!(0.5),
        quantity,
        remaining_fraction: Decimal::ONE,
        stop_loss,
        trailing: TrailingStop {
            activated: false,
            distance_pct: config.trailing_distance_pct,
            best_price: entry,
        },
        take_profit_levels: take_profit_ladder(direction, entry, &config),
        status: PositionStatus::Open,
        opened_at: Utc::now(),
        entry_signal: Signal::new(direction, dec!(80), vec![], bare_snapshot(entry)),
        strategies: vec![StrategyKind::EmaCross],
    }
}

pub fn open_long_position(entry: Decimal, quantity: Decimal) -> Position {
    open_position(Direction::Long, entry, quantity)
}

pub fn open_short_position(entry: Decimal, quantity: Decimal) -> Position {
    open_position(Direction::Short, entry, quantity)
}
