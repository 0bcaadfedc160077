//! Technical indicator computation
//!
//! Pure functions over ordered candle slices. Every indicator that needs
//! more candles than available returns `None` instead of panicking or
//! producing NaN; downstream consumers treat `None` as "insufficient data".
//!
//! Prices stay in `Decimal`; only standard deviation bridges through f64
//! for the square root.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::buffer::Candle;

/// MACD(12,26,9) output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// Bollinger Bands(20, 2σ) output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bollinger {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    /// Position of the close within the bands: 0 at lower, 1 at upper
    pub percent_b: Decimal,
}

/// ADX(14) with directional indicators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adx {
    pub adx: Decimal,
    pub di_plus: Decimal,
    pub di_minus: Decimal,
}

/// Stochastic(14,3,3) output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stochastic {
    pub k: Decimal,
    pub d: Decimal,
}

/// On-balance volume with its own moving average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obv {
    pub value: Decimal,
    pub ma: Decimal,
}

/// Simple moving average over the last `period` values
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: Decimal = values[values.len() - period..].iter().sum();
    Some(sum / Decimal::from(period))
}

/// Exponential moving average, seeded with the SMA of the first `period` values
pub fn ema(values: &[Decimal], period: usize) -> Option<Decimal> {
    ema_series(values, period).last().copied()
}

/// Full EMA series aligned to the input tail
///
/// The first output corresponds to input index `period - 1`. Empty when the
/// input is shorter than `period`.
fn ema_series(values: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || values.len() < period {
        return vec![];
    }

    let k = Decimal::from(2) / Decimal::from(period + 1);
    let seed: Decimal = values[..period].iter().sum::<Decimal>() / Decimal::from(period);

    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut current = seed;
    out.push(current);
    for value in &values[period..] {
        current = (*value - current) * k + current;
        out.push(current);
    }
    out
}

/// RSI with Wilder smoothing
///
/// Approaches 100 on a monotonically increasing series and returns exactly
/// 50 when every close is equal (no gains, no losses).
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut avg_gain = Decimal::ZERO;
    let mut avg_loss = Decimal::ZERO;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > Decimal::ZERO {
            avg_gain += change;
        } else {
            avg_loss += -change;
        }
    }
    let p = Decimal::from(period);
    avg_gain /= p;
    avg_loss /= p;

    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        let (gain, loss) = if change > Decimal::ZERO {
            (change, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -change)
        };
        avg_gain = (avg_gain * (p - Decimal::ONE) + gain) / p;
        avg_loss = (avg_loss * (p - Decimal::ONE) + loss) / p;
    }

    if avg_gain.is_zero() && avg_loss.is_zero() {
        return Some(dec!(50));
    }
    if avg_loss.is_zero() {
        return Some(dec!(100));
    }

    let rs = avg_gain / avg_loss;
    Some(dec!(100) - dec!(100) / (Decimal::ONE + rs))
}

/// MACD(12,26,9) with the signal line reconstructed by running EMA(9)
/// over the explicit MACD series
pub fn macd(closes: &[Decimal]) -> Option<Macd> {
    const FAST: usize = 12;
    const SLOW: usize = 26;
    const SIGNAL: usize = 9;

    if closes.len() < SLOW + SIGNAL {
        return None;
    }

    let fast_series = ema_series(closes, FAST);
    let slow_series = ema_series(closes, SLOW);

    // Both series are tail-aligned; trim the fast one to the slow one's span
    let offset = fast_series.len() - slow_series.len();
    let macd_line: Vec<Decimal> = slow_series
        .iter()
        .enumerate()
        .map(|(i, slow)| fast_series[i + offset] - slow)
        .collect();

    let signal = ema(&macd_line, SIGNAL)?;
    let macd_value = *macd_line.last()?;

    Some(Macd {
        macd: macd_value,
        signal,
        histogram: macd_value - signal,
    })
}

/// Bollinger Bands over the last `period` closes with `mult` standard deviations
pub fn bollinger(closes: &[Decimal], period: usize, mult: Decimal) -> Option<Bollinger> {
    let middle = sma(closes, period)?;
    let window = &closes[closes.len() - period..];

    // Standard deviation through f64; Decimal has no sqrt
    let mean: f64 = f64::try_from(middle).ok()?;
    let variance = window
        .iter()
        .filter_map(|v| f64::try_from(*v).ok())
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / period as f64;
    let std_dev = Decimal::try_from(variance.sqrt()).ok()?;

    let upper = middle + std_dev * mult;
    let lower = middle - std_dev * mult;
    let close = *closes.last()?;
    let width = upper - lower;
    let percent_b = if width.is_zero() {
        dec!(0.5)
    } else {
        (close - lower) / width
    };

    Some(Bollinger {
        upper,
        middle,
        lower,
        percent_b,
    })
}

/// True range of one bar given the previous close
fn true_range(candle: &Candle, prev_close: Decimal) -> Decimal {
    let hl = candle.high - candle.low;
    let hc = (candle.high - prev_close).abs();
    let lc = (candle.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// ATR with Wilder smoothing
pub fn atr(candles: &[Candle], period: usize) -> Option<Decimal> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let p = Decimal::from(period);
    let mut value: Decimal = (1..=period)
        .map(|i| true_range(&candles[i], candles[i - 1].close))
        .sum::<Decimal>()
        / p;

    for i in (period + 1)..candles.len() {
        let tr = true_range(&candles[i], candles[i - 1].close);
        value = (value * (p - Decimal::ONE) + tr) / p;
    }

    Some(value)
}

/// ADX(period) with DI+/DI-, Wilder smoothing throughout
pub fn adx(candles: &[Candle], period: usize) -> Option<Adx> {
    if period == 0 || candles.len() < 2 * period + 1 {
        return None;
    }

    let p = Decimal::from(period);
    let mut smoothed_tr = Decimal::ZERO;
    let mut smoothed_plus = Decimal::ZERO;
    let mut smoothed_minus = Decimal::ZERO;
    let mut dx_values: Vec<Decimal> = Vec::new();

    for i in 1..candles.len() {
        let up_move = candles[i].high - candles[i - 1].high;
        let down_move = candles[i - 1].low - candles[i].low;
        let plus_dm = if up_move > down_move && up_move > Decimal::ZERO {
            up_move
        } else {
            Decimal::ZERO
        };
        let minus_dm = if down_move > up_move && down_move > Decimal::ZERO {
            down_move
        } else {
            Decimal::ZERO
        };
        let tr = true_range(&candles[i], candles[i - 1].close);

        if i <= period {
            smoothed_tr += tr;
            smoothed_plus += plus_dm;
            smoothed_minus += minus_dm;
            if i < period {
                continue;
            }
        } else {
            smoothed_tr = smoothed_tr - smoothed_tr / p + tr;
            smoothed_plus = smoothed_plus - smoothed_plus / p + plus_dm;
            smoothed_minus = smoothed_minus - smoothed_minus / p + minus_dm;
        }

        if smoothed_tr.is_zero() {
            dx_values.push(Decimal::ZERO);
            continue;
        }
        let di_plus = dec!(100) * smoothed_plus / smoothed_tr;
        let di_minus = dec!(100) * smoothed_minus / smoothed_tr;
        let di_sum = di_plus + di_minus;
        let dx = if di_sum.is_zero() {
            Decimal::ZERO
        } else {
            dec!(100) * (di_plus - di_minus).abs() / di_sum
        };
        dx_values.push(dx);
    }

    if dx_values.len() < period {
        return None;
    }

    let mut adx_value: Decimal =
        dx_values[..period].iter().sum::<Decimal>() / p;
    for dx in &dx_values[period..] {
        adx_value = (adx_value * (p - Decimal::ONE) + *dx) / p;
    }

    // Recompute final DI from the last smoothed values
    let (di_plus, di_minus) = if smoothed_tr.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            dec!(100) * smoothed_plus / smoothed_tr,
            dec!(100) * smoothed_minus / smoothed_tr,
        )
    };

    Some(Adx {
        adx: adx_value,
        di_plus,
        di_minus,
    })
}

/// Stochastic oscillator: raw %K over `k_period`, smoothed by `k_smooth`,
/// with %D as an SMA(`d_smooth`) of the smoothed %K
pub fn stochastic(
    candles: &[Candle],
    k_period: usize,
    k_smooth: usize,
    d_smooth: usize,
) -> Option<Stochastic> {
    if k_period == 0 || candles.len() < k_period + k_smooth + d_smooth - 2 {
        return None;
    }

    let raw_k: Vec<Decimal> = (k_period - 1..candles.len())
        .map(|i| {
            let window = &candles[i + 1 - k_period..=i];
            let highest = window.iter().map(|c| c.high).max()?;
            let lowest = window.iter().map(|c| c.low).min()?;
            let span = highest - lowest;
            if span.is_zero() {
                Some(dec!(50))
            } else {
                Some(dec!(100) * (candles[i].close - lowest) / span)
            }
        })
        .collect::<Option<Vec<_>>>()?;

    let smoothed_k: Vec<Decimal> = (k_smooth - 1..raw_k.len())
        .filter_map(|i| sma(&raw_k[..=i], k_smooth))
        .collect();

    let k = *smoothed_k.last()?;
    let d = sma(&smoothed_k, d_smooth)?;

    Some(Stochastic { k, d })
}

/// Volume-weighted average price over the slice (typical price weighting)
pub fn vwap(candles: &[Candle]) -> Option<Decimal> {
    if candles.is_empty() {
        return None;
    }
    let total_volume: Decimal = candles.iter().map(|c| c.volume).sum();
    if total_volume.is_zero() {
        return None;
    }
    let weighted: Decimal = candles
        .iter()
        .map(|c| c.typical_price() * c.volume)
        .sum();
    Some(weighted / total_volume)
}

/// On-balance volume with a moving average over the OBV series
pub fn obv(candles: &[Candle], ma_period: usize) -> Option<Obv> {
    if candles.len() < ma_period + 1 {
        return None;
    }

    let mut series = Vec::with_capacity(candles.len());
    let mut running = Decimal::ZERO;
    series.push(running);
    for i in 1..candles.len() {
        if candles[i].close > candles[i - 1].close {
            running += candles[i].volume;
        } else if candles[i].close < candles[i - 1].close {
            running -= candles[i].volume;
        }
        series.push(running);
    }

    let ma = sma(&series, ma_period)?;
    Some(Obv { value: running, ma })
}

/// Estimated order-flow imbalance in [-1, 1]
///
/// Proxy from close position within each bar's range, volume weighted.
/// Positive values indicate buy pressure. This is not order book data.
pub fn order_flow_imbalance(candles: &[Candle], lookback: usize) -> Option<Decimal> {
    if candles.is_empty() || lookback == 0 {
        return None;
    }
    let start = candles.len().saturating_sub(lookback);
    let window = &candles[start..];

    let mut weighted = Decimal::ZERO;
    let mut total_volume = Decimal::ZERO;
    for candle in window {
        let range = candle.range();
        if range.is_zero() {
            continue;
        }
        // close position within range mapped to [-1, 1]
        let position = (candle.close - candle.low) / range * dec!(2) - Decimal::ONE;
        weighted += position * candle.volume;
        total_volume += candle.volume;
    }

    if total_volume.is_zero() {
        return None;
    }
    Some((weighted / total_volume).clamp(dec!(-1), dec!(1)))
}

/// One canonical immutable snapshot of all indicators for a candle slice
///
/// Computed fresh each cycle and shared by every strategy. Fields are
/// `None` when the series is too short for their lookback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub last_close: Decimal,
    pub last_volume: Decimal,
    pub ema5: Option<Decimal>,
    pub ema9: Option<Decimal>,
    pub ema20: Option<Decimal>,
    pub ema50: Option<Decimal>,
    pub ema200: Option<Decimal>,
    pub rsi: Option<Decimal>,
    pub macd: Option<Macd>,
    pub bollinger: Option<Bollinger>,
    pub atr: Option<Decimal>,
    pub adx: Option<Adx>,
    pub stochastic: Option<Stochastic>,
    pub vwap: Option<Decimal>,
    pub obv: Option<Obv>,
    pub order_flow: Option<Decimal>,
    /// Average volume over the last 20 bars
    pub volume_avg: Option<Decimal>,
}

impl IndicatorSnapshot {
    /// Compute a snapshot from an ordered candle slice
    ///
    /// Returns `None` only for an empty slice; otherwise individual fields
    /// carry their own insufficiency.
    pub fn compute(candles: &[Candle]) -> Option<Self> {
        let last = candles.last()?;
        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();

        Some(Self {
            timestamp: last.open_time,
            last_close: last.close,
            last_volume: last.volume,
            ema5: ema(&closes, 5),
            ema9: ema(&closes, 9),
            ema20: ema(&closes, 20),
            ema50: ema(&closes, 50),
            ema200: ema(&closes, 200),
            rsi: rsi(&closes, 14),
            macd: macd(&closes),
            bollinger: bollinger(&closes, 20, dec!(2)),
            atr: atr(candles, 14),
            adx: adx(candles, 14),
            stochastic: stochastic(candles, 14, 3, 3),
            vwap: vwap(candles),
            obv: obv(candles, 10),
            order_flow: order_flow_imbalance(candles, 10),
            volume_avg: sma(&volumes, 20),
        })
    }

    /// ATR as a percentage of the last close
    pub fn atr_percent(&self) -> Option<Decimal> {
        let atr = self.atr?;
        if self.last_close.is_zero() {
            return None;
        }
        Some(atr / self.last_close * dec!(100))
    }
}
