//! Core market data types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tradable asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
    Sol,
    Xrp,
}

impl Asset {
    /// Exchange spot symbol for this asset
    pub fn spot_symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTCUSDT",
            Asset::Eth => "ETHUSDT",
            Asset::Sol => "SOLUSDT",
            Asset::Xrp => "XRPUSDT",
        }
    }

    /// All supported assets
    pub fn all() -> [Asset; 4] {
        [Asset::Btc, Asset::Eth, Asset::Sol, Asset::Xrp]
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Sol => "SOL",
            Asset::Xrp => "XRP",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BTC" => Ok(Asset::Btc),
            "ETH" => Ok(Asset::Eth),
            "SOL" => Ok(Asset::Sol),
            "XRP" => Ok(Asset::Xrp),
            other => Err(format!("unknown asset: {}", other)),
        }
    }
}

/// Candle timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "1h")]
    Hour1,
}

impl Timeframe {
    /// Duration of one candle in seconds
    pub fn seconds(&self) -> i64 {
        match self {
            Timeframe::Min5 => 300,
            Timeframe::Min15 => 900,
            Timeframe::Hour1 => 3600,
        }
    }

    /// Exchange interval string
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::Min5 => "5m",
            Timeframe::Min15 => "15m",
            Timeframe::Hour1 => "1h",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interval())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(Timeframe::Min5),
            "15m" => Ok(Timeframe::Min15),
            "1h" => Ok(Timeframe::Hour1),
            other => Err(format!("unknown timeframe: {}", other)),
        }
    }
}

/// One OHLCV bar for a fixed time interval
///
/// Immutable once closed. A candle with the same open_time as the latest
/// buffered candle replaces it (the bar is still forming on the exchange).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub asset: Asset,
    pub timeframe: Timeframe,
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Typical price (HLC/3), used for VWAP
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    /// Full bar range (high - low)
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// True if the close is above the open
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// A single spot price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_asset_roundtrip() {
        for asset in Asset::all() {
            let parsed: Asset = asset.to_string().parse().unwrap();
            assert_eq!(parsed, asset);
        }
    }

    #[test]
    fn test_asset_parse_case_insensitive() {
        assert_eq!("btc".parse::<Asset>().unwrap(), Asset::Btc);
        assert!("DOGE".parse::<Asset>().is_err());
    }

    #[test]
    fn test_timeframe_seconds() {
        assert_eq!(Timeframe::Min5.seconds(), 300);
        assert_eq!(Timeframe::Min15.seconds(), 900);
        assert_eq!(Timeframe::Hour1.seconds(), 3600);
    }

    #[test]
    fn test_timeframe_parse() {
        assert_eq!("15m".parse::<Timeframe>().unwrap(), Timeframe::Min15);
        assert!("2h".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_typical_price() {
        let candle = Candle {
            asset: Asset::Btc,
            timeframe: Timeframe::Min15,
            open_time: Utc::now(),
            open: dec!(100),
            high: dec!(110),
            low: dec!(90),
            close: dec!(100),
            volume: dec!(10),
        };
        assert_eq!(candle.typical_price(), dec!(100));
        assert_eq!(candle.range(), dec!(20));
        assert!(!candle.is_bullish());
    }
}
