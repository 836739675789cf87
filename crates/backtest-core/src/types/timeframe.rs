//! Timeframe definitions for market data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeframe for bars/candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// 1 minute bars
    #[serde(rename = "1m")]
    Minute1,
    /// 5 minute bars
    #[serde(rename = "5m")]
    Minute5,
    /// 15 minute bars
    #[serde(rename = "15m")]
    Minute15,
    /// 30 minute bars
    #[serde(rename = "30m")]
    Minute30,
    /// 1 hour bars
    #[serde(rename = "1h")]
    Hour1,
    /// 4 hour bars
    #[serde(rename = "4h")]
    Hour4,
    /// Daily bars
    #[serde(rename = "1d")]
    #[default]
    Daily,
    /// Weekly bars
    #[serde(rename = "1w")]
    Weekly,
    /// Monthly bars
    #[serde(rename = "1M")]
    Monthly,
}

impl Timeframe {
    /// Number of bars in a trading year, used to annualize metrics.
    ///
    /// Intraday timeframes assume 252 sessions of 6.5 hours.
    pub fn periods_per_year(&self) -> f64 {
        const TRADING_DAYS: f64 = 252.0;
        const SESSION_MINUTES: f64 = 390.0;
        match self {
            Timeframe::Minute1 => TRADING_DAYS * SESSION_MINUTES,
            Timeframe::Minute5 => TRADING_DAYS * SESSION_MINUTES / 5.0,
            Timeframe::Minute15 => TRADING_DAYS * SESSION_MINUTES / 15.0,
            Timeframe::Minute30 => TRADING_DAYS * SESSION_MINUTES / 30.0,
            Timeframe::Hour1 => TRADING_DAYS * SESSION_MINUTES / 60.0,
            Timeframe::Hour4 => TRADING_DAYS * SESSION_MINUTES / 240.0,
            Timeframe::Daily => TRADING_DAYS,
            Timeframe::Weekly => 52.0,
            Timeframe::Monthly => 12.0,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1w",
            Timeframe::Monthly => "1M",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "1M" is the only case-sensitive spelling; "1m" means one minute.
        if s == "1M" {
            return Ok(Timeframe::Monthly);
        }
        match s.to_lowercase().as_str() {
            "1m" | "1min" | "minute" => Ok(Timeframe::Minute1),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "30m" | "30min" => Ok(Timeframe::Minute30),
            "1h" | "1hour" | "hour" => Ok(Timeframe::Hour1),
            "4h" | "4hour" => Ok(Timeframe::Hour4),
            "1d" | "day" | "daily" => Ok(Timeframe::Daily),
            "1w" | "week" | "weekly" => Ok(Timeframe::Weekly),
            "1mo" | "month" | "monthly" => Ok(Timeframe::Monthly),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parse() {
        assert_eq!(Timeframe::from_str("1m").unwrap(), Timeframe::Minute1);
        assert_eq!(Timeframe::from_str("1d").unwrap(), Timeframe::Daily);
        assert_eq!(Timeframe::from_str("daily").unwrap(), Timeframe::Daily);
        assert_eq!(Timeframe::from_str("1M").unwrap(), Timeframe::Monthly);
        assert_eq!(Timeframe::from_str("monthly").unwrap(), Timeframe::Monthly);
        assert!(Timeframe::from_str("3d").is_err());
    }

    #[test]
    fn test_periods_per_year() {
        assert_eq!(Timeframe::Daily.periods_per_year(), 252.0);
        assert_eq!(Timeframe::Weekly.periods_per_year(), 52.0);
        assert_eq!(Timeframe::Monthly.periods_per_year(), 12.0);
        assert_eq!(Timeframe::Hour1.periods_per_year(), 1638.0);
        assert_eq!(Timeframe::Minute1.periods_per_year(), 98280.0);
    }

    #[test]
    fn test_timeframe_display() {
        assert_eq!(Timeframe::Minute1.to_string(), "1m");
        assert_eq!(Timeframe::Daily.to_string(), "1d");
    }
}
