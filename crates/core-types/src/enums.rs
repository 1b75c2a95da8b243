use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The direction of a large BTC transfer on the whale tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhaleSide {
    Buy,
    Sell,
}

impl fmt::Display for WhaleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhaleSide::Buy => write!(f, "BUY"),
            WhaleSide::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for WhaleSide {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(WhaleSide::Buy),
            "sell" => Ok(WhaleSide::Sell),
            other => Err(CoreError::InvalidInput("whale side".to_string(), other.to_string())),
        }
    }
}

/// The crowd reading attached to a news headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    /// Classifies a headline from its community vote counts.
    pub fn from_votes(positive: u32, negative: u32) -> Self {
        if positive > negative {
            Sentiment::Bullish
        } else if negative > positive {
            Sentiment::Bearish
        } else {
            Sentiment::Neutral
        }
    }
}

/// Where a batch of casts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastSource {
    Live,
    Fallback,
}

/// The horizon requested for a technical analysis summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "4h")]
    FourHour,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FourHour => "4h",
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
        }
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4h" => Ok(Timeframe::FourHour),
            "daily" => Ok(Timeframe::Daily),
            "weekly" => Ok(Timeframe::Weekly),
            other => Err(CoreError::InvalidInput("timeframe".to_string(), other.to_string())),
        }
    }
}
