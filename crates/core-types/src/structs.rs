use crate::enums::{CastSource, Sentiment, WhaleSide};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single large BTC movement on the whale tape.
///
/// The tape is synthesized by the simulator; these are not observed on-chain
/// transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleAlert {
    pub id: Uuid,
    pub side: WhaleSide,
    pub amount_btc: f64,
    /// Notional value in millions of USD at the time the alert was generated.
    pub usd_value_millions: Decimal,
    pub exchange: String,
    pub timestamp: DateTime<Utc>,
}

impl WhaleAlert {
    /// Builds an alert with only the fields the battle calculator reads.
    pub fn new(side: WhaleSide, amount_btc: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            side,
            amount_btc,
            usd_value_millions: Decimal::ZERO,
            exchange: String::from("Unknown Wallet"),
            timestamp: Utc::now(),
        }
    }
}

/// The inputs of the bull vs bear battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Signed 24h price change, in percent.
    pub price_change_pct_24h: f64,
    /// Fear & greed index value, 0-100.
    pub fear_greed: u8,
    pub rsi: f64,
    pub long_short_ratio: f64,
    /// Most-recent-first, as maintained by the whale tape.
    pub recent_whale_alerts: Vec<WhaleAlert>,
}

/// The output of the battle calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub bull_power: f64,
    pub bear_power: f64,
    /// 15 means bulls are winning outright, 85 means bears are.
    pub tug_position: f64,
}

/// Market cap shares used by the altseason calculator, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominanceSnapshot {
    pub btc_dominance_pct: f64,
    pub others_dominance_pct: f64,
    pub stablecoin_dominance_pct: f64,
}

impl DominanceSnapshot {
    /// Derives the "others" share as everything that is neither BTC nor ETH.
    pub fn from_shares(btc_pct: f64, eth_pct: f64, stablecoin_pct: f64) -> Self {
        Self {
            btc_dominance_pct: btc_pct,
            others_dominance_pct: 100.0 - btc_pct - eth_pct,
            stablecoin_dominance_pct: stablecoin_pct,
        }
    }
}

/// The output of the altseason calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltseasonResult {
    pub score: u8,
    pub signals: Vec<String>,
}

/// The latest BTC spot quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BtcQuote {
    pub price: Decimal,
    pub change_24h_pct: f64,
    pub volume_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FearGreed {
    pub value: u8,
    pub classification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub source: String,
    pub sentiment: Sentiment,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

/// A post from the social feed of featured accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cast {
    pub id: String,
    pub author: String,
    /// Empty when the author has no profile picture.
    pub author_pfp: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// The hub does not report reactions, so live casts carry 0.
    pub likes: u32,
    pub channel: String,
}

/// The social feed as served to clients, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastFeed {
    pub casts: Vec<Cast>,
    pub source: CastSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance_from_shares() {
        let snapshot = DominanceSnapshot::from_shares(58.0, 12.0, 5.5);
        assert_eq!(snapshot.btc_dominance_pct, 58.0);
        assert_eq!(snapshot.others_dominance_pct, 30.0);
        assert_eq!(snapshot.stablecoin_dominance_pct, 5.5);
    }

    #[test]
    fn test_whale_alert_serializes_side_lowercase() {
        let alert = WhaleAlert::new(WhaleSide::Sell, 1000.0);
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["side"], "sell");
        assert_eq!(json["amount_btc"], 1000.0);
    }
}
