use crate::error::EventsError;
use chrono::{DateTime, Utc};
use core_types::{AltseasonResult, BattleResult, CastFeed, FearGreed, NewsItem, WhaleAlert};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Enum representing the severity of a log message for structured logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
}

/// A structured log message to be sent over WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// The live market readings after a price tick or a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub change_24h_pct: f64,
    pub rsi: f64,
    pub long_short_ratio: f64,
    pub fear_greed: FearGreed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleUpdate {
    pub timestamp: DateTime<Utc>,
    pub result: BattleResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltseasonUpdate {
    pub timestamp: DateTime<Utc>,
    pub result: AltseasonResult,
    pub days_remaining: i64,
}

/// The top-level WebSocket message enum.
/// All communication from the server to the client will be one of these variants.
///
/// Serialized as `{"type": "...", "payload": {...}}`, e.g.
/// `{
///   "type": "Battle",
///   "payload": {
///     "timestamp": "...",
///     "result": { "bull_power": 12.4, "bear_power": 9.2, "tug_position": 43.6 }
///   }
/// }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DashboardEvent {
    /// A simple message to confirm to a new client that its WebSocket connection is active.
    Connected,
    Quote(MarketTick),
    Battle(BattleUpdate),
    Altseason(AltseasonUpdate),
    /// A new alert on the (simulated) whale tape.
    Whale(WhaleAlert),
    News(Vec<NewsItem>),
    /// The social feed after a refresh.
    Casts(CastFeed),
    Log(LogMessage),
}

impl DashboardEvent {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        DashboardEvent::Log(LogMessage {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        })
    }

    pub fn to_json(&self) -> Result<String, EventsError> {
        serde_json::to_string(self).map_err(|e| EventsError::Serialization(e.to_string()))
    }
}
