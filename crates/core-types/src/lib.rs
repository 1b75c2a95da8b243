pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{CastSource, Sentiment, Timeframe, WhaleSide};
pub use error::CoreError;
pub use structs::{
    AltseasonResult, BattleResult, BtcQuote, Cast, CastFeed, DominanceSnapshot, FearGreed,
    MarketSnapshot, NewsItem, WhaleAlert,
};
