use api_client::responses::fallback_casts;
use api_client::MarketContext;
use chrono::{DateTime, Utc};
use core_types::{
    AltseasonResult, BattleResult, BtcQuote, CastFeed, CastSource, DominanceSnapshot, FearGreed,
    MarketSnapshot, NewsItem, WhaleAlert,
};
use events::MarketTick;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use scoring::altseason::{LOADING_SIGNAL, NEUTRAL_SCORE};
use scoring::{compute_battle, AltseasonCalculator, BattleVerdict, MarketWeather, PositioningZone, RsiZone};
use serde::{Deserialize, Serialize};
use simulator::{DriftState, PriceMove, WhaleTape};

/// Tug position shown before the first battle is computed.
pub const INITIAL_TUG: f64 = 55.0;

// Readings shown until the first successful refresh.
const DEFAULT_PRICE: Decimal = dec!(98432);
const DEFAULT_CHANGE_PCT: f64 = 2.34;
const DEFAULT_BTC_DOMINANCE: f64 = 58.2;
const DEFAULT_STABLECOIN_DOMINANCE: f64 = 4.8;
const DEFAULT_FEAR_GREED: u8 = 72;
const DEFAULT_RSI: f64 = 62.0;
const DEFAULT_LONG_SHORT: f64 = 1.24;

/// Everything the dashboard knows about the market right now.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub quote: BtcQuote,
    pub last_move: PriceMove,
    /// `None` until the first dominance fetch succeeds; the altseason score stays neutral until then.
    pub dominance: Option<DominanceSnapshot>,
    pub fear_greed: FearGreed,
    pub rsi: f64,
    pub long_short_ratio: f64,
    pub whales: WhaleTape,
    pub news: Vec<NewsItem>,
    /// Starts out as the curated casts until the hub answers.
    pub casts: CastFeed,
    pub battle: BattleResult,
    pub altseason: AltseasonResult,
    pub days_remaining: i64,
    pub updated_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn new(tape_capacity: usize) -> Self {
        Self {
            quote: BtcQuote {
                price: DEFAULT_PRICE,
                change_24h_pct: DEFAULT_CHANGE_PCT,
                volume_24h: None,
                market_cap: None,
            },
            last_move: PriceMove::Flat,
            dominance: None,
            fear_greed: FearGreed {
                value: DEFAULT_FEAR_GREED,
                classification: "Greed".to_string(),
            },
            rsi: DEFAULT_RSI,
            long_short_ratio: DEFAULT_LONG_SHORT,
            whales: WhaleTape::new(tape_capacity),
            news: Vec::new(),
            casts: CastFeed {
                casts: fallback_casts(Utc::now()),
                source: CastSource::Fallback,
            },
            battle: BattleResult {
                bull_power: 0.0,
                bear_power: 0.0,
                tug_position: INITIAL_TUG,
            },
            altseason: AltseasonResult {
                score: NEUTRAL_SCORE,
                signals: vec![LOADING_SIGNAL.to_string()],
            },
            days_remaining: 0,
            updated_at: Utc::now(),
        }
    }

    /// The battle inputs as of now.
    pub fn market_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            price_change_pct_24h: self.quote.change_24h_pct,
            fear_greed: self.fear_greed.value,
            rsi: self.rsi,
            long_short_ratio: self.long_short_ratio,
            recent_whale_alerts: self.whales.to_vec(),
        }
    }

    /// Re-scores the battle, carrying the previous tug over when both powers are zero.
    pub fn recompute_battle(&mut self) -> BattleResult {
        self.battle = compute_battle(&self.market_snapshot(), self.battle.tug_position);
        self.updated_at = Utc::now();
        self.battle
    }

    pub fn recompute_altseason(&mut self, calculator: &AltseasonCalculator, now: DateTime<Utc>) -> &AltseasonResult {
        self.altseason = calculator.calculate(self.dominance.as_ref(), Some(self.quote.price), now);
        self.days_remaining = calculator.days_remaining(now);
        self.updated_at = now;
        &self.altseason
    }

    pub fn drift_state(&self) -> DriftState {
        DriftState {
            price: self.quote.price,
            rsi: self.rsi,
            long_short_ratio: self.long_short_ratio,
        }
    }

    pub fn apply_drift(&mut self, drift: DriftState, movement: PriceMove) {
        self.quote.price = drift.price;
        self.rsi = drift.rsi;
        self.long_short_ratio = drift.long_short_ratio;
        self.last_move = movement;
    }

    pub fn market_tick(&self) -> MarketTick {
        MarketTick {
            timestamp: self.updated_at,
            price: self.quote.price,
            change_24h_pct: self.quote.change_24h_pct,
            rsi: self.rsi,
            long_short_ratio: self.long_short_ratio,
            fear_greed: self.fear_greed.clone(),
        }
    }

    pub fn btc_dominance_pct(&self) -> f64 {
        self.dominance
            .map(|d| d.btc_dominance_pct)
            .unwrap_or(DEFAULT_BTC_DOMINANCE)
    }

    pub fn stablecoin_dominance_pct(&self) -> f64 {
        self.dominance
            .map(|d| d.stablecoin_dominance_pct)
            .unwrap_or(DEFAULT_STABLECOIN_DOMINANCE)
    }

    /// The readings quoted to the language model for a TA summary.
    pub fn market_context(&self) -> MarketContext {
        MarketContext {
            price: Some(self.quote.price),
            change_24h_pct: Some(self.quote.change_24h_pct),
            rsi: Some(self.rsi),
            fear_greed: Some(self.fear_greed.clone()),
            btc_dominance_pct: Some(self.btc_dominance_pct()),
            stablecoin_dominance_pct: Some(self.stablecoin_dominance_pct()),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let verdict = BattleVerdict::from_tug(self.battle.tug_position);
        DashboardSnapshot {
            price: self.quote.price,
            change_24h_pct: self.quote.change_24h_pct,
            volume_24h: self.quote.volume_24h,
            market_cap: self.quote.market_cap,
            btc_dominance_pct: self.btc_dominance_pct(),
            stablecoin_dominance_pct: self.stablecoin_dominance_pct(),
            others_dominance_pct: self.dominance.map(|d| d.others_dominance_pct),
            fear_greed: self.fear_greed.clone(),
            weather: MarketWeather::from_fear_greed(self.fear_greed.value),
            rsi: self.rsi,
            rsi_zone: RsiZone::from_rsi(self.rsi),
            long_short_ratio: self.long_short_ratio,
            positioning: PositioningZone::from_ratio(self.long_short_ratio),
            battle: self.battle,
            verdict,
            verdict_label: verdict.label().to_string(),
            altseason: self.altseason.clone(),
            days_remaining: self.days_remaining,
            whales: self.whales.to_vec(),
            news: self.news.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// A serializable, point-in-time copy of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub price: Decimal,
    pub change_24h_pct: f64,
    pub volume_24h: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub btc_dominance_pct: f64,
    pub stablecoin_dominance_pct: f64,
    pub others_dominance_pct: Option<f64>,
    pub fear_greed: FearGreed,
    pub weather: MarketWeather,
    pub rsi: f64,
    pub rsi_zone: RsiZone,
    pub long_short_ratio: f64,
    pub positioning: PositioningZone,
    pub battle: BattleResult,
    pub verdict: BattleVerdict,
    pub verdict_label: String,
    pub altseason: AltseasonResult,
    pub days_remaining: i64,
    pub whales: Vec<WhaleAlert>,
    pub news: Vec<NewsItem>,
    pub updated_at: DateTime<Utc>,
}
