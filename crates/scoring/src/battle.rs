use core_types::{BattleResult, MarketSnapshot, WhaleSide};
use serde::{Deserialize, Serialize};

/// Only the final `WHALE_WINDOW` entries of the tape feed the flow term.
pub const WHALE_WINDOW: usize = 10;

/// The tug position when bulls and bears are evenly matched.
pub const TUG_NEUTRAL: f64 = 50.0;
/// Half-width of the tug scale before clamping.
const TUG_SPAN: f64 = 35.0;
pub const TUG_MIN: f64 = 15.0;
pub const TUG_MAX: f64 = 85.0;

// Per-category weights. They keep any single category from deciding the battle.
const PRICE_CHANGE_MULTIPLIER: f64 = 2.0;
const PRICE_CHANGE_CAP: f64 = 10.0;
const FEAR_GREED_DIVISOR: f64 = 10.0;
const RSI_DIVISOR: f64 = 20.0;
const LONG_SHORT_MULTIPLIER: f64 = 5.0;
const WHALE_BTC_DIVISOR: f64 = 500.0;

/// The market signal a contribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    PriceChange,
    Sentiment,
    Momentum,
    Positioning,
    WhaleFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Bull,
    Bear,
}

/// A single additive term of the battle score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub factor: Factor,
    pub side: Side,
    /// Always non-negative.
    pub amount: f64,
}

impl Contribution {
    fn new(factor: Factor, side: Side, amount: f64) -> Self {
        Self { factor, side, amount }
    }
}

/// Splits a snapshot into its individual bull/bear terms.
///
/// Each of the four indicator factors yields exactly one entry, followed by one
/// `WhaleFlow` entry per alert inside the whale window. A neutral reading
/// (e.g. a 0% price change) is booked to the bear side with an amount of zero.
pub fn battle_contributions(snapshot: &MarketSnapshot) -> Vec<Contribution> {
    let mut terms = Vec::with_capacity(4 + WHALE_WINDOW);

    let change = snapshot.price_change_pct_24h;
    terms.push(if change > 0.0 {
        Contribution::new(
            Factor::PriceChange,
            Side::Bull,
            (change * PRICE_CHANGE_MULTIPLIER).min(PRICE_CHANGE_CAP),
        )
    } else {
        Contribution::new(
            Factor::PriceChange,
            Side::Bear,
            (change.abs() * PRICE_CHANGE_MULTIPLIER).min(PRICE_CHANGE_CAP),
        )
    });

    let fear_greed = f64::from(snapshot.fear_greed);
    terms.push(if fear_greed > 50.0 {
        Contribution::new(Factor::Sentiment, Side::Bull, (fear_greed - 50.0) / FEAR_GREED_DIVISOR)
    } else {
        Contribution::new(Factor::Sentiment, Side::Bear, (50.0 - fear_greed) / FEAR_GREED_DIVISOR)
    });

    let rsi = snapshot.rsi;
    terms.push(if rsi > 50.0 {
        Contribution::new(Factor::Momentum, Side::Bull, (rsi - 50.0) / RSI_DIVISOR)
    } else {
        Contribution::new(Factor::Momentum, Side::Bear, (50.0 - rsi) / RSI_DIVISOR)
    });

    let ratio = snapshot.long_short_ratio;
    terms.push(if ratio > 1.0 {
        Contribution::new(Factor::Positioning, Side::Bull, (ratio - 1.0) * LONG_SHORT_MULTIPLIER)
    } else {
        Contribution::new(Factor::Positioning, Side::Bear, (1.0 - ratio) * LONG_SHORT_MULTIPLIER)
    });

    let alerts = &snapshot.recent_whale_alerts;
    let window = &alerts[alerts.len().saturating_sub(WHALE_WINDOW)..];
    terms.extend(window.iter().map(|alert| {
        let side = match alert.side {
            WhaleSide::Buy => Side::Bull,
            WhaleSide::Sell => Side::Bear,
        };
        Contribution::new(Factor::WhaleFlow, side, alert.amount_btc / WHALE_BTC_DIVISOR)
    }));

    terms
}

/// Computes bull power, bear power and the tug position for a snapshot.
///
/// When both powers are zero there is no imbalance to show, so the tug stays
/// at `previous_tug`.
pub fn compute_battle(snapshot: &MarketSnapshot, previous_tug: f64) -> BattleResult {
    let (bull_power, bear_power) = battle_contributions(snapshot).iter().fold(
        (0.0, 0.0),
        |(bull, bear), term| match term.side {
            Side::Bull => (bull + term.amount, bear),
            Side::Bear => (bull, bear + term.amount),
        },
    );

    BattleResult {
        bull_power,
        bear_power,
        tug_position: tug_position(bull_power, bear_power).unwrap_or(previous_tug),
    }
}

/// Maps the normalized imbalance `(bull - bear) / total` onto `[TUG_MIN, TUG_MAX]`.
///
/// Returns `None` when `bull + bear` is not positive.
pub fn tug_position(bull_power: f64, bear_power: f64) -> Option<f64> {
    let total = bull_power + bear_power;
    if total > 0.0 {
        let imbalance = (bull_power - bear_power) / total;
        Some((TUG_NEUTRAL - imbalance * TUG_SPAN).clamp(TUG_MIN, TUG_MAX))
    } else {
        None
    }
}
