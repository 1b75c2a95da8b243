use crate::error::ScoringError;
use crate::format::format_price;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use configuration::AltseasonParams;
use core_types::{AltseasonResult, DominanceSnapshot};
use rust_decimal::Decimal;

/// Score reported while dominance or price data is still missing.
pub const NEUTRAL_SCORE: u8 = 50;
pub const LOADING_SIGNAL: &str = "Loading data...";
pub const MAX_SCORE: u8 = 100;

const MILLIS_PER_DAY: f64 = 86_400_000.0;
/// The countdown awards its top tier inside this many days.
const FINAL_STRETCH_DAYS: i64 = 45;

/// One row of the score table: the points it awards and the text explaining why.
struct Award {
    points: u8,
    signal: String,
}

impl Award {
    fn new(points: u8, signal: String) -> Self {
        Self { points, signal }
    }
}

/// A stateless calculator that turns dominance and price data into an altseason score.
#[derive(Debug, Clone)]
pub struct AltseasonCalculator {
    params: AltseasonParams,
}

impl AltseasonCalculator {
    /// Creates a calculator, rejecting price levels that are out of order.
    pub fn new(params: AltseasonParams) -> Result<Self, ScoringError> {
        params
            .validate()
            .map_err(|e| ScoringError::InvalidParameters(e.to_string()))?;
        tracing::debug!(target_date = %params.target_date, "Altseason calculator ready.");
        Ok(Self { params })
    }

    pub fn params(&self) -> &AltseasonParams {
        &self.params
    }

    /// Scores the current market.
    ///
    /// Returns the neutral `{ 50, ["Loading data..."] }` result when either
    /// input is missing. Otherwise the result always carries exactly five
    /// signals, in this order: BTC dominance, others dominance, stablecoin
    /// dominance, BTC support, time remaining.
    pub fn calculate(
        &self,
        dominance: Option<&DominanceSnapshot>,
        btc_price: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> AltseasonResult {
        let (Some(dominance), Some(btc_price)) = (dominance, btc_price) else {
            return AltseasonResult {
                score: NEUTRAL_SCORE,
                signals: vec![LOADING_SIGNAL.to_string()],
            };
        };

        let awards = [
            btc_dominance_award(dominance.btc_dominance_pct),
            others_dominance_award(dominance.others_dominance_pct),
            stablecoin_award(dominance.stablecoin_dominance_pct),
            self.btc_support_award(btc_price),
            self.time_remaining_award(now),
        ];

        let total: u32 = awards.iter().map(|a| u32::from(a.points)).sum();
        // Bounded by MAX_SCORE, so the narrowing cast cannot truncate.
        let score = total.min(u32::from(MAX_SCORE)) as u8;

        AltseasonResult {
            score,
            signals: awards.into_iter().map(|a| a.signal).collect(),
        }
    }

    /// Whole days until the target date, rounded up. Zero or negative once it has passed.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        days_until(self.params.target_date, now)
    }

    fn btc_support_award(&self, price: Decimal) -> Award {
        let p = &self.params;
        let shown = format_price(price);

        if price >= p.critical_low {
            let signal = if price >= p.bull_confirmation {
                format!(
                    "BTC {} is above the {} bull confirmation",
                    shown,
                    format_price(p.bull_confirmation)
                )
            } else if price >= p.critical_high {
                format!(
                    "BTC {} cleared the {} critical zone",
                    shown,
                    format_price(p.critical_high)
                )
            } else {
                format!("BTC {} is holding {} support", shown, format_price(p.critical_low))
            };
            Award::new(20, signal)
        } else if price >= p.breakdown {
            Award::new(
                10,
                format!(
                    "BTC {} lost {} support but holds the {} breakdown level",
                    shown,
                    format_price(p.critical_low),
                    format_price(p.breakdown)
                ),
            )
        } else {
            Award::new(
                0,
                format!("BTC {} broke down below {}", shown, format_price(p.breakdown)),
            )
        }
    }

    fn time_remaining_award(&self, now: DateTime<Utc>) -> Award {
        let days = self.days_remaining(now);
        let target = self.params.target_date.format("%Y-%m-%d");

        if days > 0 && days <= FINAL_STRETCH_DAYS {
            Award::new(15, format!("{} days left before {}: the window is open", days, target))
        } else if days > FINAL_STRETCH_DAYS {
            Award::new(5, format!("{} days until {}", days, target))
        } else {
            Award::new(0, format!("Target date {} has passed", target))
        }
    }
}

fn btc_dominance_award(pct: f64) -> Award {
    if pct < 61.0 {
        Award::new(
            25,
            format!("BTC dominance {:.1}% is below 61%: capital is rotating into alts", pct),
        )
    } else if pct < 64.0 {
        Award::new(
            15,
            format!("BTC dominance {:.1}% is below 64%: rotation is starting", pct),
        )
    } else {
        Award::new(
            0,
            format!("BTC dominance {:.1}% is at or above 64%: Bitcoin season", pct),
        )
    }
}

fn others_dominance_award(pct: f64) -> Award {
    if pct > 30.0 {
        Award::new(
            25,
            format!("Others dominance {:.1}% is above 30%: altcoins are leading", pct),
        )
    } else if pct > 25.0 {
        Award::new(
            15,
            format!("Others dominance {:.1}% is above 25%: altcoins are building", pct),
        )
    } else {
        Award::new(
            0,
            format!("Others dominance {:.1}% is at or below 25%: altcoins are lagging", pct),
        )
    }
}

fn stablecoin_award(pct: f64) -> Award {
    if pct < 6.0 {
        Award::new(
            15,
            format!("Stablecoin dominance {:.1}% is below 6%: capital is deployed", pct),
        )
    } else {
        Award::new(
            5,
            format!(
                "Stablecoin dominance {:.1}% is at or above 6%: capital is waiting on the sidelines",
                pct
            ),
        )
    }
}

fn days_until(target_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let target = target_date.and_time(NaiveTime::default()).and_utc();
    let millis = (target - now).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).ceil() as i64
}
