use rand::Rng;
use rust_decimal::prelude::*;

/// Values that wander between real refreshes.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftState {
    pub price: Decimal,
    pub rsi: f64,
    pub long_short_ratio: f64,
}

/// Direction of the last simulated price tick, used to flash the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceMove {
    Up,
    Down,
    Flat,
}

/// A bounded random walk for the price, RSI and long/short ratio.
#[derive(Debug, Clone)]
pub struct MarketDrift {
    /// Largest move per tick, in USD, either way.
    pub max_price_step: f64,
    /// Chance per tick that RSI and long/short also move.
    pub indicator_probability: f64,
    pub max_rsi_step: f64,
    pub rsi_bounds: (f64, f64),
    pub max_ratio_step: f64,
    pub ratio_bounds: (f64, f64),
}

impl Default for MarketDrift {
    fn default() -> Self {
        Self {
            max_price_step: 40.0,
            indicator_probability: 0.15,
            max_rsi_step: 2.5,
            rsi_bounds: (20.0, 80.0),
            max_ratio_step: 0.05,
            ratio_bounds: (0.5, 2.0),
        }
    }
}

impl MarketDrift {
    /// Advances `state` by one tick and reports which way the price moved.
    pub fn step<R: Rng + ?Sized>(&self, rng: &mut R, state: &mut DriftState) -> PriceMove {
        let delta = (rng.r#gen::<f64>() - 0.5) * 2.0 * self.max_price_step;
        let previous = state.price;
        // The walk works in whole dollars.
        let delta = Decimal::from_f64(delta).unwrap_or_default();
        state.price = (previous + delta).round();

        if rng.gen_bool(self.indicator_probability) {
            let rsi_delta = (rng.r#gen::<f64>() - 0.5) * 2.0 * self.max_rsi_step;
            state.rsi = (state.rsi + rsi_delta).clamp(self.rsi_bounds.0, self.rsi_bounds.1);

            let ratio_delta = (rng.r#gen::<f64>() - 0.5) * 2.0 * self.max_ratio_step;
            state.long_short_ratio = (state.long_short_ratio + ratio_delta)
                .clamp(self.ratio_bounds.0, self.ratio_bounds.1);
        }

        match state.price.cmp(&previous) {
            std::cmp::Ordering::Greater => PriceMove::Up,
            std::cmp::Ordering::Less => PriceMove::Down,
            std::cmp::Ordering::Equal => PriceMove::Flat,
        }
    }
}
