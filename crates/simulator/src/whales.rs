use crate::error::SimulatorError;
use chrono::Utc;
use configuration::SimulatorConfig;
use core_types::{WhaleAlert, WhaleSide};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use uuid::Uuid;

/// Anything that can feed whale alerts into the tape.
///
/// `Send + Sync` so the dashboard can own a boxed source inside a spawned task.
pub trait WhaleAlertSource: Send + Sync {
    /// Produces the next alert unconditionally. `None` means the source is exhausted.
    fn generate(&mut self, reference_price: Decimal) -> Option<WhaleAlert>;

    /// Called on every whale tick. Sources may decide to stay quiet.
    fn poll(&mut self, reference_price: Decimal) -> Option<WhaleAlert> {
        self.generate(reference_price)
    }
}

/// Random whale tape.
pub struct RandomWhaleSource {
    rng: StdRng,
    config: SimulatorConfig,
}

impl RandomWhaleSource {
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config
            .validate()
            .map_err(|e| SimulatorError::InvalidParameters(e.to_string()))?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self { rng, config })
    }
}

impl WhaleAlertSource for RandomWhaleSource {
    fn generate(&mut self, reference_price: Decimal) -> Option<WhaleAlert> {
        let side = if self.rng.gen_bool(0.5) { WhaleSide::Buy } else { WhaleSide::Sell };
        let amount = self
            .rng
            .gen_range(self.config.min_amount_btc..self.config.max_amount_btc);
        let venue = self.rng.gen_range(0..self.config.exchanges.len());

        let usd_value_millions =
            (Decimal::from(amount) * reference_price / dec!(1_000_000)).round_dp(1);

        Some(WhaleAlert {
            id: uuid_from_rng(&mut self.rng),
            side,
            amount_btc: f64::from(amount),
            usd_value_millions,
            exchange: self.config.exchanges[venue].clone(),
            timestamp: Utc::now(),
        })
    }

    fn poll(&mut self, reference_price: Decimal) -> Option<WhaleAlert> {
        if self.rng.gen_bool(self.config.emit_probability) {
            self.generate(reference_price)
        } else {
            None
        }
    }
}

/// Ids come from the source's own RNG so seeded runs are fully reproducible.
fn uuid_from_rng(rng: &mut StdRng) -> Uuid {
    Uuid::from_u128(rng.r#gen())
}

/// Replays a fixed sequence of alerts, oldest first.
#[derive(Debug, Default)]
pub struct ScriptedWhaleSource {
    queue: VecDeque<WhaleAlert>,
}

impl ScriptedWhaleSource {
    pub fn new(alerts: impl IntoIterator<Item = WhaleAlert>) -> Self {
        Self { queue: alerts.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl WhaleAlertSource for ScriptedWhaleSource {
    fn generate(&mut self, _reference_price: Decimal) -> Option<WhaleAlert> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(emit_probability: f64) -> SimulatorConfig {
        SimulatorConfig {
            emit_probability,
            min_amount_btc: 100,
            max_amount_btc: 2100,
            tape_capacity: 15,
            initial_alerts: 4,
            exchanges: vec!["Coinbase".to_string(), "Kraken".to_string()],
            seed: Some(7),
        }
    }

    #[test]
    fn test_generated_alerts_respect_config() {
        let mut source = RandomWhaleSource::new(config(0.4)).unwrap();

        for _ in 0..500 {
            let alert = source.generate(dec!(100000)).unwrap();
            assert!(alert.amount_btc >= 100.0 && alert.amount_btc < 2100.0);
            assert_eq!(alert.amount_btc.fract(), 0.0);
            assert!(alert.exchange == "Coinbase" || alert.exchange == "Kraken");
            // amount * 100_000 / 1_000_000 == amount / 10
            let expected = (Decimal::from(alert.amount_btc as u32) / dec!(10)).round_dp(1);
            assert_eq!(alert.usd_value_millions, expected);
        }
    }

    #[test]
    fn test_poll_honours_probability_extremes() {
        let mut silent = RandomWhaleSource::new(config(0.0)).unwrap();
        assert!((0..100).all(|_| silent.poll(dec!(98432)).is_none()));

        let mut chatty = RandomWhaleSource::new(config(1.0)).unwrap();
        assert!((0..100).all(|_| chatty.poll(dec!(98432)).is_some()));
    }

    #[test]
    fn test_seeded_sources_are_reproducible() {
        let mut a = RandomWhaleSource::new(config(0.4)).unwrap();
        let mut b = RandomWhaleSource::new(config(0.4)).unwrap();

        for _ in 0..20 {
            let key = |w: WhaleAlert| (w.id, w.side, w.amount_btc, w.exchange);
            assert_eq!(a.poll(dec!(98432)).map(key), b.poll(dec!(98432)).map(key));
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut bad = config(0.4);
        bad.exchanges.clear();
        assert!(RandomWhaleSource::new(bad).is_err());
    }

    #[test]
    fn test_scripted_source_replays_in_order() {
        let mut source = ScriptedWhaleSource::new(vec![
            WhaleAlert::new(WhaleSide::Buy, 100.0),
            WhaleAlert::new(WhaleSide::Sell, 200.0),
        ]);

        assert_eq!(source.poll(dec!(1)).unwrap().side, WhaleSide::Buy);
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.poll(dec!(1)).unwrap().amount_btc, 200.0);
        assert!(source.poll(dec!(1)).is_none());
    }
}
