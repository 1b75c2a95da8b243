use crate::battle::TUG_NEUTRAL;
use serde::{Deserialize, Serialize};

/// Which camp the tug-of-war currently favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleVerdict {
    BullsDominating,
    Balanced,
    BearsDominating,
}

impl BattleVerdict {
    /// The middle band is ten points either side of neutral.
    pub fn from_tug(tug_position: f64) -> Self {
        if tug_position < TUG_NEUTRAL - 10.0 {
            BattleVerdict::BullsDominating
        } else if tug_position > TUG_NEUTRAL + 10.0 {
            BattleVerdict::BearsDominating
        } else {
            BattleVerdict::Balanced
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BattleVerdict::BullsDominating => "Bulls Dominating!",
            BattleVerdict::Balanced => "Balanced Battle",
            BattleVerdict::BearsDominating => "Bears Dominating!",
        }
    }
}

/// A weather metaphor for the fear & greed index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketWeather {
    Sunny,
    PartlyCloudy,
    Rainy,
    Stormy,
}

impl MarketWeather {
    pub fn from_fear_greed(value: u8) -> Self {
        match value {
            75.. => MarketWeather::Sunny,
            50..=74 => MarketWeather::PartlyCloudy,
            25..=49 => MarketWeather::Rainy,
            _ => MarketWeather::Stormy,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MarketWeather::Sunny => "☀️",
            MarketWeather::PartlyCloudy => "⛅",
            MarketWeather::Rainy => "🌧️",
            MarketWeather::Stormy => "⛈️",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiZone {
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi > 70.0 {
            RsiZone::Overbought
        } else if rsi < 30.0 {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}

/// Crowding of derivatives positioning, read from the long/short ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositioningZone {
    /// Squeeze potential.
    CrowdedShort,
    Balanced,
    /// Dump risk.
    CrowdedLong,
}

impl PositioningZone {
    pub fn from_ratio(long_short_ratio: f64) -> Self {
        if long_short_ratio < 0.8 {
            PositioningZone::CrowdedShort
        } else if long_short_ratio > 1.5 {
            PositioningZone::CrowdedLong
        } else {
            PositioningZone::Balanced
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_bands() {
        assert_eq!(BattleVerdict::from_tug(15.0), BattleVerdict::BullsDominating);
        assert_eq!(BattleVerdict::from_tug(39.9), BattleVerdict::BullsDominating);
        assert_eq!(BattleVerdict::from_tug(40.0), BattleVerdict::Balanced);
        assert_eq!(BattleVerdict::from_tug(60.0), BattleVerdict::Balanced);
        assert_eq!(BattleVerdict::from_tug(60.1), BattleVerdict::BearsDominating);
        assert_eq!(BattleVerdict::from_tug(85.0).label(), "Bears Dominating!");
    }

    #[test]
    fn test_weather_from_fear_greed() {
        assert_eq!(MarketWeather::from_fear_greed(100), MarketWeather::Sunny);
        assert_eq!(MarketWeather::from_fear_greed(75), MarketWeather::Sunny);
        assert_eq!(MarketWeather::from_fear_greed(74), MarketWeather::PartlyCloudy);
        assert_eq!(MarketWeather::from_fear_greed(50), MarketWeather::PartlyCloudy);
        assert_eq!(MarketWeather::from_fear_greed(25), MarketWeather::Rainy);
        assert_eq!(MarketWeather::from_fear_greed(24), MarketWeather::Stormy);
    }

    #[test]
    fn test_indicator_zones() {
        assert_eq!(RsiZone::from_rsi(75.0), RsiZone::Overbought);
        assert_eq!(RsiZone::from_rsi(70.0), RsiZone::Neutral);
        assert_eq!(RsiZone::from_rsi(22.0), RsiZone::Oversold);

        assert_eq!(PositioningZone::from_ratio(0.7), PositioningZone::CrowdedShort);
        assert_eq!(PositioningZone::from_ratio(1.24), PositioningZone::Balanced);
        assert_eq!(PositioningZone::from_ratio(1.8), PositioningZone::CrowdedLong);
    }
}
