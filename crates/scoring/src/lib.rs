//! # Market Composite Scoring
//!
//! This crate turns raw market metrics into the two composite signals shown on the
//! dashboard: the bull vs bear battle and the altseason score.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of feeds,
//!   timers or the web surface. It depends only on `core-types` and `configuration`.
//! - **Stateless Calculation:** Every function takes a snapshot and returns a result.
//!   Nothing is cached between calls, so concurrent callers need no coordination and
//!   tests can feed fixed inputs.
//!
//! ## Public API
//!
//! - `compute_battle` / `battle_contributions`: the bull vs bear calculator.
//! - `AltseasonCalculator`: the altseason score, configured with `AltseasonParams`.
//! - `mood`: small classifiers used to label readings (verdict, weather, zones).
//! - `format`: display helpers for prices, volumes and ages.

// Declare the modules that constitute this crate.
pub mod altseason;
pub mod battle;
pub mod error;
pub mod format;
pub mod mood;

// Re-export the key components to create a clean, public-facing API.
pub use altseason::AltseasonCalculator;
pub use battle::{battle_contributions, compute_battle, Contribution, Factor, Side};
pub use error::ScoringError;
pub use mood::{BattleVerdict, MarketWeather, PositioningZone, RsiZone};
