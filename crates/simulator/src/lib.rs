//! # Market Simulator
//!
//! Synthetic inputs for the dashboard. Nothing produced here is observed market
//! data: the whale tape is random and the price drift is a random walk layered on
//! top of the last real quote between refreshes.
//!
//! The battle calculator reads whales through the `WhaleAlertSource` trait so tests
//! can swap the random source for a `ScriptedWhaleSource`.

pub mod drift;
pub mod error;
pub mod tape;
pub mod whales;

pub use drift::{DriftState, MarketDrift, PriceMove};
pub use error::SimulatorError;
pub use tape::WhaleTape;
pub use whales::{RandomWhaleSource, ScriptedWhaleSource, WhaleAlertSource};
