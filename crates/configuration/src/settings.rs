use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::Timeframe;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub altseason: AltseasonParams,
    pub feeds: FeedsConfig,
    pub polling: PollingConfig,
    pub simulator: SimulatorConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Checks the cross-field rules that `serde` cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.altseason.validate()?;
        self.polling.validate()?;
        self.simulator.validate()?;
        Ok(())
    }
}

/// Thresholds for the altseason score.
///
/// The BTC price levels are external market levels, not derived from anything.
#[derive(Debug, Clone, Deserialize)]
pub struct AltseasonParams {
    /// The date the "time remaining" signal counts down to (00:00 UTC).
    pub target_date: NaiveDate,
    /// Holding this level awards the full BTC support points.
    pub critical_low: Decimal,
    /// The top of the critical zone.
    pub critical_high: Decimal,
    /// A close above this confirms the bull trend.
    pub bull_confirmation: Decimal,
    /// Below this level BTC support awards nothing.
    pub breakdown: Decimal,
}

impl AltseasonParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.breakdown < self.critical_low
            && self.critical_low <= self.critical_high
            && self.critical_high <= self.bull_confirmation;
        if !ordered {
            return Err(ConfigError::ValidationError(format!(
                "altseason levels must satisfy breakdown < critical_low <= critical_high <= bull_confirmation \
                 (got {} / {} / {} / {})",
                self.breakdown, self.critical_low, self.critical_high, self.bull_confirmation
            )));
        }
        Ok(())
    }
}

impl Default for AltseasonParams {
    fn default() -> Self {
        Self {
            target_date: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
            critical_low: Decimal::from(104_000),
            critical_high: Decimal::from(105_000),
            bull_confirmation: Decimal::from(116_000),
            breakdown: Decimal::from(88_000),
        }
    }
}

/// Upstream endpoints for market data.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    /// e.g. "https://api.coingecko.com/api/v3"
    pub coingecko_base_url: String,
    pub fear_greed_url: String,
    pub news_url: String,
    /// Optional auth token for the news aggregator.
    #[serde(default)]
    pub news_auth_token: Option<String>,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Base URL of the Farcaster hub HTTP API.
    #[serde(default = "default_farcaster_hub_url")]
    pub farcaster_hub_url: String,
    /// Accounts whose latest casts make up the social feed.
    #[serde(default = "default_featured_accounts")]
    pub featured_accounts: Vec<FeaturedAccount>,
}

/// A Farcaster account on the social feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeaturedAccount {
    pub fid: u64,
    /// Shown when the hub has no username for the account.
    pub fallback_name: String,
}

impl FeaturedAccount {
    fn new(fid: u64, fallback_name: &str) -> Self {
        Self {
            fid,
            fallback_name: fallback_name.to_string(),
        }
    }
}

fn default_farcaster_hub_url() -> String {
    "https://hub.pinata.cloud/v1".to_string()
}

fn default_featured_accounts() -> Vec<FeaturedAccount> {
    [
        (3, "dwr.eth"),
        (5650, "vitalik.eth"),
        (99, "jessepollak"),
        (680, "linda"),
        (2433, "balajis.eth"),
        (12, "woj.eth"),
        (7143, "seneca"),
        (239, "ted"),
        (576, "nonlinear.eth"),
        (1317, "cassie"),
        (194, "cameron"),
        (617, "ace"),
        (2904, "july"),
        (4167, "pinata"),
        (7732, "base"),
    ]
    .into_iter()
    .map(|(fid, name)| FeaturedAccount::new(fid, name))
    .collect()
}

/// How often each part of the dashboard is refreshed.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Simulated price / RSI / long-short drift.
    #[serde(with = "humantime_serde")]
    pub price_tick: Duration,
    /// Simulated whale tape.
    #[serde(with = "humantime_serde")]
    pub whale_poll: Duration,
    /// Real quote and dominance data.
    #[serde(with = "humantime_serde")]
    pub market_refresh: Duration,
    #[serde(with = "humantime_serde")]
    pub fear_greed_refresh: Duration,
    #[serde(with = "humantime_serde")]
    pub news_refresh: Duration,
    /// Farcaster casts of the featured accounts.
    #[serde(with = "humantime_serde", default = "default_social_refresh")]
    pub social_refresh: Duration,
}

fn default_social_refresh() -> Duration {
    Duration::from_secs(60)
}

impl PollingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("price_tick", self.price_tick),
            ("whale_poll", self.whale_poll),
            ("market_refresh", self.market_refresh),
            ("fear_greed_refresh", self.fear_greed_refresh),
            ("news_refresh", self.news_refresh),
            ("social_refresh", self.social_refresh),
        ];
        for (name, interval) in intervals {
            if interval.is_zero() {
                return Err(ConfigError::ValidationError(format!(
                    "polling.{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Parameters of the synthetic whale tape.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// Chance that a whale poll produces an alert.
    pub emit_probability: f64,
    /// Inclusive lower bound of an alert's size, in BTC.
    pub min_amount_btc: u32,
    /// Exclusive upper bound of an alert's size, in BTC.
    pub max_amount_btc: u32,
    pub tape_capacity: usize,
    pub initial_alerts: usize,
    pub exchanges: Vec<String>,
    /// Fixes the RNG for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.emit_probability) {
            return Err(ConfigError::ValidationError(
                "simulator.emit_probability must be within [0, 1]".to_string(),
            ));
        }
        if self.min_amount_btc >= self.max_amount_btc {
            return Err(ConfigError::ValidationError(
                "simulator.min_amount_btc must be less than max_amount_btc".to_string(),
            ));
        }
        if self.tape_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "simulator.tape_capacity must be greater than zero".to_string(),
            ));
        }
        if self.exchanges.is_empty() {
            return Err(ConfigError::ValidationError(
                "simulator.exchanges must list at least one venue".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Capacity of the dashboard event broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_event_buffer() -> usize {
    256
}

/// Settings for the hosted language model that writes TA summaries.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_version: String,
    pub model: String,
    pub max_tokens: u32,
    /// Usually supplied through `BTCBATTLE__LLM__API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    pub default_timeframe: Timeframe,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            api_version: "2023-06-01".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 500,
            api_key: None,
            default_timeframe: Timeframe::Daily,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "btc-battle.log".to_string(),
        }
    }
}
