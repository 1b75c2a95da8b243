use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AltseasonParams, Config, FeaturedAccount, FeedsConfig, LlmConfig, LoggingConfig,
    PollingConfig, ServerConfig, SimulatorConfig,
};

/// The prefix for environment overrides, e.g. `BTCBATTLE__LLM__API_KEY`.
const ENV_PREFIX: &str = "BTCBATTLE";

/// Command-line flags shared by every subcommand of the binary.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    pub config: std::path::PathBuf,
}

/// Loads the application configuration from the given TOML file.
///
/// Values from the file can be overridden with `BTCBATTLE__<SECTION>__<KEY>`
/// environment variables. The result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    finish(builder)
}

/// Parses a configuration from an in-memory TOML document.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    tracing::debug!(target_date = %config.altseason.target_date, "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Timeframe;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const SAMPLE: &str = r#"
        [altseason]
        target_date = "2025-12-15"
        critical_low = 104000
        critical_high = 105000
        bull_confirmation = 116000
        breakdown = 88000

        [feeds]
        coingecko_base_url = "https://api.coingecko.com/api/v3"
        fear_greed_url = "https://api.alternative.me/fng/"
        news_url = "https://cryptopanic.com/api/free/v1/posts/"
        request_timeout = "10s"

        [polling]
        price_tick = "2s"
        whale_poll = "4s"
        market_refresh = "30s"
        fear_greed_refresh = "5m"
        news_refresh = "2m"

        [simulator]
        emit_probability = 0.4
        min_amount_btc = 100
        max_amount_btc = 2100
        tape_capacity = 15
        initial_alerts = 4
        exchanges = ["Coinbase", "Binance"]

        [server]
        host = "127.0.0.1"
        port = 3000
    "#;

    #[test]
    fn test_load_sample_config() {
        let config = load_config_from_str(SAMPLE).unwrap();

        assert_eq!(config.altseason.critical_low, dec!(104000));
        assert_eq!(config.altseason.breakdown, dec!(88000));
        assert_eq!(config.polling.fear_greed_refresh, Duration::from_secs(300));
        assert_eq!(config.polling.news_refresh, Duration::from_secs(120));
        assert_eq!(config.simulator.seed, None);
        assert_eq!(config.server.event_buffer, 256);
        // Sections with defaults may be omitted entirely.
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.llm.default_timeframe, Timeframe::Daily);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_social_feed_defaults() {
        let config = load_config_from_str(SAMPLE).unwrap();

        assert_eq!(config.feeds.farcaster_hub_url, "https://hub.pinata.cloud/v1");
        assert_eq!(config.feeds.featured_accounts.len(), 15);
        assert_eq!(config.feeds.featured_accounts[0].fid, 3);
        assert_eq!(config.feeds.featured_accounts[0].fallback_name, "dwr.eth");
        assert_eq!(config.polling.social_refresh, Duration::from_secs(60));
    }

    #[test]
    fn test_featured_accounts_override() {
        let custom = SAMPLE.replace(
            "request_timeout = \"10s\"",
            "request_timeout = \"10s\"\nfeatured_accounts = [{ fid = 99, fallback_name = \"jessepollak\" }]",
        );
        let config = load_config_from_str(&custom).unwrap();

        assert_eq!(
            config.feeds.featured_accounts,
            vec![FeaturedAccount {
                fid: 99,
                fallback_name: "jessepollak".to_string()
            }]
        );
    }

    #[test]
    fn test_rejects_unordered_price_levels() {
        let broken = SAMPLE.replace("breakdown = 88000", "breakdown = 110000");
        let err = load_config_from_str(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let broken = SAMPLE.replace("whale_poll = \"4s\"", "whale_poll = \"0s\"");
        let err = load_config_from_str(&broken).unwrap_err();
        assert!(err.to_string().contains("whale_poll"));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let broken = SAMPLE.replace("emit_probability = 0.4", "emit_probability = 1.5");
        assert!(load_config_from_str(&broken).is_err());
    }

    #[test]
    fn test_default_altseason_params_are_valid() {
        let params = AltseasonParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.critical_high, dec!(105000));
        assert_eq!(params.bull_confirmation, dec!(116000));
    }
}
