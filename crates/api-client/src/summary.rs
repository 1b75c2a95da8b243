use crate::error::ApiError;
use crate::responses::{parse_summary, MessagesResponse};
use configuration::LlmConfig;
use core_types::{FearGreed, Timeframe};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The market readings quoted in the analysis prompt.
///
/// Every field is optional; missing values are rendered as `N/A`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub price: Option<Decimal>,
    pub change_24h_pct: Option<f64>,
    pub rsi: Option<f64>,
    pub fear_greed: Option<FearGreed>,
    pub btc_dominance_pct: Option<f64>,
    pub stablecoin_dominance_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaSummary {
    pub summary: String,
    pub timeframe: Timeframe,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [PromptMessage<'a>; 1],
}

#[derive(Serialize)]
struct PromptMessage<'a> {
    role: &'a str,
    content: &'a str,
}

fn describe(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::FourHour => "4-hour (short-term, intraday moves)",
        Timeframe::Daily => "daily (swing trading perspective)",
        Timeframe::Weekly => "weekly/monthly (macro trend, big picture)",
    }
}

fn sentence_range(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::FourHour => "3-4",
        Timeframe::Daily => "4-5",
        Timeframe::Weekly => "5-6",
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Builds the analyst prompt for `timeframe`.
pub fn build_prompt(timeframe: Timeframe, market: &MarketContext) -> String {
    let (fg_value, fg_text) = match &market.fear_greed {
        Some(fg) => (fg.value.to_string(), fg.classification.clone()),
        None => ("N/A".to_string(), "N/A".to_string()),
    };

    format!(
        "You are a professional Bitcoin technical analyst. Generate a concise, actionable TA summary for the {} timeframe.\n\
         \n\
         Current Market Data:\n\
         - Price: ${}\n\
         - 24h Change: {}%\n\
         - RSI: {}\n\
         - Fear & Greed Index: {} ({})\n\
         - BTC Dominance: {}%\n\
         - USDT Dominance: {}%\n\
         \n\
         Provide a {} sentence summary that includes:\n\
         1. Current trend assessment\n\
         2. Key support/resistance levels to watch\n\
         3. What the indicators suggest\n\
         4. A brief actionable outlook (bullish/bearish/neutral bias)\n\
         \n\
         Keep it professional but accessible. No fluff - traders want quick, useful insights.\n\
         Do NOT use markdown formatting, asterisks, or bullet points. Write in plain prose paragraphs.",
        describe(timeframe),
        or_na(market.price.map(|p| p.round())),
        or_na(market.change_24h_pct.map(|c| format!("{:.2}", c))),
        or_na(market.rsi.map(|r| format!("{:.0}", r))),
        fg_value,
        fg_text,
        or_na(market.btc_dominance_pct),
        or_na(market.stablecoin_dominance_pct),
        sentence_range(timeframe),
    )
}

/// Asks a hosted language model for a short technical analysis write-up.
#[derive(Clone)]
pub struct TaSummaryClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl TaSummaryClient {
    /// Fails with `NotConfigured` when no API key is set.
    pub fn new(config: LlmConfig, timeout: Duration) -> Result<Self, ApiError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ApiError::NotConfigured("language model API key".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| ApiError::InvalidData(format!("API key is not a valid header: {}", e)))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| ApiError::InvalidData(format!("API version is not a valid header: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn default_timeframe(&self) -> Timeframe {
        self.config.default_timeframe
    }

    pub async fn summarize(
        &self,
        timeframe: Timeframe,
        market: &MarketContext,
    ) -> Result<TaSummary, ApiError> {
        let prompt = build_prompt(timeframe, market);
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: [PromptMessage {
                role: "user",
                content: &prompt,
            }],
        };

        tracing::debug!(timeframe = timeframe.as_str(), model = %self.config.model, "Requesting TA summary.");
        let response = self.client.post(&self.config.api_url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Language model API error.");
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;

        Ok(TaSummary {
            summary: parse_summary(parsed),
            timeframe,
        })
    }
}
