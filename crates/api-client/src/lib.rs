use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Utc;
use configuration::{FeaturedAccount, FeedsConfig};
use core_types::{BtcQuote, CastFeed, DominanceSnapshot, FearGreed, NewsItem};
use futures_util::future::join_all;
use responses::{AccountCasts, AuthorProfile, HubMessagesResponse};
use serde::de::DeserializeOwned;

pub mod error;
pub mod responses;
pub mod summary;
// --- Public API ---
pub use responses::{
    FearGreedResponse, GlobalResponse, MessagesResponse, NewsResponse, SimplePriceResponse,
};
pub use summary::{build_prompt, MarketContext, TaSummary, TaSummaryClient};

/// The abstract interface for the market data feeds behind the dashboard.
/// The dashboard only talks to this trait, so tests can swap in a mock.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches the BTC spot price and 24h change.
    async fn fetch_btc_quote(&self) -> Result<BtcQuote, ApiError>;

    /// Fetches BTC, others and stablecoin market cap shares.
    async fn fetch_dominance(&self) -> Result<DominanceSnapshot, ApiError>;

    async fn fetch_fear_greed(&self) -> Result<FearGreed, ApiError>;

    /// Fetches the latest BTC headlines, newest first.
    async fn fetch_news(&self) -> Result<Vec<NewsItem>, ApiError>;

    /// Fetches the latest casts of the featured accounts, or the curated
    /// fallback when none could be fetched.
    async fn fetch_casts(&self) -> Result<CastFeed, ApiError>;
}

/// A concrete `MarketDataClient` over the public CoinGecko, alternative.me,
/// CryptoPanic and Farcaster hub endpoints.
#[derive(Clone)]
pub struct PublicFeedClient {
    client: reqwest::Client,
    feeds: FeedsConfig,
}

impl PublicFeedClient {
    pub fn new(feeds: FeedsConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(feeds.request_timeout)
            .build()?;
        Ok(Self { client, feeds })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            tracing::debug!(url, status = status.as_u16(), "Upstream request failed.");
            Err(ApiError::Upstream {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    /// The profile and recent casts of one account. `None` if the casts are unavailable.
    async fn fetch_account_casts(&self, account: &FeaturedAccount) -> Option<AccountCasts> {
        let hub = &self.feeds.farcaster_hub_url;
        let fid = account.fid.to_string();

        let user_data_url = format!("{}/userDataByFid", hub);
        let author = match self
            .get_json::<HubMessagesResponse>(&user_data_url, &[("fid", fid.as_str())])
            .await
        {
            Ok(response) => responses::parse_user_data(response, &account.fallback_name),
            Err(e) => {
                tracing::debug!(fid = account.fid, error = %e, "No user data; using the fallback name.");
                AuthorProfile::named(&account.fallback_name)
            }
        };

        let query = [
            ("fid", fid.as_str()),
            ("pageSize", responses::HUB_PAGE_SIZE),
            ("reverse", "true"),
        ];
        match self.get_json(&format!("{}/castsByFid", hub), &query).await {
            Ok(casts) => Some(AccountCasts {
                fid: account.fid,
                author,
                casts,
            }),
            Err(e) => {
                tracing::debug!(fid = account.fid, error = %e, "Skipping account; casts unavailable.");
                None
            }
        }
    }
}

#[async_trait]
impl MarketDataClient for PublicFeedClient {
    async fn fetch_btc_quote(&self) -> Result<BtcQuote, ApiError> {
        let url = format!("{}/simple/price", self.feeds.coingecko_base_url);
        let response: SimplePriceResponse = self
            .get_json(
                &url,
                &[
                    ("ids", "bitcoin"),
                    ("vs_currencies", "usd"),
                    ("include_24hr_change", "true"),
                    ("include_24hr_vol", "true"),
                    ("include_market_cap", "true"),
                ],
            )
            .await?;
        responses::parse_quote(response)
    }

    async fn fetch_dominance(&self) -> Result<DominanceSnapshot, ApiError> {
        let url = format!("{}/global", self.feeds.coingecko_base_url);
        let response: GlobalResponse = self.get_json(&url, &[]).await?;
        responses::parse_dominance(response)
    }

    async fn fetch_fear_greed(&self) -> Result<FearGreed, ApiError> {
        let response: FearGreedResponse = self.get_json(&self.feeds.fear_greed_url, &[]).await?;
        responses::parse_fear_greed(response)
    }

    async fn fetch_news(&self) -> Result<Vec<NewsItem>, ApiError> {
        let mut query = vec![("currencies", "BTC"), ("kind", "news")];
        if let Some(token) = self.feeds.news_auth_token.as_deref() {
            query.push(("auth_token", token));
        }
        let response: NewsResponse = self.get_json(&self.feeds.news_url, &query).await?;
        Ok(responses::parse_news(response))
    }

    async fn fetch_casts(&self) -> Result<CastFeed, ApiError> {
        let accounts = join_all(
            self.feeds
                .featured_accounts
                .iter()
                .map(|account| self.fetch_account_casts(account)),
        )
        .await;

        let fetched: Vec<AccountCasts> = accounts.into_iter().flatten().collect();
        tracing::debug!(accounts = fetched.len(), "Fetched featured casts.");
        Ok(responses::parse_casts(fetched, Utc::now()))
    }
}
