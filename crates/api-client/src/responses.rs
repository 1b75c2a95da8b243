use crate::error::ApiError;
use chrono::{DateTime, Duration, Utc};
use core_types::{
    BtcQuote, Cast, CastFeed, CastSource, DominanceSnapshot, FearGreed, NewsItem, Sentiment,
};
use rust_decimal::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;

/// Headlines kept from a single news fetch.
pub const MAX_NEWS_ITEMS: usize = 10;

const STABLECOINS: [&str; 3] = ["usdt", "usdc", "dai"];

/// Messages requested per account from `castsByFid`.
pub const HUB_PAGE_SIZE: &str = "3";
/// Of those, only the newest two are considered.
pub const CASTS_PER_ACCOUNT: usize = 2;
/// Casts this short or shorter are dropped.
pub const MIN_CAST_CHARS: usize = 20;
pub const MAX_CAST_CHARS: usize = 280;
pub const MAX_CASTS: usize = 12;

/// Hub timestamps count seconds from 2021-01-01T00:00:00Z.
const FARCASTER_EPOCH: i64 = 1_609_459_200;
const USERNAME_TYPE: &str = "USER_DATA_TYPE_USERNAME";
const PFP_TYPE: &str = "USER_DATA_TYPE_PFP";

// --- CoinGecko `simple/price` ---

/// The response from `GET /simple/price?ids=bitcoin&vs_currencies=usd&...`.
#[derive(Debug, Clone, Deserialize)]
pub struct SimplePriceResponse {
    pub bitcoin: Option<CoinPrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinPrice {
    pub usd: f64,
    #[serde(default)]
    pub usd_24h_change: Option<f64>,
    #[serde(default)]
    pub usd_24h_vol: Option<f64>,
    #[serde(default)]
    pub usd_market_cap: Option<f64>,
}

// --- CoinGecko `global` ---

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalResponse {
    pub data: GlobalData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalData {
    /// Keyed by lowercase ticker, values in percent.
    pub market_cap_percentage: HashMap<String, f64>,
}

// --- alternative.me fear & greed ---

#[derive(Debug, Clone, Deserialize)]
pub struct FearGreedResponse {
    pub data: Vec<FearGreedEntry>,
}

/// The index value comes as a string, e.g. `"72"`.
#[derive(Debug, Clone, Deserialize)]
pub struct FearGreedEntry {
    pub value: String,
    pub value_classification: String,
}

// --- CryptoPanic posts ---

#[derive(Debug, Clone, Deserialize)]
pub struct NewsResponse {
    pub results: Vec<NewsPost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsPost {
    pub id: Option<serde_json::Value>,
    pub title: String,
    #[serde(default)]
    pub source: Option<NewsSource>,
    #[serde(default)]
    pub votes: Option<NewsVotes>,
    #[serde(default)]
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsSource {
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsVotes {
    #[serde(default)]
    pub positive: u32,
    #[serde(default)]
    pub negative: u32,
}

// --- Messages API ---

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: Option<String>,
}

// --- Farcaster hub `userDataByFid` / `castsByFid` ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HubMessagesResponse {
    #[serde(default)]
    pub messages: Vec<HubMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubMessage {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub data: Option<HubMessageData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubMessageData {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub user_data_body: Option<UserDataBody>,
    #[serde(default)]
    pub cast_add_body: Option<CastAddBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDataBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastAddBody {
    #[serde(default)]
    pub text: Option<String>,
    /// Present only on replies.
    #[serde(default)]
    pub parent_cast_id: Option<serde_json::Value>,
}

/// The display name and picture of a featured account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorProfile {
    pub username: String,
    pub pfp_url: String,
}

impl AuthorProfile {
    pub fn named(username: &str) -> Self {
        Self {
            username: username.to_string(),
            pfp_url: String::new(),
        }
    }
}

/// The raw casts fetched for one account.
#[derive(Debug, Clone)]
pub struct AccountCasts {
    pub fid: u64,
    pub author: AuthorProfile,
    pub casts: HubMessagesResponse,
}

// --- Conversions ---

/// Converts the CoinGecko price entry into a quote rounded to whole dollars.
pub fn parse_quote(response: SimplePriceResponse) -> Result<BtcQuote, ApiError> {
    let coin = response
        .bitcoin
        .ok_or_else(|| ApiError::InvalidData("price response has no bitcoin entry".to_string()))?;

    let price = Decimal::from_f64(coin.usd)
        .ok_or_else(|| ApiError::InvalidData(format!("unrepresentable price: {}", coin.usd)))?
        .round();

    Ok(BtcQuote {
        price,
        change_24h_pct: coin.usd_24h_change.unwrap_or(0.0),
        volume_24h: coin.usd_24h_vol.and_then(Decimal::from_f64),
        market_cap: coin.usd_market_cap.and_then(Decimal::from_f64),
    })
}

/// Shares are rounded to one decimal, like the dashboard displays them.
pub fn parse_dominance(response: GlobalResponse) -> Result<DominanceSnapshot, ApiError> {
    let shares = response.data.market_cap_percentage;
    let btc = shares
        .get("btc")
        .copied()
        .ok_or_else(|| ApiError::InvalidData("global response has no btc share".to_string()))?;
    let eth = shares.get("eth").copied().unwrap_or(0.0);
    let stable: f64 = STABLECOINS.iter().filter_map(|s| shares.get(*s)).sum();

    Ok(DominanceSnapshot::from_shares(
        round_tenth(btc),
        round_tenth(eth),
        round_tenth(stable),
    ))
}

pub fn parse_fear_greed(response: FearGreedResponse) -> Result<FearGreed, ApiError> {
    let entry = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::InvalidData("fear & greed response is empty".to_string()))?;

    let value = entry
        .value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| ApiError::InvalidData(format!("fear & greed value out of range: {}", entry.value)))?;

    Ok(FearGreed {
        value,
        classification: entry.value_classification,
    })
}

/// Keeps the first ten headlines and classifies each one from its votes.
pub fn parse_news(response: NewsResponse) -> Vec<NewsItem> {
    response
        .results
        .into_iter()
        .take(MAX_NEWS_ITEMS)
        .enumerate()
        .map(|(index, post)| {
            let votes = post.votes.unwrap_or_default();
            let id = match post.id {
                Some(serde_json::Value::String(s)) => s,
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => format!("{}-{}", post.published_at.timestamp(), index),
            };

            NewsItem {
                id,
                title: post.title,
                source: post
                    .source
                    .map(|s| s.title)
                    .unwrap_or_else(|| "Unknown".to_string()),
                sentiment: Sentiment::from_votes(votes.positive, votes.negative),
                url: post.url.unwrap_or_else(|| "#".to_string()),
                published_at: post.published_at,
            }
        })
        .collect()
}

pub const FALLBACK_SUMMARY: &str = "Unable to generate summary";

/// The text of the first content block, if the model produced one.
pub fn parse_summary(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SUMMARY.to_string())
}

/// Picks the username and picture out of an account's user data messages.
/// Later messages win; missing values keep the fallback name and an empty picture.
pub fn parse_user_data(response: HubMessagesResponse, fallback_name: &str) -> AuthorProfile {
    let mut profile = AuthorProfile::named(fallback_name);
    let bodies = response
        .messages
        .into_iter()
        .filter_map(|m| m.data.and_then(|d| d.user_data_body));

    for body in bodies {
        let Some(value) = body.value.filter(|v| !v.is_empty()) else {
            continue;
        };
        match body.kind.as_str() {
            USERNAME_TYPE => profile.username = value,
            PFP_TYPE => profile.pfp_url = value,
            _ => {}
        }
    }
    profile
}

/// Merges the casts of every account into the feed.
///
/// Only the newest two messages of each account are considered. Replies and
/// casts of 20 characters or fewer are dropped, and text is cut to 280
/// characters. The result is sorted newest first and capped at 12. When no
/// account produced a cast, the curated fallback is returned instead.
pub fn parse_casts(accounts: Vec<AccountCasts>, now: DateTime<Utc>) -> CastFeed {
    let mut casts: Vec<Cast> = accounts
        .into_iter()
        .flat_map(|account| {
            let AccountCasts { fid, author, casts } = account;
            casts
                .messages
                .into_iter()
                .take(CASTS_PER_ACCOUNT)
                .enumerate()
                .filter_map(move |(index, message)| {
                    let data = message.data?;
                    let body = data.cast_add_body?;
                    if body.parent_cast_id.is_some() {
                        return None;
                    }
                    let text = body.text.filter(|t| t.chars().count() > MIN_CAST_CHARS)?;

                    Some(Cast {
                        id: message.hash.unwrap_or_else(|| format!("{}_{}", fid, index)),
                        author: author.username.clone(),
                        author_pfp: author.pfp_url.clone(),
                        text: text.chars().take(MAX_CAST_CHARS).collect(),
                        timestamp: data
                            .timestamp
                            .and_then(|t| DateTime::from_timestamp(FARCASTER_EPOCH + t, 0))
                            .unwrap_or(now),
                        likes: 0,
                        channel: "crypto".to_string(),
                    })
                })
        })
        .collect();

    if casts.is_empty() {
        return CastFeed {
            casts: fallback_casts(now),
            source: CastSource::Fallback,
        };
    }

    casts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    casts.truncate(MAX_CASTS);
    CastFeed {
        casts,
        source: CastSource::Live,
    }
}

/// Curated casts served while the hub is unreachable.
pub fn fallback_casts(now: DateTime<Utc>) -> Vec<Cast> {
    [
        ("dwr.eth", "Building the decentralized social network. Farcaster is growing every day. The future of social is onchain.", 30, 342, "farcaster"),
        ("vitalik.eth", "Excited about the progress on L2 scaling. Base and other rollups are shipping real solutions for users.", 60, 891, "ethereum"),
        ("jessepollak", "Base is for everyone. Keep building, keep shipping. The onchain economy is just getting started.", 90, 567, "base"),
        ("linda", "The best crypto products are the ones that make complex things simple. Focus on UX.", 120, 234, "crypto"),
        ("balajis.eth", "Bitcoin and crypto are not just about money. They are about building parallel systems and sovereign technology.", 150, 445, "bitcoin"),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (author, text, minutes_ago, likes, channel))| Cast {
        id: (index + 1).to_string(),
        author: author.to_string(),
        author_pfp: String::new(),
        text: text.to_string(),
        timestamp: now - Duration::minutes(minutes_ago),
        likes,
        channel: channel.to_string(),
    })
    .collect()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_quote() {
        let raw = r#"{"bitcoin":{"usd":98432.61,"usd_24h_change":-1.25,"usd_24h_vol":45600000000.0,"usd_market_cap":1934000000000.0}}"#;
        let quote = parse_quote(serde_json::from_str(raw).unwrap()).unwrap();

        assert_eq!(quote.price, dec!(98433));
        assert_eq!(quote.change_24h_pct, -1.25);
        assert_eq!(quote.volume_24h, Some(dec!(45600000000)));
        assert_eq!(quote.market_cap, Some(dec!(1934000000000)));
    }

    #[test]
    fn test_parse_quote_without_optional_fields() {
        let quote = parse_quote(serde_json::from_str(r#"{"bitcoin":{"usd":100000}}"#).unwrap()).unwrap();
        assert_eq!(quote.change_24h_pct, 0.0);
        assert!(quote.volume_24h.is_none());

        let missing = parse_quote(serde_json::from_str("{}").unwrap());
        assert!(matches!(missing, Err(ApiError::InvalidData(_))));
    }

    #[test]
    fn test_parse_dominance_sums_stablecoins() {
        let raw = r#"{"data":{"market_cap_percentage":{"btc":58.23,"eth":12.04,"usdt":4.81,"usdc":1.62,"sol":2.9}}}"#;
        let snapshot = parse_dominance(serde_json::from_str(raw).unwrap()).unwrap();

        assert_eq!(snapshot.btc_dominance_pct, 58.2);
        assert!((snapshot.others_dominance_pct - 29.8).abs() < 1e-9);
        assert_eq!(snapshot.stablecoin_dominance_pct, 6.4);
    }

    #[test]
    fn test_parse_dominance_requires_btc() {
        let raw = r#"{"data":{"market_cap_percentage":{"eth":12.0}}}"#;
        assert!(parse_dominance(serde_json::from_str(raw).unwrap()).is_err());
    }

    #[test]
    fn test_parse_fear_greed() {
        let raw = r#"{"name":"Fear and Greed Index","data":[{"value":"72","value_classification":"Greed","timestamp":"1733097600"}]}"#;
        let fg = parse_fear_greed(serde_json::from_str(raw).unwrap()).unwrap();
        assert_eq!(fg.value, 72);
        assert_eq!(fg.classification, "Greed");

        let bad = r#"{"data":[{"value":"140","value_classification":"?"}]}"#;
        assert!(parse_fear_greed(serde_json::from_str(bad).unwrap()).is_err());
        assert!(parse_fear_greed(serde_json::from_str(r#"{"data":[]}"#).unwrap()).is_err());
    }

    #[test]
    fn test_parse_news_classifies_and_truncates() {
        let post = |id: u32, pos: u32, neg: u32| {
            format!(
                r#"{{"id":{},"title":"Headline {}","source":{{"title":"CoinDesk"}},"votes":{{"positive":{},"negative":{}}},"url":"https://example.com/{}","published_at":"2025-11-20T10:00:00Z"}}"#,
                id, id, pos, neg, id
            )
        };
        let mut posts: Vec<String> = (0..12).map(|i| post(i, 1, 1)).collect();
        posts[0] = post(0, 5, 1);
        posts[1] = post(1, 0, 3);
        posts.push(r#"{"title":"Anonymous","published_at":"2025-11-20T10:00:00Z"}"#.to_string());

        let raw = format!(r#"{{"results":[{}]}}"#, posts.join(","));
        let items = parse_news(serde_json::from_str(&raw).unwrap());

        assert_eq!(items.len(), MAX_NEWS_ITEMS);
        assert_eq!(items[0].id, "0");
        assert_eq!(items[0].sentiment, Sentiment::Bullish);
        assert_eq!(items[1].sentiment, Sentiment::Bearish);
        assert_eq!(items[2].sentiment, Sentiment::Neutral);
        assert_eq!(items[0].source, "CoinDesk");
    }

    #[test]
    fn test_parse_news_defaults() {
        let raw = r#"{"results":[{"title":"Anonymous","published_at":"2025-11-20T10:00:00Z"}]}"#;
        let items = parse_news(serde_json::from_str(raw).unwrap());
        assert_eq!(items[0].source, "Unknown");
        assert_eq!(items[0].url, "#");
        assert_eq!(items[0].sentiment, Sentiment::Neutral);
    }

    fn hub_cast(hash: &str, timestamp: i64, text: &str, reply: bool) -> String {
        let parent = if reply {
            r#","parentCastId":{"fid":2,"hash":"0xparent"}"#
        } else {
            ""
        };
        format!(
            r#"{{"hash":"{}","data":{{"type":"MESSAGE_TYPE_CAST_ADD","fid":3,"timestamp":{},"castAddBody":{{"text":"{}"{}}}}}}}"#,
            hash, timestamp, text, parent
        )
    }

    fn account(fid: u64, name: &str, messages: &[String]) -> AccountCasts {
        let raw = format!(r#"{{"messages":[{}]}}"#, messages.join(","));
        AccountCasts {
            fid,
            author: AuthorProfile::named(name),
            casts: serde_json::from_str(&raw).unwrap(),
        }
    }

    #[test]
    fn test_parse_user_data() {
        let raw = r#"{"messages":[
            {"data":{"userDataBody":{"type":"USER_DATA_TYPE_PFP","value":"https://img.example/dwr.png"}}},
            {"data":{"userDataBody":{"type":"USER_DATA_TYPE_BIO","value":"Working on Farcaster"}}},
            {"data":{"userDataBody":{"type":"USER_DATA_TYPE_USERNAME","value":"dwr"}}}
        ]}"#;
        let profile = parse_user_data(serde_json::from_str(raw).unwrap(), "dwr.eth");
        assert_eq!(profile.username, "dwr");
        assert_eq!(profile.pfp_url, "https://img.example/dwr.png");

        let empty = parse_user_data(serde_json::from_str(r#"{"messages":[]}"#).unwrap(), "dwr.eth");
        assert_eq!(empty, AuthorProfile::named("dwr.eth"));
    }

    #[test]
    fn test_parse_casts_filters_replies_and_short_text() {
        let now = Utc::now();
        let long = "Bitcoin just printed a higher low on the daily chart";
        let feed = parse_casts(
            vec![account(
                3,
                "dwr.eth",
                &[
                    hub_cast("0xa", 100, long, false),
                    hub_cast("0xb", 90, long, true),
                    // Third message is past the per-account window.
                    hub_cast("0xc", 80, long, false),
                ],
            ),
            account(99, "jessepollak", &[hub_cast("0xd", 120, "gm", false)])],
            now,
        );

        assert_eq!(feed.source, CastSource::Live);
        assert_eq!(feed.casts.len(), 1);
        let cast = &feed.casts[0];
        assert_eq!(cast.id, "0xa");
        assert_eq!(cast.author, "dwr.eth");
        assert_eq!(cast.likes, 0);
        assert_eq!(cast.timestamp.timestamp(), 1_609_459_300);
    }

    #[test]
    fn test_parse_casts_sorts_truncates_and_caps() {
        let long = "x".repeat(400);
        let accounts: Vec<AccountCasts> = (0..8)
            .map(|i| {
                account(
                    i,
                    "author",
                    &[
                        hub_cast(&format!("0x{}a", i), i as i64 * 10, &long, false),
                        hub_cast(&format!("0x{}b", i), i as i64 * 10 + 5, &long, false),
                    ],
                )
            })
            .collect();
        let feed = parse_casts(accounts, Utc::now());

        assert_eq!(feed.casts.len(), MAX_CASTS);
        assert_eq!(feed.casts[0].id, "0x7b");
        assert!(feed.casts.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(feed.casts.iter().all(|c| c.text.chars().count() == MAX_CAST_CHARS));
    }

    #[test]
    fn test_parse_casts_falls_back_when_nothing_fetched() {
        let now = Utc::now();
        let feed = parse_casts(vec![], now);

        assert_eq!(feed.source, CastSource::Fallback);
        assert_eq!(feed.casts.len(), 5);
        assert_eq!(feed.casts[0].author, "dwr.eth");
        assert_eq!(feed.casts[1].timestamp, now - Duration::minutes(60));
    }

    #[test]
    fn test_parse_summary() {
        let raw = r#"{"content":[{"type":"text","text":"BTC is consolidating."}]}"#;
        assert_eq!(parse_summary(serde_json::from_str(raw).unwrap()), "BTC is consolidating.");
        assert_eq!(parse_summary(serde_json::from_str(r#"{"content":[]}"#).unwrap()), FALLBACK_SUMMARY);
    }
}
