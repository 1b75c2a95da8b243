//! # Dashboard
//!
//! The live orchestrator. It owns the shared `DashboardState`, refreshes it from
//! the upstream feeds and the simulator on independent cadences, re-derives the
//! composite scores after every change and broadcasts each change as a
//! `DashboardEvent`.
//!
//! Readers (the web server, the `watch` command) never touch the poller directly;
//! they hold a cheap, cloneable `DashboardHandle`.

use crate::error::DashboardError;
use api_client::{MarketContext, MarketDataClient};
use chrono::Utc;
use configuration::{Config, PollingConfig};
use core_types::{AltseasonResult, BattleResult, CastFeed, CastSource, MarketSnapshot, NewsItem};
use events::{AltseasonUpdate, BattleUpdate, DashboardEvent, LogLevel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scoring::AltseasonCalculator;
use simulator::{MarketDrift, WhaleAlertSource};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, MissedTickBehavior};

pub mod error;
pub mod state;

pub use state::{DashboardSnapshot, DashboardState, INITIAL_TUG};

/// A read-only view of the dashboard that can be shared across tasks.
#[derive(Clone)]
pub struct DashboardHandle {
    state: Arc<RwLock<DashboardState>>,
    events: broadcast::Sender<DashboardEvent>,
}

impl DashboardHandle {
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.state.read().await.snapshot()
    }

    /// The current battle and the inputs it was scored from, read under one lock.
    pub async fn battle_with_inputs(&self) -> (BattleResult, MarketSnapshot) {
        let state = self.state.read().await;
        (state.battle, state.market_snapshot())
    }

    pub async fn battle(&self) -> BattleResult {
        self.state.read().await.battle
    }

    pub async fn altseason(&self) -> AltseasonResult {
        self.state.read().await.altseason.clone()
    }

    pub async fn news(&self) -> Vec<NewsItem> {
        self.state.read().await.news.clone()
    }

    pub async fn casts(&self) -> CastFeed {
        self.state.read().await.casts.clone()
    }

    pub async fn market_context(&self) -> MarketContext {
        self.state.read().await.market_context()
    }

    /// Every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }
}

/// The polling orchestrator behind the dashboard.
pub struct Dashboard {
    state: Arc<RwLock<DashboardState>>,
    events: broadcast::Sender<DashboardEvent>,
    client: Arc<dyn MarketDataClient>,
    whales: Box<dyn WhaleAlertSource>,
    drift: MarketDrift,
    rng: StdRng,
    calculator: AltseasonCalculator,
    polling: PollingConfig,
}

impl Dashboard {
    /// Builds the dashboard with default readings and a seeded whale tape.
    pub fn new(
        config: &Config,
        client: Arc<dyn MarketDataClient>,
        mut whales: Box<dyn WhaleAlertSource>,
    ) -> Result<Self, DashboardError> {
        let calculator = AltseasonCalculator::new(config.altseason.clone())?;

        let mut state = DashboardState::new(config.simulator.tape_capacity);
        let price = state.quote.price;
        state
            .whales
            .seed(whales.as_mut(), config.simulator.initial_alerts, price);
        state.recompute_battle();
        state.recompute_altseason(&calculator, Utc::now());

        // The drift gets its own stream so a seeded tape stays reproducible.
        let rng = match config.simulator.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        let (events, _) = broadcast::channel(config.server.event_buffer.max(1));

        tracing::info!(
            whales = state.whales.len(),
            tug = state.battle.tug_position,
            "Dashboard initialized."
        );

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            events,
            client,
            whales,
            drift: MarketDrift::default(),
            rng,
            calculator,
            polling: config.polling.clone(),
        })
    }

    pub fn handle(&self) -> DashboardHandle {
        DashboardHandle {
            state: Arc::clone(&self.state),
            events: self.events.clone(),
        }
    }

    /// Runs every cadence until `shutdown` resolves.
    ///
    /// Each interval fires immediately on start, so the first pass fetches all feeds.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<(), DashboardError> {
        let mut price_tick = interval(self.polling.price_tick);
        let mut whale_poll = interval(self.polling.whale_poll);
        let mut market_refresh = interval(self.polling.market_refresh);
        let mut fear_greed_refresh = interval(self.polling.fear_greed_refresh);
        let mut news_refresh = interval(self.polling.news_refresh);
        let mut social_refresh = interval(self.polling.social_refresh);
        for timer in [
            &mut price_tick,
            &mut whale_poll,
            &mut market_refresh,
            &mut fear_greed_refresh,
            &mut news_refresh,
            &mut social_refresh,
        ] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        tokio::pin!(shutdown);
        tracing::info!("Dashboard poller running.");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = market_refresh.tick() => self.refresh_market().await,
                _ = fear_greed_refresh.tick() => self.refresh_fear_greed().await,
                _ = news_refresh.tick() => self.refresh_news().await,
                _ = social_refresh.tick() => self.refresh_social().await,
                _ = price_tick.tick() => self.tick_price().await,
                _ = whale_poll.tick() => self.poll_whales().await,
            }
        }

        tracing::info!("Dashboard poller stopped.");
        Ok(())
    }

    /// Moves the simulated price and indicators by one step.
    pub async fn tick_price(&mut self) {
        let mut state = self.state.write().await;
        let mut drift = state.drift_state();
        let movement = self.drift.step(&mut self.rng, &mut drift);
        state.apply_drift(drift, movement);
        let battle = state.recompute_battle();
        let tick = state.market_tick();
        drop(state);

        self.publish(DashboardEvent::Quote(tick));
        self.publish_battle(battle);
    }

    /// Asks the whale source for a new alert and rescores the battle if one arrived.
    pub async fn poll_whales(&mut self) {
        let mut state = self.state.write().await;
        let Some(alert) = self.whales.poll(state.quote.price) else {
            return;
        };

        tracing::debug!(side = %alert.side, amount = alert.amount_btc, exchange = %alert.exchange, "Whale alert.");
        state.whales.push(alert.clone());
        let battle = state.recompute_battle();
        drop(state);

        self.publish(DashboardEvent::Whale(alert));
        self.publish_battle(battle);
    }

    /// Refreshes the quote and market dominance, then both scores.
    pub async fn refresh_market(&self) {
        let (quote, dominance) =
            tokio::join!(self.client.fetch_btc_quote(), self.client.fetch_dominance());

        let mut state = self.state.write().await;
        match quote {
            Ok(quote) => state.quote = quote,
            Err(e) => self.feed_failed("price", &DashboardError::from(e)),
        }
        match dominance {
            Ok(dominance) => state.dominance = Some(dominance),
            Err(e) => self.feed_failed("dominance", &DashboardError::from(e)),
        }

        let battle = state.recompute_battle();
        let altseason = state.recompute_altseason(&self.calculator, Utc::now()).clone();
        let days_remaining = state.days_remaining;
        let tick = state.market_tick();
        drop(state);

        self.publish(DashboardEvent::Quote(tick));
        self.publish_battle(battle);
        self.publish(DashboardEvent::Altseason(AltseasonUpdate {
            timestamp: Utc::now(),
            result: altseason,
            days_remaining,
        }));
    }

    pub async fn refresh_fear_greed(&self) {
        match self.client.fetch_fear_greed().await {
            Ok(fear_greed) => {
                let mut state = self.state.write().await;
                state.fear_greed = fear_greed;
                let battle = state.recompute_battle();
                let tick = state.market_tick();
                drop(state);

                self.publish(DashboardEvent::Quote(tick));
                self.publish_battle(battle);
            }
            Err(e) => self.feed_failed("fear & greed", &e.into()),
        }
    }

    /// Replaces the headlines. A failed or empty fetch keeps the previous list.
    pub async fn refresh_news(&self) {
        match self.client.fetch_news().await {
            Ok(news) if news.is_empty() => {
                tracing::debug!("News feed returned no headlines; keeping the previous list.");
            }
            Ok(news) => {
                self.state.write().await.news = news.clone();
                self.publish(DashboardEvent::News(news));
            }
            Err(e) => self.feed_failed("news", &e.into()),
        }
    }

    /// Replaces the social feed. Curated fallback casts never replace live ones.
    pub async fn refresh_social(&self) {
        let feed = match self.client.fetch_casts().await {
            Ok(feed) => feed,
            Err(e) => return self.feed_failed("social", &e.into()),
        };

        let mut state = self.state.write().await;
        if feed.source == CastSource::Fallback && state.casts.source == CastSource::Live {
            drop(state);
            tracing::info!("Farcaster hub unreachable; keeping the last live casts.");
            self.publish(DashboardEvent::log(
                LogLevel::Info,
                "social feed unreachable; keeping the last live casts",
            ));
            return;
        }
        state.casts = feed.clone();
        drop(state);

        self.publish(DashboardEvent::Casts(feed));
    }

    fn feed_failed(&self, feed: &str, error: &DashboardError) {
        tracing::warn!(feed, error = %error, "Feed refresh failed; keeping previous values.");
        self.publish(DashboardEvent::log(
            LogLevel::Warn,
            format!("{} feed unavailable: {}", feed, error),
        ));
    }

    fn publish_battle(&self, result: BattleResult) {
        self.publish(DashboardEvent::Battle(BattleUpdate {
            timestamp: Utc::now(),
            result,
        }));
    }

    fn publish(&self, event: DashboardEvent) {
        // An error only means nobody is subscribed right now.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use async_trait::async_trait;
    use core_types::{
        BtcQuote, Cast, DominanceSnapshot, FearGreed, Sentiment, WhaleAlert, WhaleSide,
    };
    use scoring::compute_battle;
    use rust_decimal_macros::dec;
    use simulator::ScriptedWhaleSource;
    use std::time::Duration;

    const CONFIG: &str = r#"
        [altseason]
        target_date = "2099-01-01"
        critical_low = 104000
        critical_high = 105000
        bull_confirmation = 116000
        breakdown = 88000

        [feeds]
        coingecko_base_url = "http://localhost"
        fear_greed_url = "http://localhost/fng"
        news_url = "http://localhost/news"
        request_timeout = "1s"

        [polling]
        price_tick = "10ms"
        whale_poll = "10ms"
        market_refresh = "20ms"
        fear_greed_refresh = "20ms"
        news_refresh = "20ms"

        [simulator]
        emit_probability = 0.4
        min_amount_btc = 100
        max_amount_btc = 2100
        tape_capacity = 15
        initial_alerts = 2
        exchanges = ["Coinbase"]
        seed = 11

        [server]
        host = "127.0.0.1"
        port = 0
    "#;

    /// Returns fixed readings, or fails every call. The social feed never
    /// fails; it falls back to curated casts like the real hub client.
    struct MockFeeds {
        fail: bool,
    }

    impl MockFeeds {
        fn check(&self) -> Result<(), ApiError> {
            if self.fail {
                Err(ApiError::Upstream {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl MarketDataClient for MockFeeds {
        async fn fetch_btc_quote(&self) -> Result<BtcQuote, ApiError> {
            self.check()?;
            Ok(BtcQuote {
                price: dec!(120000),
                change_24h_pct: -3.0,
                volume_24h: Some(dec!(45600000000)),
                market_cap: None,
            })
        }

        async fn fetch_dominance(&self) -> Result<DominanceSnapshot, ApiError> {
            self.check()?;
            Ok(DominanceSnapshot::from_shares(50.0, 10.0, 5.0))
        }

        async fn fetch_fear_greed(&self) -> Result<FearGreed, ApiError> {
            self.check()?;
            Ok(FearGreed {
                value: 20,
                classification: "Extreme Fear".to_string(),
            })
        }

        async fn fetch_news(&self) -> Result<Vec<NewsItem>, ApiError> {
            self.check()?;
            Ok(vec![NewsItem {
                id: "1".to_string(),
                title: "Bitcoin ETF inflows surge".to_string(),
                source: "CoinDesk".to_string(),
                sentiment: Sentiment::Bullish,
                url: "#".to_string(),
                published_at: Utc::now(),
            }])
        }

        async fn fetch_casts(&self) -> Result<CastFeed, ApiError> {
            if self.fail {
                return Ok(CastFeed {
                    casts: api_client::responses::fallback_casts(Utc::now()),
                    source: CastSource::Fallback,
                });
            }
            Ok(CastFeed {
                casts: vec![Cast {
                    id: "0xabc".to_string(),
                    author: "jessepollak".to_string(),
                    author_pfp: String::new(),
                    text: "Onchain summer never really ended on Base".to_string(),
                    timestamp: Utc::now(),
                    likes: 0,
                    channel: "crypto".to_string(),
                }],
                source: CastSource::Live,
            })
        }
    }

    fn dashboard(fail: bool, alerts: Vec<WhaleAlert>) -> Dashboard {
        let config = configuration::load_config_from_str(CONFIG).unwrap();
        Dashboard::new(
            &config,
            Arc::new(MockFeeds { fail }),
            Box::new(ScriptedWhaleSource::new(alerts)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_new_seeds_tape_and_scores() {
        let dashboard = dashboard(
            false,
            vec![
                WhaleAlert::new(WhaleSide::Buy, 500.0),
                WhaleAlert::new(WhaleSide::Sell, 1000.0),
                WhaleAlert::new(WhaleSide::Buy, 2000.0),
            ],
        );
        let snapshot = dashboard.handle().snapshot().await;

        // Only `initial_alerts` are drawn up front, most recent first.
        assert_eq!(snapshot.whales.len(), 2);
        assert_eq!(snapshot.whales[0].side, WhaleSide::Sell);
        assert!(snapshot.battle.bull_power > 0.0);
        assert_eq!(snapshot.altseason.score, 50);
        assert_eq!(snapshot.price, dec!(98432));
    }

    #[tokio::test]
    async fn test_refresh_market_updates_scores_and_publishes() {
        let dashboard = dashboard(false, vec![]);
        let handle = dashboard.handle();
        let mut rx = handle.subscribe();

        dashboard.refresh_market().await;

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.price, dec!(120000));
        assert_eq!(snapshot.others_dominance_pct, Some(40.0));
        assert_eq!(snapshot.altseason.signals.len(), 5);
        // Everything but the distant target date scores in full.
        assert_eq!(snapshot.altseason.score, 90);

        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Quote(_)));
        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Battle(_)));
        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Altseason(_)));
    }

    #[tokio::test]
    async fn test_failed_feeds_keep_previous_values() {
        let dashboard = dashboard(true, vec![]);
        let handle = dashboard.handle();
        let mut rx = handle.subscribe();

        dashboard.refresh_market().await;
        dashboard.refresh_fear_greed().await;
        dashboard.refresh_news().await;

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.price, dec!(98432));
        assert_eq!(snapshot.fear_greed.value, 72);
        assert!(snapshot.news.is_empty());
        assert_eq!(snapshot.altseason.signals, vec!["Loading data...".to_string()]);

        match rx.recv().await.unwrap() {
            DashboardEvent::Log(log) => {
                assert_eq!(log.level, LogLevel::Warn);
                assert!(log.message.starts_with("price feed unavailable"));
            }
            other => panic!("expected a log event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fear_greed_refresh_moves_the_battle() {
        let dashboard = dashboard(false, vec![]);
        let handle = dashboard.handle();
        let before = handle.battle().await;

        dashboard.refresh_fear_greed().await;

        let after = handle.battle().await;
        assert_eq!(handle.snapshot().await.fear_greed.value, 20);
        assert!(after.tug_position > before.tug_position);
    }

    #[tokio::test]
    async fn test_poll_whales_pushes_to_front() {
        // The first two alerts seed the tape, the third arrives on the poll.
        let mut dashboard = dashboard(
            false,
            vec![
                WhaleAlert::new(WhaleSide::Buy, 100.0),
                WhaleAlert::new(WhaleSide::Buy, 200.0),
                WhaleAlert::new(WhaleSide::Sell, 1500.0),
            ],
        );
        let handle = dashboard.handle();
        let mut rx = handle.subscribe();

        dashboard.poll_whales().await;

        let whales = handle.snapshot().await.whales;
        assert_eq!(whales.len(), 3);
        assert_eq!(whales[0].side, WhaleSide::Sell);
        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Whale(_)));
        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Battle(_)));

        // An exhausted source leaves the tape alone.
        dashboard.poll_whales().await;
        assert_eq!(handle.snapshot().await.whales.len(), 3);
    }

    #[tokio::test]
    async fn test_battle_with_inputs_is_consistent() {
        let mut dashboard = dashboard(
            false,
            vec![
                WhaleAlert::new(WhaleSide::Buy, 100.0),
                WhaleAlert::new(WhaleSide::Buy, 200.0),
                WhaleAlert::new(WhaleSide::Sell, 1500.0),
            ],
        );
        let handle = dashboard.handle();
        dashboard.poll_whales().await;
        dashboard.tick_price().await;

        let (battle, inputs) = handle.battle_with_inputs().await;
        let rescored = compute_battle(&inputs, battle.tug_position);
        assert_eq!(inputs.recent_whale_alerts.len(), 3);
        assert_eq!(rescored.bull_power, battle.bull_power);
        assert_eq!(rescored.bear_power, battle.bear_power);
    }

    #[tokio::test]
    async fn test_refresh_social_replaces_curated_casts() {
        let dashboard = dashboard(false, vec![]);
        let handle = dashboard.handle();
        let mut rx = handle.subscribe();
        assert_eq!(handle.casts().await.source, CastSource::Fallback);

        dashboard.refresh_social().await;

        let feed = handle.casts().await;
        assert_eq!(feed.source, CastSource::Live);
        assert_eq!(feed.casts[0].author, "jessepollak");
        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Casts(_)));
    }

    #[tokio::test]
    async fn test_refresh_social_keeps_live_casts_over_fallback() {
        let dashboard = dashboard(true, vec![]);
        let handle = dashboard.handle();
        let live = CastFeed {
            casts: vec![],
            source: CastSource::Live,
        };
        dashboard.state.write().await.casts = live.clone();
        let mut rx = handle.subscribe();

        dashboard.refresh_social().await;

        assert_eq!(handle.casts().await, live);
        match rx.recv().await.unwrap() {
            DashboardEvent::Log(log) => assert_eq!(log.level, LogLevel::Info),
            other => panic!("expected a log event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tick_price_drifts_within_step() {
        let mut dashboard = dashboard(false, vec![]);
        let handle = dashboard.handle();

        for _ in 0..50 {
            let before = handle.snapshot().await.price;
            dashboard.tick_price().await;
            let after = handle.snapshot().await.price;
            assert!((after - before).abs() <= dec!(40));
        }
    }

    #[tokio::test]
    async fn test_run_refreshes_until_shutdown() {
        let dashboard = dashboard(false, vec![]);
        let handle = dashboard.handle();

        dashboard
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.news.len(), 1);
        assert_eq!(snapshot.fear_greed.classification, "Extreme Fear");
        assert_eq!(snapshot.altseason.signals.len(), 5);
        assert_eq!(handle.casts().await.source, CastSource::Live);
    }
}
