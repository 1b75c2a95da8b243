use crate::{error::AppError, AppState};
use api_client::{MarketContext, TaSummary};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use core_types::{BattleResult, CastFeed, NewsItem, Timeframe};
use dashboard::DashboardSnapshot;
use events::DashboardEvent;
use futures_util::{SinkExt, StreamExt};
use scoring::{battle_contributions, BattleVerdict, Contribution};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Serialize, Deserialize)]
pub struct BattleView {
    #[serde(flatten)]
    pub result: BattleResult,
    pub verdict: BattleVerdict,
    pub label: String,
    pub contributions: Vec<Contribution>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AltseasonView {
    pub score: u8,
    pub signals: Vec<String>,
    pub days_remaining: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaSummaryRequest {
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    /// Overrides the dashboard's own readings when given.
    #[serde(default)]
    pub market: Option<MarketContext>,
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # GET /api/snapshot
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot().await)
}

/// # GET /api/battle
/// The current battle plus the per-factor terms it was summed from.
pub async fn get_battle(State(state): State<Arc<AppState>>) -> Json<BattleView> {
    let (result, inputs) = state.dashboard.battle_with_inputs().await;
    let contributions = battle_contributions(&inputs);
    let verdict = BattleVerdict::from_tug(result.tug_position);

    Json(BattleView {
        result,
        verdict,
        label: verdict.label().to_string(),
        contributions,
    })
}

/// # GET /api/altseason
pub async fn get_altseason(State(state): State<Arc<AppState>>) -> Json<AltseasonView> {
    let snapshot = state.dashboard.snapshot().await;
    Json(AltseasonView {
        score: snapshot.altseason.score,
        signals: snapshot.altseason.signals,
        days_remaining: snapshot.days_remaining,
    })
}

/// # GET /api/news
pub async fn get_news(State(state): State<Arc<AppState>>) -> Json<Vec<NewsItem>> {
    Json(state.dashboard.news().await)
}

/// # GET /api/farcaster
/// Recent casts from the featured accounts, tagged `live` or `fallback`.
pub async fn get_farcaster(State(state): State<Arc<AppState>>) -> Json<CastFeed> {
    Json(state.dashboard.casts().await)
}

/// # POST /api/ta-summary
pub async fn post_ta_summary(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TaSummaryRequest>,
) -> Result<Json<TaSummary>, AppError> {
    let client = state
        .ta_summary
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("TA summary".to_string()))?;

    let timeframe = request.timeframe.unwrap_or_else(|| client.default_timeframe());
    let market = match request.market {
        Some(market) => market,
        None => state.dashboard.market_context().await,
    };

    let summary = client.summarize(timeframe, &market).await?;
    Ok(Json(summary))
}

/// # GET /ws
/// Pushes `Connected`, then every dashboard event, as JSON text frames.
pub async fn websocket_handler(
    State(state): State<Arc<AppState>>, // State must come before WebSocketUpgrade
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    tracing::info!("[WS] New client connected.");
    let mut events = state.dashboard.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        let mut next = Some(DashboardEvent::Connected);
        loop {
            let event = match next.take() {
                Some(event) => event,
                None => match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "[WS] Client lagging; events dropped.");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "[WS] Failed to encode event.");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::error!(error = %e, "[WS] Error.");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::info!("[WS] Connection closed.");
}
