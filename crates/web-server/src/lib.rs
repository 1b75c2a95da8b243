use api_client::TaSummaryClient;
use axum::{
    routing::{get, post},
    Router,
};
use dashboard::DashboardHandle;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardHandle,
    /// `None` when no language model key is configured.
    pub ta_summary: Option<TaSummaryClient>,
}

/// Builds the application routes.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/battle", get(handlers::get_battle))
        .route("/api/altseason", get(handlers::get_altseason))
        .route("/api/news", get(handlers::get_news))
        .route("/api/farcaster", get(handlers::get_farcaster))
        .route("/api/ta-summary", post(handlers::post_ta_summary))
        .route("/ws", get(handlers::websocket_handler))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Serves the dashboard until `shutdown` resolves.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
