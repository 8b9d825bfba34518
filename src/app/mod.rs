//! HTTP API serving the dashboard.

pub mod api;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::environment::Config;
use crate::rss::FeedConfig;
use crate::store::Datastore;
use crate::{LLMParams, TARGET_WEB_REQUEST};

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Datastore>,
    pub llm_params: Option<Arc<LLMParams>>,
    pub feeds: Arc<Vec<FeedConfig>>,
    pub config: Arc<Config>,
    /// Set while a collection is running.
    pub collecting: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        store: Datastore,
        llm_params: Option<LLMParams>,
        feeds: Vec<FeedConfig>,
        config: Config,
    ) -> Self {
        Self {
            store: Arc::new(store),
            llm_params: llm_params.map(Arc::new),
            feeds: Arc::new(feeds),
            config: Arc::new(config),
            collecting: Arc::new(AtomicBool::new(false)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(api::status_check))
        .route("/api/news", get(api::list_news))
        .route("/api/news/collect", post(api::collect_news))
        .route("/api/clusters", get(api::list_clusters))
        .route("/api/sun", get(api::sun))
        .with_state(state)
}

/// Binds `0.0.0.0:PORT` and serves the API until the process exits.
pub async fn app_api_loop(state: AppState) -> Result<()> {
    let addr = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(target: TARGET_WEB_REQUEST, "Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
