use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{info, warn};

use super::AppState;
use crate::collector::{clamp_count, Collector};
use crate::geo::{cluster_by_country, cluster_news, resolve_location, subsolar_point, terminator, GeoPoint};
use crate::news::{NewsItem, NewsList};
use crate::TARGET_WEB_REQUEST;

/// How many items the dashboard shows.
pub const NEWS_LIMIT: usize = 100;
/// Points on the terminator polyline returned by `/api/sun`.
const TERMINATOR_STEPS: usize = 180;
/// Buffered progress events per collection stream.
const PROGRESS_BUFFER: usize = 64;

/// Body of `POST /api/news/collect`.
#[derive(Debug, Default, Deserialize)]
pub struct CollectRequest {
    pub count: Option<usize>,
}

impl CollectRequest {
    /// Reads the request body; anything missing or unreadable means defaults.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_else(|e| {
            warn!(target: TARGET_WEB_REQUEST, "Ignoring unreadable collect request body: {}", e);
            Self::default()
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ClusterQuery {
    pub scale: Option<f64>,
    /// `globe` groups by country regardless of zoom.
    pub view: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SunResponse {
    pub subsolar: GeoPoint,
    pub terminator: Vec<[f64; 2]>,
    pub timestamp: String,
}

fn error_response(status: StatusCode, error: &str, details: impl ToString) -> Response {
    (
        status,
        Json(json!({ "error": error, "details": details.to_string() })),
    )
        .into_response()
}

/// Marks a collection as running until dropped.
struct CollectGuard(Arc<AtomicBool>);

impl CollectGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| CollectGuard(Arc::clone(flag)))
    }
}

impl Drop for CollectGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

async fn current_news(state: &AppState) -> anyhow::Result<Vec<NewsItem>> {
    let records = state.store.list(NEWS_LIMIT).await?;
    Ok(records.into_iter().map(NewsItem::from).collect())
}

/// `GET /api/news`
pub async fn list_news(State(state): State<AppState>) -> Response {
    match current_news(&state).await {
        Ok(items) => {
            info!(target: TARGET_WEB_REQUEST, "Serving {} news items", items.len());
            Json(NewsList::new(items)).into_response()
        }
        Err(e) => {
            warn!(target: TARGET_WEB_REQUEST, "Failed to load news: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch news", format!("{:#}", e))
        }
    }
}

/// `POST /api/news/collect`: runs the pipeline and streams its progress.
///
/// The run continues in the background if the client disconnects.
pub async fn collect_news(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(guard) = CollectGuard::acquire(&state.collecting) else {
        warn!(target: TARGET_WEB_REQUEST, "Rejected collect request: a collection is already running");
        return error_response(
            StatusCode::CONFLICT,
            "Collection already running",
            "Wait for the current collection to finish",
        );
    };

    let count = clamp_count(CollectRequest::from_body(&body).count);
    info!(target: TARGET_WEB_REQUEST, "Starting collection of up to {} items", count);

    let (tx, rx) = mpsc::channel(PROGRESS_BUFFER);
    tokio::spawn(async move {
        let _guard = guard;
        let collector = Collector {
            feeds: &state.feeds,
            store: &state.store,
            llm_params: state.llm_params.as_deref(),
            language: &state.config.summary_language,
            item_delay: state.config.item_delay,
        };
        collector.run(count, Some(tx)).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| Event::default().json_data(event));
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// `GET /api/clusters?scale=&view=`
pub async fn list_clusters(
    State(state): State<AppState>,
    Query(query): Query<ClusterQuery>,
) -> Response {
    let items = match current_news(&state).await {
        Ok(items) => items,
        Err(e) => {
            warn!(target: TARGET_WEB_REQUEST, "Failed to load news for clusters: {:#}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch news", format!("{:#}", e));
        }
    };

    let clusters = if query.view.as_deref() == Some("globe") {
        cluster_by_country(&items, |item| item.country.clone())
    } else {
        let scale = query.scale.filter(|s| s.is_finite()).unwrap_or(1.0);
        cluster_news(&items, scale, |item| {
            resolve_location(item.city.as_deref(), item.region.as_deref(), &item.country)
        })
    };

    Json(json!({ "clusters": clusters, "total": items.len() })).into_response()
}

/// `GET /api/sun`
pub async fn sun() -> Json<SunResponse> {
    let now = Utc::now();
    Json(SunResponse {
        subsolar: subsolar_point(now),
        terminator: terminator(now, TERMINATOR_STEPS),
        timestamp: now.to_rfc3339(),
    })
}

/// `GET /status`
pub async fn status_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
        "build": option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        "commit": option_env!("GIT_HASH"),
        "datastore": state.store.name(),
        "llm": state.llm_params.as_ref().map(|p| p.llm_client.name()),
        "collecting": state.collecting.load(Ordering::SeqCst),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Config;
    use crate::news::NewsRecord;
    use crate::store::{Datastore, SqliteStore};
    use axum::body::to_bytes;

    async fn state() -> AppState {
        let store = Datastore::Sqlite(SqliteStore::in_memory().await.unwrap());
        AppState::new(store, None, Vec::new(), Config::from_env())
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_collect_request_body() {
        assert_eq!(CollectRequest::from_body(b"").count, None);
        assert_eq!(CollectRequest::from_body(b"{\"count\": 20}").count, Some(20));
        assert_eq!(CollectRequest::from_body(b"{}").count, None);
        assert_eq!(CollectRequest::from_body(b"not json").count, None);
    }

    #[test]
    fn test_collect_guard_is_exclusive() {
        let flag = Arc::new(AtomicBool::new(false));
        let first = CollectGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(CollectGuard::acquire(&flag).is_none());
        drop(first);
        assert!(CollectGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn test_list_news_shape() {
        let state = state().await;
        state
            .store
            .save(&NewsRecord {
                title: "Quake in Osaka".to_string(),
                url: "https://example.com/quake".to_string(),
                source: Some("NHK".to_string()),
                city: Some("Osaka".to_string()),
                date: Some("2025-01-02".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let response = list_news(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["news"][0]["country"], "Japan");
        assert!(json["news"][0]["coordinates"]["lat"].is_number());
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_collect_conflict_while_running() {
        let state = state().await;
        state.collecting.store(true, Ordering::SeqCst);
        let response = collect_news(State(state), Bytes::new()).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Collection already running");
    }

    #[tokio::test]
    async fn test_clusters_by_view() {
        let state = state().await;
        for (url, country) in [("https://a/1", "France"), ("https://a/2", "France"), ("https://a/3", "global")] {
            state
                .store
                .save(&NewsRecord {
                    title: "t".to_string(),
                    url: url.to_string(),
                    country: Some(country.to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let query = ClusterQuery { scale: Some(1.0), view: Some("globe".to_string()) };
        let json = body_json(list_clusters(State(state.clone()), Query(query)).await).await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["clusters"].as_array().unwrap().len(), 1);
        assert_eq!(json["clusters"][0]["label"], "France");
        assert_eq!(json["clusters"][0]["count"], 2);

        let query = ClusterQuery { scale: None, view: None };
        let json = body_json(list_clusters(State(state), Query(query)).await).await;
        assert_eq!(json["clusters"][0]["count"], 2);
    }

    #[tokio::test]
    async fn test_sun_and_status() {
        let Json(sun) = sun().await;
        assert_eq!(sun.terminator.len(), TERMINATOR_STEPS + 1);
        assert!(sun.subsolar.lat.abs() <= 23.5);

        let Json(status) = status_check(State(state().await)).await;
        assert_eq!(status["status"], "OK");
        assert_eq!(status["datastore"], "sqlite");
        assert!(status["llm"].is_null());
    }
}
