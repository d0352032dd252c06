use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::error;

use crate::cache::CacheStore;
use crate::error::ErrorInfo;
use crate::news::NewsClient;
use crate::normalize::Record;
use crate::resources::ResourceType;

#[derive(Clone)]
pub struct AppState {
    pub store: CacheStore,
    pub news: NewsClient,
}

#[derive(Serialize)]
struct DataResponse<'a> {
    data: &'a [Record],
}

/// One row of `/api/status`.
#[derive(Debug, Serialize)]
pub struct ResourceStatus {
    pub resource: ResourceType,
    pub items: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<ErrorInfo>,
}

/// Build the Axum router for the read API.
pub fn router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new();
    for resource in ResourceType::CACHED {
        router = router.route(
            resource.route(),
            get(move |State(state): State<Arc<AppState>>| async move {
                resource_response(&state.store, resource)
            }),
        );
    }

    router
        .route("/api/ping", get(ping_handler))
        // Older frontend builds call the unprefixed path
        .route("/ping", get(ping_handler))
        .route("/api/status", get(status_handler))
        .route(ResourceType::News.route(), get(news_handler))
        .layer(cors_layer(allowed_origins))
        .with_state(Arc::new(state))
}

fn cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
}

/// GET /api/<resource>: whatever the slot holds right now, possibly empty.
fn resource_response(store: &CacheStore, resource: ResourceType) -> Response {
    let items = store.read(resource);
    Json(DataResponse {
        data: items.as_slice(),
    })
    .into_response()
}

/// GET /api/ping
async fn ping_handler() -> &'static str {
    "pong"
}

/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ResourceStatus>> {
    let rows = ResourceType::CACHED
        .iter()
        .filter_map(|&resource| {
            state.store.snapshot(resource).map(|snap| ResourceStatus {
                resource,
                items: snap.items.len(),
                last_updated: snap.last_updated,
                last_error: snap.last_error.clone(),
            })
        })
        .collect();
    Json(rows)
}

/// GET /api/news
async fn news_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.news.sports_headlines().await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!("Failed to fetch news: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch news" })),
            )
                .into_response()
        }
    }
}
