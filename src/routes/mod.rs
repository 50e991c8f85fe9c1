//! HTTP route handlers for the REST+SSE mirror (C18).
//!
//! Grounded on the teacher's router-assembly idiom: routes grouped by
//! response-caching behavior, each group wrapped in its own
//! `SetResponseHeaderLayer`, merged into one router, single `.with_state`.

pub mod articles;
pub mod health;
pub mod rpc;
pub mod sse;

use axum::routing::{get, post};
use axum::Router;
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{CACHE_CONTROL_ARTICLES, CACHE_CONTROL_HEALTH, CACHE_CONTROL_METRICS};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let article_routes = Router::new()
        .route("/api/articles", get(articles::get_articles))
        .route("/api/top-news", get(articles::get_top_news))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_ARTICLES),
        ));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ));

    let metrics_routes = Router::new()
        .route("/metrics", get(health::metrics))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_METRICS),
        ));

    let rpc_routes = Router::new().route("/rpc", post(rpc::rpc));

    let sse_routes = Router::new().route("/api/top-news/stream", get(sse::top_news_stream));

    Router::new()
        .merge(article_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .merge(rpc_routes)
        .merge(sse_routes)
        .with_state(state)
        .layer(axum::middleware::from_fn(crate::middleware::request_id_layer))
}
