//! REST endpoints for the two article-fetching operations (C18 HTTP mirror).
//! Thin: parses query params, calls into the handler, serializes the typed
//! response. No cascade/filter/parsing logic lives here.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::handler::{ArticlesResponse, GetArticlesArgs, GetTopNewsArgs};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GetArticlesQuery {
    pub domain: String,
    pub topic: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "lastNDays")]
    pub last_n_days: Option<u32>,
    pub count: Option<usize>,
    #[serde(default)]
    pub fast_mode: bool,
}

pub async fn get_articles(
    State(state): State<AppState>,
    Query(query): Query<GetArticlesQuery>,
) -> Result<Json<ArticlesResponse>, AppError> {
    let args = GetArticlesArgs {
        domain: query.domain,
        topic: query.topic,
        location: query.location,
        last_n_days: query.last_n_days,
        count: query.count,
        fast_mode: query.fast_mode,
    };
    let response = state.handler.get_articles(args).await?;
    Ok(Json(response))
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetTopNewsQuery {
    pub topic: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "lastNDays")]
    pub last_n_days: Option<u32>,
    pub count: Option<usize>,
}

pub async fn get_top_news(
    State(state): State<AppState>,
    Query(query): Query<GetTopNewsQuery>,
) -> Result<Json<ArticlesResponse>, AppError> {
    let args = GetTopNewsArgs {
        topic: query.topic,
        location: query.location,
        last_n_days: query.last_n_days,
        count: query.count,
    };
    let response = state.handler.get_top_news(args).await?;
    Ok(Json(response))
}
