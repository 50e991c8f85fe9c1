//! Server-Sent-Events stream for `get_top_news` polling (C18).
//!
//! Re-invokes the handler on an interval and emits one SSE event per poll.
//! Since the handler itself is cache-backed (C3), rapid reconnects don't
//! cause redundant cascade work — most polls resolve from cache.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};

use crate::handler::GetTopNewsArgs;
use crate::routes::articles::GetTopNewsQuery;
use crate::state::AppState;

/// Poll interval matches the response cache TTL default so consecutive
/// events reflect genuinely fresh cascades rather than repeated cache hits.
const POLL_INTERVAL: Duration = Duration::from_secs(30);

pub async fn top_news_stream(
    State(state): State<AppState>,
    Query(query): Query<GetTopNewsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = stream::unfold((state, query), |(state, query)| async move {
        tokio::time::sleep(POLL_INTERVAL).await;

        let args = GetTopNewsArgs {
            topic: query.topic.clone(),
            location: query.location.clone(),
            last_n_days: query.last_n_days,
            count: query.count,
        };
        let event = match state.handler.get_top_news(args).await {
            Ok(response) => Event::default()
                .json_data(response)
                .unwrap_or_else(|_| Event::default().data("serialization error")),
            Err(err) => Event::default().event("error").data(err.to_string()),
        };
        Some((Ok(event), (state, query)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
