//! Request ID and tracing-span middleware (C16).
//!
//! Grounded on the teacher's `request_id_layer`: generate a request id per
//! inbound call, open a span carrying it, and record completion status and
//! duration. The teacher's `auth_layer`/session-cookie middleware is dropped
//! entirely — this service has no authentication surface.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Extension type for accessing the request id in handlers if needed.
#[derive(Clone, Debug)]
pub struct RequestId(pub Uuid);

/// Should be the outermost middleware layer so the span wraps all request
/// processing, including other middleware and handlers.
pub async fn request_id_layer(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let path = uri.path();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();

    let mut request = request;
    request.extensions_mut().insert(RequestId(request_id));

    async move {
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(status = response.status().as_u16(), duration_ms, "request completed");

        response
    }
    .instrument(span)
    .await
}
