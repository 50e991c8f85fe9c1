//! Plain-HTTP server bootstrap for the REST+SSE mirror (C18).
//!
//! Grounded on the teacher's `http::server`/`http::shutdown` plain-HTTP path:
//! bind, serve, and wait on SIGTERM/SIGINT for a graceful shutdown. The
//! manual-cert and ACME TLS modes the teacher supported have no counterpart
//! here — operators terminate TLS at a reverse proxy in front of this
//! service, so only the plain-HTTP branch survives.

use std::net::SocketAddr;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::wait_for_shutdown_signal;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid http.host or http.port: {0}")]
    Addr(String),
    #[error("failed to bind server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Binds `addr` and serves `app` until SIGTERM/SIGINT, draining in-flight
/// requests before returning. `shutdown` is cancelled the moment the signal
/// arrives, so cascades in flight elsewhere in the process abandon their
/// outstanding fetches at the same time axum stops accepting new requests.
pub async fn serve(app: Router, host: &str, port: u16, shutdown: CancellationToken) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| ServerError::Addr(format!("{e}")))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "starting HTTP server");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
