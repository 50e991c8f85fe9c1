//! Single POST JSON-RPC path mirroring the stdio transport (C18).

use axum::extract::State;
use axum::Json;

use crate::state::AppState;
use crate::transport::{dispatch, RpcRequest, RpcResponse};

pub async fn rpc(State(state): State<AppState>, Json(request): Json<RpcRequest>) -> Json<RpcResponse> {
    Json(dispatch(&state.handler, request).await)
}
