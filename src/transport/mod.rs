//! Transport adapters (C18): thin wire-format boundaries over the request
//! handler. Neither adapter contains cascade, filter, or parsing logic — both
//! just parse arguments, call `RequestHandler`, and serialize the response.

pub mod http;
pub mod stdio;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::handler::{GetArticlesArgs, GetTopNewsArgs, RequestHandler};

pub const JSONRPC_VERSION: &str = "2.0";

const TOOL_NAMES: &[&str] = &["get_articles", "get_top_news", "health_check", "get_metrics"];

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    fn err(id: Option<Value>, code: i64, message: String) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(RpcError { code, message }) }
    }
}

/// Dispatches a single JSON-RPC request. Shared between the stdio loop and
/// the HTTP mirror's single POST RPC path.
pub async fn dispatch(handler: &RequestHandler, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    match request.method.as_str() {
        "initialize" => RpcResponse::ok(
            id,
            serde_json::json!({
                "protocolVersion": JSONRPC_VERSION,
                "serverInfo": { "name": "newsagg", "version": env!("CARGO_PKG_VERSION") },
                "capabilities": { "tools": {} },
            }),
        ),
        "tools/list" => RpcResponse::ok(id, serde_json::json!({ "tools": TOOL_NAMES })),
        "tools/call" => dispatch_tool_call(handler, id, request.params).await,
        other => RpcResponse::err(id, -32601, format!("method not found: {other}")),
    }
}

async fn dispatch_tool_call(handler: &RequestHandler, id: Option<Value>, params: Option<Value>) -> RpcResponse {
    let Some(params) = params else {
        return RpcResponse::err(id, -32602, "missing params".to_string());
    };
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return RpcResponse::err(id, -32602, "missing tool name".to_string());
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    let result = match name {
        "get_articles" => call_get_articles(handler, arguments).await,
        "get_top_news" => call_get_top_news(handler, arguments).await,
        "health_check" => Ok(handler.health_check()),
        "get_metrics" => Ok(handler.get_metrics()),
        other => return RpcResponse::err(id, -32601, format!("unknown tool: {other}")),
    };

    match result {
        Ok(value) => RpcResponse::ok(id, serde_json::json!({ "content": [{ "type": "text", "text": value.to_string() }] })),
        Err(err) => RpcResponse::err(id, err.rpc_code(), err.to_string()),
    }
}

async fn call_get_articles(handler: &RequestHandler, arguments: Value) -> Result<Value, AppError> {
    let domain = arguments
        .get("domain")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::InvalidArgument("domain is required".to_string()))?
        .to_string();
    let args = GetArticlesArgs {
        domain,
        topic: arguments.get("topic").and_then(Value::as_str).map(str::to_string),
        location: arguments.get("location").and_then(Value::as_str).map(str::to_string),
        last_n_days: arguments.get("lastNDays").and_then(Value::as_u64).map(|v| v as u32),
        count: arguments.get("count").and_then(Value::as_u64).map(|v| v as usize),
        fast_mode: arguments.get("fast_mode").and_then(Value::as_bool).unwrap_or(false),
    };
    let response = handler.get_articles(args).await?;
    serde_json::to_value(response).map_err(|e| AppError::Internal(e.to_string()))
}

async fn call_get_top_news(handler: &RequestHandler, arguments: Value) -> Result<Value, AppError> {
    let args = GetTopNewsArgs {
        topic: arguments.get("topic").and_then(Value::as_str).map(str::to_string),
        location: arguments.get("location").and_then(Value::as_str).map(str::to_string),
        last_n_days: arguments.get("lastNDays").and_then(Value::as_u64).map(|v| v as u32),
        count: arguments.get("count").and_then(Value::as_u64).map(|v| v as usize),
    };
    let response = handler.get_top_news(args).await?;
    serde_json::to_value(response).map_err(|e| AppError::Internal(e.to_string()))
}
