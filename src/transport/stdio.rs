//! Newline-delimited JSON-RPC 2.0 loop over stdin/stdout (C18).
//!
//! Grounded on the wire shape confirmed against a Python MCP client/server
//! pair in the original source material: read one JSON object per line,
//! dispatch, write one response line. Malformed lines get a JSON-RPC parse
//! error response rather than killing the loop — a single bad line from a
//! misbehaving client should not end the process.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::handler::RequestHandler;
use crate::transport::{dispatch, RpcRequest, RpcResponse, JSONRPC_VERSION};

pub async fn run(handler: Arc<RequestHandler>) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(trimmed) {
            Ok(request) => dispatch(&handler, request).await,
            Err(err) => RpcResponse {
                jsonrpc: JSONRPC_VERSION,
                id: None,
                result: None,
                error: Some(crate::transport::RpcError { code: -32700, message: format!("parse error: {err}") }),
            },
        };

        let serialized = serde_json::to_string(&response).unwrap_or_else(|_| {
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"failed to serialize response"}}"#.to_string()
        });
        stdout.write_all(serialized.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
