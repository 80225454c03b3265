//! MCP JSON-RPC 2.0 server: reads requests from stdin, writes responses to stdout.
//!
//! The MCP protocol uses newline-delimited JSON over STDIO.
//! Tracing output goes to stderr so it doesn't interfere with the protocol.

use serde_json::Value;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use super::tools::{self, ToolContext};
use super::types::*;

/// Run the MCP server loop on stdin/stdout until stdin closes.
pub async fn run(ctx: &ToolContext) -> io::Result<()> {
    serve(ctx, BufReader::new(io::stdin()), io::stdout()).await
}

/// Serve newline-delimited requests from `reader`, answering on `writer`.
pub async fn serve<R, W>(ctx: &ToolContext, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(root = %ctx.root().display(), "MCP server starting");
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!(request = %trimmed, "received request");

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "invalid JSON-RPC request");
                let response = JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e));
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        if let Some(response) = handle_request(ctx, &request).await {
            write_response(&mut writer, &response).await?;
        }
    }

    info!("MCP server shutting down");
    Ok(())
}

/// Handle a single JSON-RPC request and return a response (or None for notifications).
async fn handle_request(ctx: &ToolContext, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
    let id = request.id.clone();

    match request.method.as_str() {
        "initialize" => {
            info!("client initializing");
            Some(JsonRpcResponse::success(id, initialize_result()))
        }

        "notifications/initialized" => {
            info!("client initialized");
            None
        }

        "tools/list" => {
            debug!("listing tools");
            let result = ToolsListResult {
                tools: tools::list_tools(),
            };
            Some(JsonRpcResponse::from_serializable(id, &result))
        }

        "tools/call" => {
            let params: ToolsCallParams = match serde_json::from_value(request.params.clone()) {
                Ok(p) => p,
                Err(e) => {
                    return Some(JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid params: {}", e),
                    ));
                }
            };

            debug!(tool = %params.name, "calling tool");
            let result = tools::call_tool(ctx, &params.name, &params.arguments).await;
            if result.is_error() {
                warn!(tool = %params.name, "tool call failed");
            }
            Some(JsonRpcResponse::from_serializable(id, &result))
        }

        "ping" => Some(JsonRpcResponse::success(id, Value::Object(Default::default()))),

        _ => {
            warn!(method = %request.method, "unknown method");
            Some(JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ))
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> io::Result<()> {
    let json = serde_json::to_string(response).map_err(io::Error::other)?;
    debug!(response = %json, "sending response");
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserRegistry;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn exchange(ctx: &ToolContext, input: &str) -> Vec<JsonRpcResponse> {
        let mut output = Vec::new();
        serve(ctx, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_session() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("foo.js"), "export const foo = 1;\n").unwrap();
        fs::write(dir.path().join("foo.test.js"), "test('foo', () => {});\n").unwrap();
        let ctx = ToolContext::new(dir.path(), Arc::new(ParserRegistry::new()));

        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"analyze_test_coverage","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#,
        ]
        .join("\n");

        let responses = exchange(&ctx, &input).await;
        assert_eq!(responses.len(), 4);

        let init = responses[0].result.as_ref().unwrap();
        assert_eq!(init["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(init["serverInfo"]["name"], "codescope");

        let tools = responses[1].result.as_ref().unwrap();
        assert_eq!(tools["tools"].as_array().unwrap().len(), 6);

        let call: ToolsCallResult =
            serde_json::from_value(responses[2].result.clone().unwrap()).unwrap();
        assert!(!call.is_error());
        let coverage: Value = serde_json::from_str(&call.content[0].text).unwrap();
        assert_eq!(coverage["covered"], 1);

        assert_eq!(responses[3].id, Some(Value::from(4)));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let dir = tempdir().unwrap();
        let ctx = ToolContext::new(dir.path(), Arc::new(ParserRegistry::new()));

        let input = [
            "not json",
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"arguments":{}}}"#,
        ]
        .join("\n");

        let responses = exchange(&ctx, &input).await;
        let codes: Vec<i64> = responses
            .iter()
            .map(|r| r.error.as_ref().unwrap().code)
            .collect();
        assert_eq!(codes, vec![PARSE_ERROR, METHOD_NOT_FOUND, INVALID_PARAMS]);
    }
}
