// MCP method dispatch and the line-delimited stdio transport

use crate::protocol::{
    parse_tool_call, request_id_of, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerInfo,
    METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use crate::tools::{InvalidArguments, ToolRegistry};
use anyhow::{Context, Result};
use employee_mcp_core::auth::{ValidatedToken, LOCAL_IDENTITY_SCOPES};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

/// Longest accepted stdio message
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Subject of the identity used for stdio tool calls
pub const STDIO_SUBJECT: &str = "stdio-client";

/// Answers `initialize`, `tools/list` and `tools/call`.
///
/// Shared by the HTTP and stdio transports; authentication and sessions are
/// the transport's concern.
#[derive(Clone)]
pub struct McpHandler {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
}

impl McpHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            server_info: ServerInfo::default(),
        }
    }

    pub fn with_server_info(mut self, server_info: ServerInfo) -> Self {
        self.server_info = server_info;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn initialize(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let params: InitializeParams = request
            .params
            .clone()
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        info!(
            client = ?params.client_info.as_ref().map(|c| c.name.as_str()),
            client_protocol_version = ?params.protocol_version,
            "Client initialized"
        );

        match serde_json::to_value(InitializeResult::new(self.server_info.clone())) {
            Ok(result) => JsonRpcResponse::success(request.id.clone(), result),
            Err(e) => internal_error(request.id.clone(), e.into()),
        }
    }

    pub fn list_tools(&self, id: Value) -> JsonRpcResponse {
        let tools = self.registry.list_schemas();
        debug!(count = tools.len(), "Listed tools");

        match serde_json::to_value(ListToolsResult { tools }) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => internal_error(id, e.into()),
        }
    }

    pub async fn call_tool(
        &self,
        request: &JsonRpcRequest,
        token: Option<&ValidatedToken>,
    ) -> JsonRpcResponse {
        let call = match parse_tool_call(request) {
            Ok(call) => call,
            Err(e) => {
                warn!(error = %e, "Invalid tool call");
                return JsonRpcResponse::error(request.id.clone(), e.to_jsonrpc_error());
            }
        };

        match self.registry.call(&call.name, call.arguments, token).await {
            Ok(result) => JsonRpcResponse::success(call.id, result),
            Err(e) if e.downcast_ref::<InvalidArguments>().is_some() => {
                warn!(tool = %call.name, error = %e, "Invalid tool arguments");
                JsonRpcResponse::error(call.id, JsonRpcError::invalid_params(e.to_string()))
            }
            Err(e) => {
                error!(tool = %call.name, error = %e, "Tool execution failed");
                JsonRpcResponse::error(call.id, JsonRpcError::internal_error("Internal error"))
            }
        }
    }

    /// Dispatch any request by method name
    pub async fn handle_request(
        &self,
        request: &JsonRpcRequest,
        token: Option<&ValidatedToken>,
    ) -> JsonRpcResponse {
        match request.method.as_str() {
            METHOD_INITIALIZE => self.initialize(request),
            METHOD_TOOLS_LIST => self.list_tools(request.id.clone()),
            METHOD_TOOLS_CALL => self.call_tool(request, token).await,
            method => {
                warn!(method = method, "Unknown JSON-RPC method");
                JsonRpcResponse::error(request.id.clone(), JsonRpcError::method_not_found(method))
            }
        }
    }
}

fn internal_error(id: Value, err: anyhow::Error) -> JsonRpcResponse {
    error!(error = %err, "Failed to encode result");
    JsonRpcResponse::error(id, JsonRpcError::internal_error("Internal error"))
}

/// MCP server speaking newline-delimited JSON-RPC over a byte stream.
///
/// There is no bearer token on this transport; tool calls run as the local
/// `stdio-client` identity holding read and write scopes.
pub struct StdioServer {
    handler: McpHandler,
    identity: ValidatedToken,
    initialized: bool,
}

impl StdioServer {
    pub fn new(handler: McpHandler) -> Self {
        Self {
            handler,
            identity: ValidatedToken::local_identity(STDIO_SUBJECT, LOCAL_IDENTITY_SCOPES),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Handle one input line, returning the response to write if any
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Invalid JSON received");
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
            }
        };

        let id = request_id_of(&value);
        match JsonRpcMessage::parse(value) {
            Ok(JsonRpcMessage::Request(request)) => Some(self.handle_request(request).await),
            Ok(JsonRpcMessage::Notification(notification)) => {
                debug!(method = %notification.method, "Notification received");
                None
            }
            Ok(JsonRpcMessage::Response(response)) => {
                debug!(id = %response.id, "Ignoring client response");
                None
            }
            Err(e) => {
                warn!(error = %e, "Invalid JSON-RPC message");
                Some(JsonRpcResponse::error(id, e.to_jsonrpc_error()))
            }
        }
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "Received request");

        match request.method.as_str() {
            METHOD_INITIALIZE => {
                self.initialized = true;
                self.handler.initialize(&request)
            }
            METHOD_TOOLS_LIST | METHOD_TOOLS_CALL if !self.initialized => {
                warn!(method = %request.method, "Request before initialize");
                JsonRpcResponse::error(request.id, JsonRpcError::not_initialized())
            }
            _ => self.handler.handle_request(&request, Some(&self.identity)).await,
        }
    }

    /// Serve until `reader` reaches EOF
    pub async fn run<R, W>(&mut self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let mut output = FramedWrite::new(writer, LinesCodec::new());

        info!("Starting MCP stdio server");

        // FramedRead yields a single `None` after a decode error before it
        // resumes reading, so that one does not mean EOF.
        let mut after_decode_error = false;

        loop {
            let line = match lines.next().await {
                Some(line) => line,
                None if after_decode_error => {
                    after_decode_error = false;
                    continue;
                }
                None => break,
            };
            after_decode_error = false;

            let response = match line {
                Ok(line) => self.handle_line(&line).await,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    after_decode_error = true;
                    warn!(max = MAX_LINE_LENGTH, "Discarding oversized message");
                    Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
                }
                Err(LinesCodecError::Io(e)) => return Err(e).context("Failed to read message"),
            };

            if let Some(response) = response {
                let encoded = serde_json::to_string(&response)?;
                output
                    .send(encoded)
                    .await
                    .context("Failed to write response")?;
            }
        }

        info!("EOF received, shutting down");
        Ok(())
    }
}

/// Serve MCP over the process's stdin and stdout
pub async fn serve_stdio(handler: McpHandler) -> Result<()> {
    StdioServer::new(handler)
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await
}
