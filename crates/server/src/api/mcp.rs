// Streamable HTTP transport for MCP: JSON-RPC over POST /mcp

use crate::config::AppState;
use crate::middleware::authenticate;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use employee_mcp_protocol::protocol::{
    request_id_of, JsonRpcError, JsonRpcMessage, JsonRpcResponse, INVALID_PARAMS,
    METHOD_INITIALIZE, PROTOCOL_VERSION,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const SESSION_ID_HEADER: HeaderName = HeaderName::from_static("mcp-session-id");
pub const PROTOCOL_VERSION_HEADER: HeaderName = HeaderName::from_static("mcp-protocol-version");

fn rpc_error(status: StatusCode, id: Value, error: JsonRpcError) -> Response {
    (status, Json(JsonRpcResponse::error(id, error))).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handle one JSON-RPC message posted to `/mcp`
pub async fn handle_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(version) = headers.get(&PROTOCOL_VERSION_HEADER) {
        if version.as_bytes() != PROTOCOL_VERSION.as_bytes() {
            let version = String::from_utf8_lossy(version.as_bytes());
            tracing::warn!(version = %version, "Unsupported protocol version");
            return rpc_error(
                StatusCode::BAD_REQUEST,
                Value::Null,
                JsonRpcError::unsupported_protocol_version(&version),
            );
        }
    }

    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid JSON in MCP request");
            return rpc_error(StatusCode::BAD_REQUEST, Value::Null, JsonRpcError::parse_error());
        }
    };

    let id = request_id_of(&value);
    let message = match JsonRpcMessage::parse(value) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid JSON-RPC message");
            return rpc_error(StatusCode::BAD_REQUEST, id, e.to_jsonrpc_error());
        }
    };

    let is_initialize = message.method() == Some(METHOD_INITIALIZE);
    let token = if is_initialize {
        None
    } else {
        match authenticate(&headers, &state).await {
            Some(token) => Some(token),
            None => {
                tracing::warn!(method = ?message.method(), "Unauthorized MCP request");
                return rpc_error(StatusCode::UNAUTHORIZED, id, JsonRpcError::unauthorized());
            }
        }
    };

    let session_id = match header_str(&headers, &SESSION_ID_HEADER) {
        Some(session_id) => {
            if !state.sessions.validate(session_id) {
                tracing::warn!(session_id = %session_id, "Unknown MCP session");
                return StatusCode::NOT_FOUND.into_response();
            }
            state.sessions.touch(session_id);
            Some(session_id.to_string())
        }
        None if is_initialize && matches!(message, JsonRpcMessage::Request(_)) => {
            Some(state.sessions.create())
        }
        None => None,
    };

    let request = match message {
        JsonRpcMessage::Request(request) => request,
        JsonRpcMessage::Notification(notification) => {
            tracing::debug!(method = %notification.method, "Accepted notification");
            return StatusCode::ACCEPTED.into_response();
        }
        JsonRpcMessage::Response(response) => {
            tracing::debug!(id = %response.id, "Accepted client response");
            return StatusCode::ACCEPTED.into_response();
        }
    };

    let response = state.mcp.handle_request(&request, token.as_ref()).await;
    let status = match response.error_code() {
        Some(INVALID_PARAMS) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };

    let mut http_response = (status, Json(response)).into_response();
    if let Some(session_id) = session_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        http_response.headers_mut().insert(SESSION_ID_HEADER, session_id);
    }
    http_response
}

/// Server-to-client streams are not offered
pub async fn handle_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "SSE streaming not currently supported",
            "message": "Use POST for JSON-RPC requests",
        })),
    )
        .into_response()
}

/// Terminate the session named by the `Mcp-Session-Id` header
pub async fn handle_delete(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(session_id) = header_str(&headers, &SESSION_ID_HEADER) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Mcp-Session-Id header required" })),
        )
            .into_response();
    };

    let removed = state.sessions.terminate(session_id);
    tracing::info!(session_id = %session_id, removed, "MCP session terminated");

    Json(json!({ "status": "terminated" })).into_response()
}
