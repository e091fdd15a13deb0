use super::{ApiError, ApiResult};
use crate::config::AppState;
use crate::middleware::Authenticated;
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use employee_mcp_core::auth::ValidatedToken;
use employee_mcp_protocol::tools::InvalidArguments;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Body of `POST /call_tool`
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

fn empty_arguments() -> Value {
    json!({})
}

fn token_info(token: &ValidatedToken) -> Value {
    json!({
        "sub": token.subject(),
        "scope": token.scope_string(),
        "exp": token.expiry().timestamp(),
    })
}

/// List the available tools
pub async fn list_tools(
    State(state): State<Arc<AppState>>,
    Authenticated(token): Authenticated,
) -> ApiResult<Json<Value>> {
    let tools = state.mcp.registry().list_schemas();

    Ok(Json(json!({
        "count": tools.len(),
        "tools": tools,
        "token_info": token_info(&token),
    })))
}

/// Call a tool named in the request body
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Authenticated(token): Authenticated,
    Json(request): Json<ToolCallRequest>,
) -> ApiResult<Json<Value>> {
    run_tool(&state, &token, &request.tool_name, request.arguments).await
}

/// Call a tool named in the path; the body, if any, is the arguments object
pub async fn call_tool_by_name(
    State(state): State<Arc<AppState>>,
    Authenticated(token): Authenticated,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        empty_arguments()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?
    };

    run_tool(&state, &token, &name, arguments).await
}

async fn run_tool(
    state: &AppState,
    token: &ValidatedToken,
    name: &str,
    arguments: Value,
) -> ApiResult<Json<Value>> {
    tracing::info!(tool = %name, sub = ?token.subject(), "Tool call");

    let result = state
        .mcp
        .registry()
        .call(name, arguments, Some(token))
        .await
        .map_err(|e| match e.downcast::<InvalidArguments>() {
            Ok(invalid) => ApiError::BadRequest(invalid.to_string()),
            Err(e) => ApiError::Internal(e),
        })?;

    let mut info = token_info(token);
    info["aud"] = token.raw_claims().get("aud").cloned().unwrap_or(Value::Null);

    Ok(Json(json!({
        "result": result,
        "token_info": info,
    })))
}
