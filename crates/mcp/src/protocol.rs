// MCP protocol types and definitions (JSON-RPC 2.0)

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision spoken by this server
pub const PROTOCOL_VERSION: &str = "2025-06-18";

// JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const UNAUTHORIZED: i32 = -32001;
pub const NOT_INITIALIZED: i32 = -32002;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// Errors raised while decoding JSON-RPC messages
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Body is not valid JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Valid JSON that is not a JSON-RPC request, notification or response
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    /// A tool call was expected but the request names another method
    #[error("Unknown method: {0}")]
    InvalidMethod(String),

    /// Request parameters are missing or have the wrong shape
    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

impl ProtocolError {
    pub fn code(&self) -> i32 {
        match self {
            ProtocolError::Parse(_) => PARSE_ERROR,
            ProtocolError::InvalidRequest(_) => INVALID_REQUEST,
            ProtocolError::InvalidMethod(_) => METHOD_NOT_FOUND,
            ProtocolError::InvalidParams(_) => INVALID_PARAMS,
        }
    }

    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        JsonRpcError::custom(self.code(), self.to_string())
    }
}

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// May be `null`; preserved exactly in the response
    pub id: Value,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: id.into(),
        }
    }

    /// Named parameter, if params is an object containing it
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }
}

/// JSON-RPC 2.0 Notification (no id, never answered)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: impl Into<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id: id.into(),
        }
    }

    pub fn error(id: impl Into<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id: id.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn parse_error() -> Self {
        Self::custom(PARSE_ERROR, "Parse error")
    }

    pub fn unsupported_protocol_version(version: &str) -> Self {
        Self::custom(PARSE_ERROR, format!("Unsupported protocol version: {}", version))
    }

    pub fn invalid_request() -> Self {
        Self::custom(INVALID_REQUEST, "Invalid Request")
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::custom(METHOD_NOT_FOUND, format!("Unknown method: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::custom(INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::custom(INTERNAL_ERROR, message)
    }

    pub fn unauthorized() -> Self {
        Self::custom(UNAUTHORIZED, "Unauthorized")
    }

    pub fn not_initialized() -> Self {
        Self::custom(NOT_INITIALIZED, "Not initialized")
    }

    pub fn custom(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Any decoded JSON-RPC message
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// Decode and classify raw message text
    pub fn parse_str(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        Self::parse(value)
    }

    /// Classify a decoded JSON value.
    ///
    /// An object with a string `method` is a request when it carries an `id`
    /// member (even `null`) and a notification otherwise. An object with an
    /// `id` and exactly one of `result`/`error` is a response.
    pub fn parse(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut object) = value else {
            return Err(ProtocolError::InvalidRequest(
                "message must be a JSON object".to_string(),
            ));
        };

        match object.get("jsonrpc") {
            None => {}
            Some(Value::String(v)) if v == JSONRPC_VERSION => {}
            Some(other) => {
                return Err(ProtocolError::InvalidRequest(format!(
                    "unsupported jsonrpc version {}",
                    other
                )))
            }
        }

        let id = object.remove("id");
        if let Some(id) = &id {
            if !matches!(id, Value::String(_) | Value::Number(_) | Value::Null) {
                return Err(ProtocolError::InvalidRequest(
                    "id must be a string, number or null".to_string(),
                ));
            }
        }

        if let Some(method) = object.remove("method") {
            let Value::String(method) = method else {
                return Err(ProtocolError::InvalidRequest("method must be a string".to_string()));
            };

            let params = object.remove("params");
            if let Some(params) = &params {
                if !matches!(params, Value::Object(_) | Value::Array(_) | Value::Null) {
                    return Err(ProtocolError::InvalidRequest(
                        "params must be an object or array".to_string(),
                    ));
                }
            }
            let params = params.filter(|p| !p.is_null());

            return Ok(match id {
                Some(id) => JsonRpcMessage::Request(JsonRpcRequest {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    method,
                    params,
                    id,
                }),
                None => JsonRpcMessage::Notification(JsonRpcNotification {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    method,
                    params,
                }),
            });
        }

        let result = object.remove("result");
        let error = object.remove("error");
        match (id, result, error) {
            (Some(id), Some(result), None) => Ok(JsonRpcMessage::Response(JsonRpcResponse::success(
                id, result,
            ))),
            (Some(id), None, Some(error)) => {
                let error: JsonRpcError = serde_json::from_value(error).map_err(|e| {
                    ProtocolError::InvalidRequest(format!("malformed error object: {}", e))
                })?;
                Ok(JsonRpcMessage::Response(JsonRpcResponse::error(id, error)))
            }
            _ => Err(ProtocolError::InvalidRequest(
                "expected a request, notification or response".to_string(),
            )),
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            JsonRpcMessage::Request(r) => Some(&r.method),
            JsonRpcMessage::Notification(n) => Some(&n.method),
            JsonRpcMessage::Response(_) => None,
        }
    }
}

/// `id` of a raw message if it has a usable one, else `null`
pub fn request_id_of(value: &Value) -> Value {
    match value.get("id") {
        Some(id @ (Value::String(_) | Value::Number(_))) => id.clone(),
        _ => Value::Null,
    }
}

/// A `tools/call` request reduced to what the directory needs
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
    pub id: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: Value::String(uuid::Uuid::new_v4().to_string()),
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = id.into();
        self
    }

    /// Encode as a `tools/call` request
    pub fn into_request(self) -> JsonRpcRequest {
        JsonRpcRequest::new(
            self.id,
            METHOD_TOOLS_CALL,
            Some(json!({
                "tool_name": self.name,
                "arguments": self.arguments,
            })),
        )
    }
}

/// Extract the tool name and arguments from a `tools/call` request.
///
/// The name is read from `params.tool_name`, falling back to the MCP
/// `params.name`. Missing arguments default to an empty object.
pub fn parse_tool_call(request: &JsonRpcRequest) -> Result<ToolCall, ProtocolError> {
    if request.method != METHOD_TOOLS_CALL {
        return Err(ProtocolError::InvalidMethod(request.method.clone()));
    }

    let empty = Map::new();
    let params = match &request.params {
        None => &empty,
        Some(Value::Object(params)) => params,
        Some(_) => {
            return Err(ProtocolError::InvalidParams(
                "params must be an object".to_string(),
            ))
        }
    };

    let name = params
        .get("tool_name")
        .or_else(|| params.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ProtocolError::InvalidParams("missing tool name".to_string()))?;

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(arguments @ Value::Object(_)) => arguments.clone(),
        Some(_) => {
            return Err(ProtocolError::InvalidParams(
                "arguments must be an object".to_string(),
            ))
        }
    };

    Ok(ToolCall {
        name: name.to_string(),
        arguments,
        id: request.id.clone(),
    })
}

// MCP-specific protocol messages

/// Tool definition for MCP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// List tools response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolSchema>,
}

/// Initialize request params; every field is optional so older clients still connect
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo", default)]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Initialize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

impl InitializeResult {
    pub fn new(server_info: ServerInfo) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "Employee Directory MCP Server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
