// MCP tool trait and registry

use crate::protocol::ToolSchema;
use anyhow::Result;
use employee_mcp_core::auth::{AuthorizationGate, ValidatedToken};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments.
    ///
    /// Domain failures (unknown employee, missing argument) are part of the
    /// returned payload; `Err` is reserved for failures the caller cannot fix.
    async fn execute(&self, arguments: Value) -> Result<Value>;

    /// Message returned when the caller lacks the tool's permission
    fn denial_message(&self) -> &'static str {
        "You don't have permission to use this tool."
    }
}

/// Tool arguments did not match the tool's input schema
#[derive(Debug, thiserror::Error)]
#[error("Invalid arguments for {tool}: {reason}")]
pub struct InvalidArguments {
    pub tool: String,
    pub reason: String,
}

/// Deserialize tool arguments, reporting failures as [`InvalidArguments`]
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| {
        InvalidArguments {
            tool: tool.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Tool registry for managing available tools.
///
/// Every call goes through the authorization gate before the tool runs.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
    gate: AuthorizationGate,
}

impl ToolRegistry {
    pub fn new(gate: AuthorizationGate) -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            gate,
        }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tool schemas, in registration order
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.schema())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Run a tool on behalf of `token`.
    ///
    /// Unknown tools and permission denials are reported in the payload.
    pub async fn call(&self, name: &str, arguments: Value, token: Option<&ValidatedToken>) -> Result<Value> {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "Unknown tool requested");
            return Ok(json!({ "error": format!("Unknown tool: {}", name) }));
        };

        if !self.gate.has_permission(token, name) {
            return Ok(json!({
                "error": "insufficient_permissions",
                "message": tool.denial_message(),
            }));
        }

        let result = tool.execute(arguments).await?;
        info!(
            tool = name,
            sub = ?token.and_then(ValidatedToken::subject),
            "Tool executed"
        );
        Ok(result)
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> Value {
    json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use employee_mcp_core::auth::Permission;
    use serde::Deserialize;

    struct EchoTool;

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
    }

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".to_string(),
                description: "Echo text back".to_string(),
                input_schema: json_schema_object(
                    json!({"text": json_schema_string("Text to echo")}),
                    vec!["text"],
                ),
            }
        }

        async fn execute(&self, arguments: Value) -> Result<Value> {
            let args: EchoArgs = parse_arguments("echo", arguments)?;
            Ok(json!({"echo": args.text}))
        }
    }

    struct FailingTool;

    #[async_trait::async_trait]
    impl Tool for FailingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "fail".to_string(),
                description: "Always fails".to_string(),
                input_schema: json_schema_object(json!({}), vec![]),
            }
        }

        async fn execute(&self, _arguments: Value) -> Result<Value> {
            anyhow::bail!("backend unavailable")
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry =
            ToolRegistry::new(AuthorizationGate::empty().with_rule("echo", Permission::Read));
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = registry();
        registry.register(Arc::new(EchoTool));

        let names: Vec<_> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["echo", "fail"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("fail"));
    }

    #[tokio::test]
    async fn test_call_with_permission() {
        let token = ValidatedToken::local_identity("tester", ["mcp:read"]);
        let result = registry()
            .call("echo", json!({"text": "hi"}), Some(&token))
            .await
            .unwrap();
        assert_eq!(result, json!({"echo": "hi"}));
    }

    #[tokio::test]
    async fn test_call_denied() {
        let result = registry().call("echo", json!({"text": "hi"}), None).await.unwrap();
        assert_eq!(result["error"], "insufficient_permissions");
        assert_eq!(result["message"], "You don't have permission to use this tool.");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = registry().call("nope", json!({}), None).await.unwrap();
        assert_eq!(result, json!({"error": "Unknown tool: nope"}));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_typed() {
        let token = ValidatedToken::local_identity("tester", ["read_data"]);
        let err = registry()
            .call("echo", json!({"text": 5}), Some(&token))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<InvalidArguments>().is_some());
    }

    #[tokio::test]
    async fn test_tool_failure_propagates() {
        let err = registry().call("fail", json!({}), None).await.unwrap_err();
        assert!(err.downcast_ref::<InvalidArguments>().is_none());
        assert_eq!(err.to_string(), "backend unavailable");
    }
}
