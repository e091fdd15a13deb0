// Organization-wide information tools: departments, benefits, onboarding

use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, parse_arguments, Tool};
use anyhow::Result;
use employee_mcp_core::Directory;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tool to describe one department or all of them
pub struct GetDepartmentInfoTool {
    directory: Arc<Directory>,
}

impl GetDepartmentInfoTool {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }
}

#[derive(Debug, Deserialize)]
struct GetDepartmentInfoArgs {
    #[serde(default)]
    department_name: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetDepartmentInfoTool {
    fn schema(&self) -> ToolSchema {
        let keys: Vec<&str> = self.directory.department_keys().collect();
        ToolSchema {
            name: "get_department_info".to_string(),
            description: "Get overview information about all departments including head, employee count, budget, and location.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "department_name": {
                        "type": "string",
                        "enum": keys,
                        "description": "Optional: Specific department name. If not provided, returns all departments."
                    }
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetDepartmentInfoArgs = parse_arguments("get_department_info", arguments)?;

        match args.department_name.filter(|name| !name.is_empty()) {
            Some(name) => Ok(match self.directory.department(&name) {
                Some(department) => json!({ "department": department }),
                None => json!({
                    "error": "department_not_found",
                    "message": format!("Department '{}' not found.", name),
                }),
            }),
            None => {
                let departments: Vec<_> = self.directory.departments().collect();
                Ok(json!({
                    "total_count": departments.len(),
                    "departments": departments,
                }))
            }
        }
    }
}

/// Tool to summarize benefit enrollment
pub struct GetBenefitsInfoTool {
    directory: Arc<Directory>,
}

impl GetBenefitsInfoTool {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }
}

#[async_trait::async_trait]
impl Tool for GetBenefitsInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_benefits_info".to_string(),
            description: "Get information about available employee benefits and enrollment statistics.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value> {
        Ok(serde_json::to_value(self.directory.benefits_summary())?)
    }
}

/// Tool to describe the onboarding process
pub struct GetOnboardingInfoTool {
    directory: Arc<Directory>,
}

impl GetOnboardingInfoTool {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }
}

#[async_trait::async_trait]
impl Tool for GetOnboardingInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_onboarding_info".to_string(),
            description: "Get information about the employee onboarding process and steps.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value> {
        Ok(json!({ "onboarding_process": self.directory.onboarding_process() }))
    }
}
