// Employee record tools: listing, detail lookup and salary bands

use crate::protocol::ToolSchema;
use crate::tools::{json_schema_enum, json_schema_object, json_schema_string, parse_arguments, Tool};
use anyhow::Result;
use employee_mcp_core::Directory;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Tool to list employees by status
pub struct ListEmployeesTool {
    directory: Arc<Directory>,
}

impl ListEmployeesTool {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }
}

#[derive(Debug, Deserialize)]
struct ListEmployeesArgs {
    #[serde(default = "default_status_filter")]
    status_filter: String,
}

fn default_status_filter() -> String {
    "Active".to_string()
}

#[async_trait::async_trait]
impl Tool for ListEmployeesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_employees".to_string(),
            description: "List all active employees with their basic information (department, title, manager). Requires mcp:read scope.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "status_filter": json_schema_enum(
                        &["Active", "Inactive", "All"],
                        "Filter employees by status. Default: Active"
                    )
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: ListEmployeesArgs = parse_arguments("list_employees", arguments)?;
        let employees = self.directory.list_employees(&args.status_filter);

        Ok(json!({
            "total_count": employees.len(),
            "employees": employees,
            "status_filter": args.status_filter,
        }))
    }

    fn denial_message(&self) -> &'static str {
        "You don't have permission to view the employee list. Please contact HR for access."
    }
}

/// Tool to get one employee's full record
pub struct GetEmployeeInfoTool {
    directory: Arc<Directory>,
}

impl GetEmployeeInfoTool {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }
}

#[derive(Debug, Deserialize)]
struct GetEmployeeInfoArgs {
    #[serde(default)]
    employee_identifier: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetEmployeeInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_employee_info".to_string(),
            description: "Get detailed information about a specific employee by name or employee ID. Requires mcp:read scope.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "employee_identifier": json_schema_string(
                        "Employee name (e.g., 'John Smith') or employee ID (e.g., 'EMP001')"
                    )
                }),
                vec!["employee_identifier"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetEmployeeInfoArgs = parse_arguments("get_employee_info", arguments)?;
        let Some(identifier) = args.employee_identifier.filter(|id| !id.is_empty()) else {
            return Ok(json!({ "error": "employee_identifier is required" }));
        };

        Ok(match self.directory.find_employee(&identifier) {
            Some(employee) => json!({ "employee": employee }),
            None => json!({
                "error": "employee_not_found",
                "message": format!("Employee '{}' not found.", identifier),
            }),
        })
    }

    fn denial_message(&self) -> &'static str {
        "You don't have permission to view detailed employee information."
    }
}

/// Tool to show which employees sit in each salary band
pub struct GetSalaryInfoTool {
    directory: Arc<Directory>,
}

impl GetSalaryInfoTool {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }
}

#[async_trait::async_trait]
impl Tool for GetSalaryInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_salary_info".to_string(),
            description: "Get salary band distribution information. Requires mcp:read scope.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value> {
        Ok(json!({ "salary_bands": self.directory.salary_bands() }))
    }

    fn denial_message(&self) -> &'static str {
        "You don't have permission to view salary information. Please contact HR for access."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Arc<Directory> {
        Arc::new(Directory::fixture())
    }

    #[tokio::test]
    async fn test_list_defaults_to_active() {
        let result = ListEmployeesTool::new(directory()).execute(json!({})).await.unwrap();

        assert_eq!(result["status_filter"], "Active");
        assert_eq!(result["total_count"], 15);
        let first = &result["employees"][0];
        assert_eq!(first["employee_id"], "EMP001");
        assert!(first["manager"].is_null());

        for employee in result["employees"].as_array().unwrap() {
            let mut keys: Vec<&str> = employee
                .as_object()
                .unwrap()
                .keys()
                .map(String::as_str)
                .collect();
            keys.sort_unstable();
            assert_eq!(
                keys,
                ["department", "employee_id", "manager", "name", "status", "title"]
            );
        }
    }

    #[tokio::test]
    async fn test_list_inactive_is_empty() {
        let result = ListEmployeesTool::new(directory())
            .execute(json!({"status_filter": "Inactive"}))
            .await
            .unwrap();
        assert_eq!(result["total_count"], 0);
        assert_eq!(result["employees"], json!([]));
    }

    #[tokio::test]
    async fn test_employee_info_found() {
        let result = GetEmployeeInfoTool::new(directory())
            .execute(json!({"employee_identifier": "emp005"}))
            .await
            .unwrap();

        let employee = &result["employee"];
        assert_eq!(employee["name"], "Mike Wilson");
        assert_eq!(employee["email"], "mike.wilson@streamward.com");
        assert_eq!(employee["salary_band"], "L7");
        assert_eq!(employee["benefits"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_employee_info_not_found() {
        let result = GetEmployeeInfoTool::new(directory())
            .execute(json!({"employee_identifier": "Zed"}))
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({"error": "employee_not_found", "message": "Employee 'Zed' not found."})
        );
    }

    #[tokio::test]
    async fn test_employee_info_requires_identifier() {
        let tool = GetEmployeeInfoTool::new(directory());
        for arguments in [json!({}), json!({"employee_identifier": ""})] {
            let result = tool.execute(arguments).await.unwrap();
            assert_eq!(result, json!({"error": "employee_identifier is required"}));
        }
    }

    #[tokio::test]
    async fn test_salary_bands() {
        let result = GetSalaryInfoTool::new(directory()).execute(json!({})).await.unwrap();
        assert_eq!(result["salary_bands"]["L6"]["count"], 3);
        assert_eq!(
            result["salary_bands"]["L6"]["employees"],
            json!(["Priya Patel", "Emily Davis", "Rachel Green"])
        );
    }
}
