pub mod employees;
pub mod organization;
mod registry;

pub use employees::{GetEmployeeInfoTool, GetSalaryInfoTool, ListEmployeesTool};
pub use organization::{GetBenefitsInfoTool, GetDepartmentInfoTool, GetOnboardingInfoTool};
pub use registry::{
    json_schema_enum, json_schema_object, json_schema_string, parse_arguments, InvalidArguments,
    Tool, ToolRegistry,
};

use employee_mcp_core::auth::AuthorizationGate;
use employee_mcp_core::Directory;
use std::sync::Arc;

/// Registry holding the six directory tools behind the default authorization gate
pub fn directory_registry(directory: Arc<Directory>) -> ToolRegistry {
    let mut registry = ToolRegistry::new(AuthorizationGate::default());

    registry.register(Arc::new(ListEmployeesTool::new(directory.clone())));
    registry.register(Arc::new(GetEmployeeInfoTool::new(directory.clone())));
    registry.register(Arc::new(GetDepartmentInfoTool::new(directory.clone())));
    registry.register(Arc::new(GetBenefitsInfoTool::new(directory.clone())));
    registry.register(Arc::new(GetSalaryInfoTool::new(directory.clone())));
    registry.register(Arc::new(GetOnboardingInfoTool::new(directory)));

    registry
}
