// Operation-level permissions derived from token scopes

use super::token::ValidatedToken;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Operation-level capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    /// Scope spellings that grant this permission; any one of them is enough
    pub fn accepted_scopes(self) -> &'static [&'static str] {
        match self {
            Permission::Read => &["read_data", "mcp:read"],
            Permission::Write => &["write_data", "mcp:write"],
        }
    }

    pub fn is_granted_to(self, token: &ValidatedToken) -> bool {
        self.accepted_scopes().iter().any(|scope| token.has_scope(scope))
    }
}

/// Tools that read employee records or compensation data
const GATED_OPERATIONS: &[(&str, Permission)] = &[
    ("list_employees", Permission::Read),
    ("get_employee_info", Permission::Read),
    ("get_salary_info", Permission::Read),
];

/// Maps operation names to the permission they require.
///
/// Operations without an entry are public: department, benefits and
/// onboarding information is available to any caller.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    rules: HashMap<String, Permission>,
}

impl AuthorizationGate {
    /// Gate with no rules; every operation is public
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn with_rule(mut self, operation: impl Into<String>, permission: Permission) -> Self {
        self.rules.insert(operation.into(), permission);
        self
    }

    pub fn required_permission(&self, operation: &str) -> Option<Permission> {
        self.rules.get(operation).copied()
    }

    pub fn has_permission(&self, token: Option<&ValidatedToken>, operation: &str) -> bool {
        let Some(permission) = self.required_permission(operation) else {
            return true;
        };

        let Some(token) = token else {
            warn!(operation = operation, permission = ?permission, "Permission denied: no token");
            return false;
        };

        if permission.is_granted_to(token) {
            debug!(
                operation = operation,
                permission = ?permission,
                sub = ?token.subject(),
                "Permission granted"
            );
            true
        } else {
            warn!(
                operation = operation,
                permission = ?permission,
                sub = ?token.subject(),
                scope = %token.scope_string(),
                required = ?permission.accepted_scopes(),
                "Permission denied"
            );
            false
        }
    }
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        GATED_OPERATIONS
            .iter()
            .fold(Self::empty(), |gate, (operation, permission)| {
                gate.with_rule(*operation, *permission)
            })
    }
}
