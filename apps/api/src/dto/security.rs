use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use veritrail_application::{AuditLogEntry, RolePermissionRecord, SaveRolePermissionInput};
use veritrail_core::{AppError, AppResult, UserRole};
use veritrail_domain::{DataFilterRule, Permission};

/// API representation of a role-permission matrix row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-permission-response.ts"
)]
pub struct RolePermissionResponse {
    /// Role the row applies to.
    pub role: String,
    /// Permission category.
    pub category: String,
    /// Permission key the row grants or denies.
    pub permission: String,
    /// Whether the row grants access.
    pub allowed: bool,
    /// Optional row-level narrowing applied to reads.
    #[ts(type = "unknown | null")]
    pub data_filter: Option<Value>,
    /// Whether the row is a tenant override or a platform default.
    pub tenant_scoped: bool,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

impl TryFrom<RolePermissionRecord> for RolePermissionResponse {
    type Error = AppError;

    fn try_from(value: RolePermissionRecord) -> Result<Self, Self::Error> {
        let data_filter = value
            .data_filter
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!("failed to encode data filter: {error}"))
            })?;

        Ok(Self {
            role: value.role.as_str().to_owned(),
            category: value.permission.category().as_str().to_owned(),
            permission: value.permission.as_str().to_owned(),
            allowed: value.allowed,
            data_filter,
            tenant_scoped: value.tenant_scoped,
            updated_at: value.updated_at,
        })
    }
}

/// Incoming payload for saving a tenant role-permission row.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-role-permission-request.ts"
)]
pub struct SaveRolePermissionRequest {
    /// Role the row applies to.
    pub role: String,
    /// Permission key the row grants or denies.
    pub permission: String,
    /// Whether the row grants access.
    pub allowed: bool,
    /// Optional row-level narrowing applied to reads.
    #[ts(type = "unknown | null")]
    pub data_filter: Option<Value>,
}

impl SaveRolePermissionRequest {
    /// Validates the payload into a service input.
    pub fn into_input(self) -> AppResult<SaveRolePermissionInput> {
        let role = UserRole::from_str(self.role.as_str())?;
        let permission = Permission::from_str(self.permission.as_str())?;
        let data_filter = self
            .data_filter
            .map(serde_json::from_value::<DataFilterRule>)
            .transpose()
            .map_err(|error| {
                AppError::Validation(format!("malformed data filter rule: {error}"))
            })?;

        Ok(SaveRolePermissionInput {
            role,
            permission,
            allowed: self.allowed,
            data_filter,
        })
    }
}

/// Incoming payload for removing a tenant role-permission override.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/remove-role-permission-request.ts"
)]
pub struct RemoveRolePermissionRequest {
    /// Role the override applies to.
    pub role: String,
    /// Permission key the override applies to.
    pub permission: String,
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    /// Stable event identifier.
    pub event_id: String,
    /// Actor subject.
    pub subject: String,
    /// Stable action identifier.
    pub action: String,
    /// Event resource type.
    pub resource_type: String,
    /// Event resource identifier.
    pub resource_id: String,
    /// Optional event detail.
    pub detail: Option<String>,
    /// Event timestamp in RFC3339.
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            event_id: value.event_id,
            subject: value.subject,
            action: value.action,
            resource_type: value.resource_type,
            resource_id: value.resource_id,
            detail: value.detail,
            created_at: value.created_at,
        }
    }
}
