use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use veritrail_core::{AppError, AppResult};

/// Category grouping for permission keys in the role matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// Vendor records.
    Vendors,
    /// AI agent records.
    Agents,
    /// Assessment assignments and questionnaires.
    Assessments,
    /// Onboarding requests and decisions.
    Onboarding,
    /// Master data lists.
    MasterData,
    /// Threaded messages.
    Messages,
    /// Roles, permissions, and audit trail.
    Security,
    /// Tenant administration.
    Tenants,
}

impl PermissionCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendors => "vendors",
            Self::Agents => "agents",
            Self::Assessments => "assessments",
            Self::Onboarding => "onboarding",
            Self::MasterData => "master_data",
            Self::Messages => "messages",
            Self::Security => "security",
            Self::Tenants => "tenants",
        }
    }
}

/// Permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading vendor records.
    VendorRead,
    /// Allows creating vendor records.
    VendorCreate,
    /// Allows updating vendor records.
    VendorUpdate,
    /// Allows soft-deleting vendor records.
    VendorDelete,
    /// Allows writing vendor workflow stages.
    VendorStageAdvance,
    /// Allows reading AI agent records.
    AgentRead,
    /// Allows registering AI agents.
    AgentCreate,
    /// Allows updating AI agent records.
    AgentUpdate,
    /// Allows deleting AI agent records.
    AgentDelete,
    /// Allows writing agent workflow stages.
    AgentStageAdvance,
    /// Allows reading assessment assignments.
    AssessmentRead,
    /// Allows assigning questionnaires.
    AssessmentAssign,
    /// Allows submitting questionnaire responses.
    AssessmentSubmit,
    /// Allows writing assessment workflow stages.
    AssessmentStageAdvance,
    /// Allows reading onboarding requests.
    OnboardingRead,
    /// Allows submitting onboarding requests.
    OnboardingSubmit,
    /// Allows approving or rejecting onboarding requests.
    OnboardingDecide,
    /// Allows reading master data lists.
    MasterDataRead,
    /// Allows managing master data lists.
    MasterDataManage,
    /// Allows reading message threads.
    MessageRead,
    /// Allows posting messages and replies.
    MessagePost,
    /// Allows reading audit log entries.
    SecurityAuditRead,
    /// Allows managing the role-permission matrix.
    SecurityPolicyManage,
    /// Allows managing tenant profiles.
    TenantManage,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VendorRead => "vendor.read",
            Self::VendorCreate => "vendor.create",
            Self::VendorUpdate => "vendor.update",
            Self::VendorDelete => "vendor.delete",
            Self::VendorStageAdvance => "vendor.stage.advance",
            Self::AgentRead => "agent.read",
            Self::AgentCreate => "agent.create",
            Self::AgentUpdate => "agent.update",
            Self::AgentDelete => "agent.delete",
            Self::AgentStageAdvance => "agent.stage.advance",
            Self::AssessmentRead => "assessment.read",
            Self::AssessmentAssign => "assessment.assign",
            Self::AssessmentSubmit => "assessment.submit",
            Self::AssessmentStageAdvance => "assessment.stage.advance",
            Self::OnboardingRead => "onboarding.read",
            Self::OnboardingSubmit => "onboarding.submit",
            Self::OnboardingDecide => "onboarding.decide",
            Self::MasterDataRead => "master_data.read",
            Self::MasterDataManage => "master_data.manage",
            Self::MessageRead => "message.read",
            Self::MessagePost => "message.post",
            Self::SecurityAuditRead => "security.audit.read",
            Self::SecurityPolicyManage => "security.policy.manage",
            Self::TenantManage => "tenant.manage",
        }
    }

    /// Returns the matrix category this permission belongs to.
    #[must_use]
    pub fn category(&self) -> PermissionCategory {
        match self {
            Self::VendorRead
            | Self::VendorCreate
            | Self::VendorUpdate
            | Self::VendorDelete
            | Self::VendorStageAdvance => PermissionCategory::Vendors,
            Self::AgentRead
            | Self::AgentCreate
            | Self::AgentUpdate
            | Self::AgentDelete
            | Self::AgentStageAdvance => PermissionCategory::Agents,
            Self::AssessmentRead
            | Self::AssessmentAssign
            | Self::AssessmentSubmit
            | Self::AssessmentStageAdvance => PermissionCategory::Assessments,
            Self::OnboardingRead | Self::OnboardingSubmit | Self::OnboardingDecide => {
                PermissionCategory::Onboarding
            }
            Self::MasterDataRead | Self::MasterDataManage => PermissionCategory::MasterData,
            Self::MessageRead | Self::MessagePost => PermissionCategory::Messages,
            Self::SecurityAuditRead | Self::SecurityPolicyManage => PermissionCategory::Security,
            Self::TenantManage => PermissionCategory::Tenants,
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::VendorRead,
            Permission::VendorCreate,
            Permission::VendorUpdate,
            Permission::VendorDelete,
            Permission::VendorStageAdvance,
            Permission::AgentRead,
            Permission::AgentCreate,
            Permission::AgentUpdate,
            Permission::AgentDelete,
            Permission::AgentStageAdvance,
            Permission::AssessmentRead,
            Permission::AssessmentAssign,
            Permission::AssessmentSubmit,
            Permission::AssessmentStageAdvance,
            Permission::OnboardingRead,
            Permission::OnboardingSubmit,
            Permission::OnboardingDecide,
            Permission::MasterDataRead,
            Permission::MasterDataManage,
            Permission::MessageRead,
            Permission::MessagePost,
            Permission::SecurityAuditRead,
            Permission::SecurityPolicyManage,
            Permission::TenantManage,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|permission| permission.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a tenant is created.
    TenantCreated,
    /// Emitted when a tenant profile is updated.
    TenantUpdated,
    /// Emitted when a vendor is created.
    VendorCreated,
    /// Emitted when a vendor is updated.
    VendorUpdated,
    /// Emitted when a vendor is soft-deleted.
    VendorDeleted,
    /// Emitted when a vendor workflow stage is written.
    VendorStageAdvanced,
    /// Emitted when an AI agent is registered.
    AgentCreated,
    /// Emitted when an AI agent is updated.
    AgentUpdated,
    /// Emitted when an AI agent is deleted.
    AgentDeleted,
    /// Emitted when an agent workflow stage is written.
    AgentStageAdvanced,
    /// Emitted when a questionnaire is assigned.
    AssessmentAssigned,
    /// Emitted when questionnaire responses are submitted.
    AssessmentSubmitted,
    /// Emitted when an assessment workflow stage is written.
    AssessmentStageAdvanced,
    /// Emitted when an onboarding request is submitted.
    OnboardingSubmitted,
    /// Emitted when an onboarding request is approved.
    OnboardingApproved,
    /// Emitted when an onboarding request is rejected.
    OnboardingRejected,
    /// Emitted when a master data list is saved.
    MasterDataListSaved,
    /// Emitted when a master data list is deleted.
    MasterDataListDeleted,
    /// Emitted when a message is posted.
    MessagePosted,
    /// Emitted when a role-permission row is saved.
    SecurityRolePermissionSaved,
    /// Emitted when a role-permission row is removed.
    SecurityRolePermissionRemoved,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantCreated => "tenant.created",
            Self::TenantUpdated => "tenant.updated",
            Self::VendorCreated => "vendor.created",
            Self::VendorUpdated => "vendor.updated",
            Self::VendorDeleted => "vendor.deleted",
            Self::VendorStageAdvanced => "vendor.stage.advanced",
            Self::AgentCreated => "agent.created",
            Self::AgentUpdated => "agent.updated",
            Self::AgentDeleted => "agent.deleted",
            Self::AgentStageAdvanced => "agent.stage.advanced",
            Self::AssessmentAssigned => "assessment.assigned",
            Self::AssessmentSubmitted => "assessment.submitted",
            Self::AssessmentStageAdvanced => "assessment.stage.advanced",
            Self::OnboardingSubmitted => "onboarding.submitted",
            Self::OnboardingApproved => "onboarding.approved",
            Self::OnboardingRejected => "onboarding.rejected",
            Self::MasterDataListSaved => "master_data.list.saved",
            Self::MasterDataListDeleted => "master_data.list.deleted",
            Self::MessagePosted => "message.posted",
            Self::SecurityRolePermissionSaved => "security.role_permission.saved",
            Self::SecurityRolePermissionRemoved => "security.role_permission.removed",
        }
    }
}

/// Comparison operator for business-rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessRuleOperator {
    /// Row field must equal the configured value.
    Equals,
    /// Row field must not equal the configured value.
    NotEquals,
}

impl BusinessRuleOperator {
    /// Returns a stable storage value for this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
        }
    }
}

impl FromStr for BusinessRuleOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            _ => Err(AppError::Validation(format!(
                "unknown business rule operator '{value}'"
            ))),
        }
    }
}

/// Stored condition referenced by business-rule data filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRuleCondition {
    /// Row field the condition evaluates.
    pub field: String,
    /// Comparison operator.
    pub operator: BusinessRuleOperator,
    /// Comparison value.
    pub value: Value,
}

/// Reference that narrows which rows a role may see beyond the base grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataFilterRule {
    /// Restricts rows to values drawn from a master data list.
    MasterDataList {
        /// Tenant-scoped list name.
        list_name: String,
        /// Row field compared against the active list values.
        field: String,
    },
    /// Restricts rows through a stored business rule condition.
    BusinessRule {
        /// Tenant-scoped rule key.
        rule_key: String,
    },
}

/// Resolved row-level restriction applied to repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    /// Row field value must be one of the allowed values.
    In {
        /// Row field the filter evaluates.
        field: String,
        /// Allowed values.
        values: Vec<Value>,
    },
    /// Row field value must not be one of the excluded values.
    NotIn {
        /// Row field the filter evaluates.
        field: String,
        /// Excluded values.
        values: Vec<Value>,
    },
}

impl RowFilter {
    /// Returns whether a row field value passes the filter.
    #[must_use]
    pub fn matches(&self, row_value: &Value) -> bool {
        match self {
            Self::In { values, .. } => values.iter().any(|value| value == row_value),
            Self::NotIn { values, .. } => values.iter().all(|value| value != row_value),
        }
    }

    /// Returns the row field the filter evaluates.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::In { field, .. } | Self::NotIn { field, .. } => field.as_str(),
        }
    }
}

impl BusinessRuleCondition {
    /// Converts the condition into a resolved row filter.
    #[must_use]
    pub fn to_row_filter(&self) -> RowFilter {
        match self.operator {
            BusinessRuleOperator::Equals => RowFilter::In {
                field: self.field.clone(),
                values: vec![self.value.clone()],
            },
            BusinessRuleOperator::NotEquals => RowFilter::NotIn {
                field: self.field.clone(),
                values: vec![self.value.clone()],
            },
        }
    }
}

/// Validates that a serialized data filter rule is well formed.
pub fn validate_data_filter(rule: &DataFilterRule) -> AppResult<()> {
    match rule {
        DataFilterRule::MasterDataList { list_name, field } => {
            if list_name.trim().is_empty() {
                return Err(AppError::Validation(
                    "data filter list_name must not be empty".to_owned(),
                ));
            }
            if field.trim().is_empty() {
                return Err(AppError::Validation(
                    "data filter field must not be empty".to_owned(),
                ));
            }

            Ok(())
        }
        DataFilterRule::BusinessRule { rule_key } => {
            if rule_key.trim().is_empty() {
                return Err(AppError::Validation(
                    "data filter rule_key must not be empty".to_owned(),
                ));
            }

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::{
        BusinessRuleCondition, BusinessRuleOperator, DataFilterRule, Permission, RowFilter,
        validate_data_filter,
    };

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            let restored = Permission::from_str(permission.as_str());
            assert_eq!(restored.ok(), Some(*permission));
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(Permission::from_str("vendor.unknown").is_err());
    }

    #[test]
    fn permission_keys_are_unique() {
        let mut keys: Vec<&str> = Permission::all().iter().map(Permission::as_str).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Permission::all().len());
    }

    #[test]
    fn row_filter_in_matches_listed_values() {
        let filter = RowFilter::In {
            field: "risk_tier".to_owned(),
            values: vec![json!("high"), json!("critical")],
        };

        assert!(filter.matches(&json!("high")));
        assert!(!filter.matches(&json!("low")));
    }

    #[test]
    fn not_equals_condition_excludes_value() {
        let condition = BusinessRuleCondition {
            field: "category".to_owned(),
            operator: BusinessRuleOperator::NotEquals,
            value: json!("internal"),
        };

        let filter = condition.to_row_filter();
        assert!(!filter.matches(&json!("internal")));
        assert!(filter.matches(&json!("cloud")));
    }

    #[test]
    fn blank_filter_reference_is_rejected() {
        let rule = DataFilterRule::BusinessRule {
            rule_key: "  ".to_owned(),
        };
        assert!(validate_data_filter(&rule).is_err());
    }
}
