//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod agent;
mod assessment;
mod master_data;
mod message;
mod onboarding;
mod security;
mod tenant;
mod user;
mod vendor;
mod workflow;

pub use agent::{AgentProfile, AgentProfileInput};
pub use assessment::{
    AssessmentAssignmentSpec, AssessmentAssignmentSpecInput, AssessmentTarget, validate_responses,
};
pub use master_data::{
    MasterDataList, MasterDataListInput, MasterDataValue, MasterDataValueInput, SelectionMode,
};
pub use message::{MessageBody, ResourceKind};
pub use onboarding::{
    OnboardingDecision, OnboardingKind, OnboardingRequestSpec, OnboardingRequestSpecInput,
};
pub use security::{
    AuditAction, BusinessRuleCondition, BusinessRuleOperator, DataFilterRule, Permission,
    PermissionCategory, RowFilter, validate_data_filter,
};
pub use tenant::{LicenseTier, TenantProfile, TenantProfileInput};
pub use user::EmailAddress;
pub use vendor::{RiskTier, VendorProfile, VendorProfileInput};
pub use workflow::{LayoutType, WorkflowStage};
