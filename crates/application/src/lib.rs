//! Application services orchestrating domain invariants over repository ports.

#![forbid(unsafe_code)]

mod agent_service;
mod assessment_service;
mod audit;
mod authorization_service;
mod identity;
mod master_data_service;
mod message_service;
mod onboarding_service;
mod security_admin_service;
mod tenant_service;
mod vendor_service;

pub use agent_service::{AgentRecord, AgentRepository, AgentService};
pub use assessment_service::{AssessmentRecord, AssessmentRepository, AssessmentService};
pub use audit::AuditEvent;
pub use authorization_service::{
    AuthorizationRepository, AuthorizationService, DataFilterSourceRepository, RoleGrant,
    apply_row_filter, row_passes_filter,
};
pub use identity::{IdentityRepository, IdentityService, token_digest};
pub use master_data_service::{MasterDataRepository, MasterDataService};
pub use message_service::{MessageRecord, MessageRepository, MessageService, PostMessageInput};
pub use onboarding_service::{OnboardingRecord, OnboardingRepository, OnboardingService};
pub use security_admin_service::{
    AuditLogEntry, AuditLogQuery, AuditLogRepository, RolePermissionRecord,
    SaveRolePermissionInput, SecurityAdminRepository, SecurityAdminService,
};
pub use tenant_service::{TenantRecord, TenantRepository, TenantService};
pub use vendor_service::{VendorRecord, VendorRepository, VendorService};
