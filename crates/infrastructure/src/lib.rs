//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod postgres_agent_repository;
mod postgres_assessment_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_identity_repository;
mod postgres_master_data_repository;
mod postgres_message_repository;
mod postgres_onboarding_repository;
mod postgres_security_admin_repository;
mod postgres_tenant_repository;
mod postgres_vendor_repository;

pub use postgres_agent_repository::PostgresAgentRepository;
pub use postgres_assessment_repository::PostgresAssessmentRepository;
pub use postgres_audit_repository::PostgresAuditLogRepository;
pub use postgres_authorization_repository::{
    PostgresAuthorizationRepository, PostgresDataFilterSourceRepository,
};
pub use postgres_identity_repository::PostgresIdentityRepository;
pub use postgres_master_data_repository::PostgresMasterDataRepository;
pub use postgres_message_repository::PostgresMessageRepository;
pub use postgres_onboarding_repository::PostgresOnboardingRepository;
pub use postgres_security_admin_repository::PostgresSecurityAdminRepository;
pub use postgres_tenant_repository::PostgresTenantRepository;
pub use postgres_vendor_repository::PostgresVendorRepository;
