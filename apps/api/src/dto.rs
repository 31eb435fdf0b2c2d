//! Request and response payloads with generated TypeScript bindings.

mod agents;
mod assessments;
mod common;
mod master_data;
mod messages;
mod onboarding;
mod security;
mod tenants;
mod vendors;

pub use agents::{AgentResponse, SaveAgentRequest};
pub use assessments::{AssessmentResponse, AssignAssessmentRequest, SubmitResponsesRequest};
pub use common::{AdvanceStageRequest, MeResponse};
pub use master_data::{MasterDataListResponse, MasterDataValuePayload, SaveMasterDataListRequest};
pub use messages::{MessageResponse, PostMessageRequest};
pub use onboarding::{
    DecideOnboardingRequest, OnboardingRequestResponse, SubmitOnboardingRequest,
};
pub use security::{
    AuditLogEntryResponse, RemoveRolePermissionRequest, RolePermissionResponse,
    SaveRolePermissionRequest,
};
pub use tenants::{SaveTenantRequest, TenantResponse};
pub use vendors::{SaveVendorRequest, VendorResponse};

#[cfg(test)]
mod tests {
    use ts_rs::{Config, TS};

    use super::{
        AdvanceStageRequest, AgentResponse, AssessmentResponse, AssignAssessmentRequest,
        AuditLogEntryResponse, DecideOnboardingRequest, MasterDataListResponse,
        MasterDataValuePayload, MeResponse, MessageResponse, OnboardingRequestResponse,
        PostMessageRequest, RemoveRolePermissionRequest, RolePermissionResponse, SaveAgentRequest,
        SaveMasterDataListRequest, SaveRolePermissionRequest, SaveTenantRequest, SaveVendorRequest,
        SubmitOnboardingRequest, SubmitResponsesRequest, TenantResponse, VendorResponse,
    };
    use crate::error::ErrorResponse;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        AdvanceStageRequest::export(&config)?;
        MeResponse::export(&config)?;
        TenantResponse::export(&config)?;
        SaveTenantRequest::export(&config)?;
        VendorResponse::export(&config)?;
        SaveVendorRequest::export(&config)?;
        AgentResponse::export(&config)?;
        SaveAgentRequest::export(&config)?;
        AssessmentResponse::export(&config)?;
        AssignAssessmentRequest::export(&config)?;
        SubmitResponsesRequest::export(&config)?;
        OnboardingRequestResponse::export(&config)?;
        SubmitOnboardingRequest::export(&config)?;
        DecideOnboardingRequest::export(&config)?;
        MasterDataListResponse::export(&config)?;
        MasterDataValuePayload::export(&config)?;
        SaveMasterDataListRequest::export(&config)?;
        MessageResponse::export(&config)?;
        PostMessageRequest::export(&config)?;
        RolePermissionResponse::export(&config)?;
        SaveRolePermissionRequest::export(&config)?;
        RemoveRolePermissionRequest::export(&config)?;
        AuditLogEntryResponse::export(&config)?;
        ErrorResponse::export(&config)?;

        Ok(())
    }
}
