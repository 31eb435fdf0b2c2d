use metrics_exporter_prometheus::PrometheusHandle;
use veritrail_application::{
    AgentService, AssessmentService, IdentityService, MasterDataService, MessageService,
    OnboardingService, SecurityAdminService, TenantService, VendorService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Bearer token resolution.
    pub identity_service: IdentityService,
    /// Tenant administration.
    pub tenant_service: TenantService,
    /// Vendor lifecycle.
    pub vendor_service: VendorService,
    /// AI agent lifecycle.
    pub agent_service: AgentService,
    /// Assessment assignment lifecycle.
    pub assessment_service: AssessmentService,
    /// Onboarding request lifecycle.
    pub onboarding_service: OnboardingService,
    /// Master data list administration.
    pub master_data_service: MasterDataService,
    /// Resource-attached message threads.
    pub message_service: MessageService,
    /// Role-permission matrix and audit log reads.
    pub security_admin_service: SecurityAdminService,
    /// Rendered by the `/metrics` endpoint.
    pub metrics_handle: PrometheusHandle,
}
