use serde::{Deserialize, Serialize};
use ts_rs::TS;
use veritrail_core::UserIdentity;

/// Incoming payload for workflow stage advancement.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/advance-stage-request.ts"
)]
pub struct AdvanceStageRequest {
    /// Free-form target stage.
    pub stage: String,
}

/// API representation of the authenticated caller.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/me-response.ts"
)]
pub struct MeResponse {
    /// Stable user subject.
    pub subject: String,
    /// Display name.
    pub display_name: String,
    /// Optional email address.
    pub email: Option<String>,
    /// Fixed role identifier.
    pub role: String,
    /// Assigned tenant, absent for platform administrators.
    pub tenant_id: Option<String>,
}

impl From<UserIdentity> for MeResponse {
    fn from(value: UserIdentity) -> Self {
        Self {
            subject: value.subject().to_owned(),
            display_name: value.display_name().to_owned(),
            email: value.email().map(str::to_owned),
            role: value.role().as_str().to_owned(),
            tenant_id: value.assigned_tenant_id().map(|id| id.to_string()),
        }
    }
}
