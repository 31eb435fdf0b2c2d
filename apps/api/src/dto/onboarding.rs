use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use veritrail_application::OnboardingRecord;
use veritrail_core::{AppError, AppResult};
use veritrail_domain::{
    LayoutType, OnboardingDecision, OnboardingKind, OnboardingRequestSpec,
    OnboardingRequestSpecInput,
};

/// API representation of an onboarding request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/onboarding-request-response.ts"
)]
pub struct OnboardingRequestResponse {
    /// Stable request identifier.
    pub request_id: String,
    /// Kind of record proposed, vendor or agent.
    pub kind: String,
    /// Short request title.
    pub title: String,
    /// Why the record should be onboarded.
    pub justification: String,
    /// Proposed record fields.
    #[ts(type = "unknown")]
    pub payload: Value,
    /// Subject who submitted the request.
    pub requested_by: String,
    /// Free-form workflow stage.
    pub workflow_stage: String,
    /// Layout derived from the workflow stage.
    pub layout_type: String,
    /// Subject who decided the request, once decided.
    pub decided_by: Option<String>,
    /// Optional note captured with the decision.
    pub decision_note: Option<String>,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

impl From<OnboardingRecord> for OnboardingRequestResponse {
    fn from(value: OnboardingRecord) -> Self {
        let layout_type = LayoutType::for_stage(&value.workflow_stage).as_str().to_owned();
        Self {
            request_id: value.request_id,
            kind: value.kind,
            title: value.title,
            justification: value.justification,
            payload: value.payload,
            requested_by: value.requested_by,
            workflow_stage: value.workflow_stage,
            layout_type,
            decided_by: value.decided_by,
            decision_note: value.decision_note,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Incoming payload for onboarding request submission.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/submit-onboarding-request.ts"
)]
pub struct SubmitOnboardingRequest {
    /// Kind of record proposed, vendor or agent.
    pub kind: String,
    /// Short request title.
    pub title: String,
    /// Why the record should be onboarded.
    pub justification: String,
    /// Proposed record fields.
    #[ts(type = "unknown")]
    pub payload: Value,
}

impl SubmitOnboardingRequest {
    /// Validates the payload into a domain request spec.
    pub fn into_spec(self) -> AppResult<OnboardingRequestSpec> {
        let kind: OnboardingKind = self.kind.parse()?;
        OnboardingRequestSpec::new(OnboardingRequestSpecInput {
            kind,
            title: self.title,
            justification: self.justification,
            payload: self.payload,
        })
    }
}

/// Incoming payload for an onboarding decision.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/decide-onboarding-request.ts"
)]
pub struct DecideOnboardingRequest {
    /// Either `approved` or `rejected`.
    pub decision: String,
    /// Optional note captured with the decision.
    pub note: Option<String>,
}

impl DecideOnboardingRequest {
    /// Parses the decision identifier.
    pub fn decision(&self) -> AppResult<OnboardingDecision> {
        match self.decision.as_str() {
            "approved" => Ok(OnboardingDecision::Approved),
            "rejected" => Ok(OnboardingDecision::Rejected),
            other => Err(AppError::Validation(format!(
                "decision must be 'approved' or 'rejected', got '{other}'"
            ))),
        }
    }
}
