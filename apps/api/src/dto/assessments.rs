use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use veritrail_application::AssessmentRecord;
use veritrail_core::{AppError, AppResult};
use veritrail_domain::{
    AssessmentAssignmentSpec, AssessmentAssignmentSpecInput, AssessmentTarget, LayoutType,
};

/// API representation of an assessment assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assessment-response.ts"
)]
pub struct AssessmentResponse {
    /// Stable assignment identifier.
    pub assessment_id: String,
    /// Questionnaire template key.
    pub questionnaire_key: String,
    /// Target kind, vendor or agent.
    pub target: String,
    /// Target record identifier.
    pub target_id: String,
    /// Assigned subject.
    pub assignee_subject: String,
    /// Optional due date as `YYYY-MM-DD`.
    pub due_date: Option<String>,
    /// Free-form workflow stage.
    pub workflow_stage: String,
    /// Layout derived from the workflow stage.
    pub layout_type: String,
    /// Submitted responses, if any.
    #[ts(type = "unknown | null")]
    pub responses: Option<Value>,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

impl From<AssessmentRecord> for AssessmentResponse {
    fn from(value: AssessmentRecord) -> Self {
        let layout_type = LayoutType::for_stage(&value.workflow_stage).as_str().to_owned();
        Self {
            assessment_id: value.assessment_id,
            questionnaire_key: value.questionnaire_key,
            target: value.target,
            target_id: value.target_id,
            assignee_subject: value.assignee_subject,
            due_date: value.due_date,
            workflow_stage: value.workflow_stage,
            layout_type,
            responses: value.responses,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Incoming payload for questionnaire assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assign-assessment-request.ts"
)]
pub struct AssignAssessmentRequest {
    /// Questionnaire template key.
    pub questionnaire_key: String,
    /// Target kind, vendor or agent.
    pub target: String,
    /// Target record identifier.
    pub target_id: String,
    /// Assigned subject.
    pub assignee_subject: String,
    /// Optional due date as `YYYY-MM-DD`.
    pub due_date: Option<String>,
}

impl AssignAssessmentRequest {
    /// Validates the payload into a domain assignment spec.
    pub fn into_spec(self) -> AppResult<AssessmentAssignmentSpec> {
        let target: AssessmentTarget = self.target.parse()?;
        let due_date = self
            .due_date
            .as_deref()
            .map(|value| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                    AppError::Validation(format!(
                        "due date '{value}' must use the YYYY-MM-DD format"
                    ))
                })
            })
            .transpose()?;

        AssessmentAssignmentSpec::new(AssessmentAssignmentSpecInput {
            questionnaire_key: self.questionnaire_key,
            target,
            target_id: self.target_id,
            assignee_subject: self.assignee_subject,
            due_date,
        })
    }
}

/// Incoming payload for questionnaire response submission.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/submit-responses-request.ts"
)]
pub struct SubmitResponsesRequest {
    /// Questionnaire responses keyed by question.
    #[ts(type = "unknown")]
    pub responses: Value,
}
