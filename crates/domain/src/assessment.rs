use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use veritrail_core::{AppError, AppResult, NonEmptyString};

/// Kind of record an assessment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentTarget {
    /// Assessment of a vendor.
    Vendor,
    /// Assessment of an AI agent.
    Agent,
}

impl AssessmentTarget {
    /// Returns a stable storage value for this target kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Agent => "agent",
        }
    }
}

impl FromStr for AssessmentTarget {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "vendor" => Ok(Self::Vendor),
            "agent" => Ok(Self::Agent),
            _ => Err(AppError::Validation(format!(
                "unknown assessment target '{value}'"
            ))),
        }
    }
}

/// Validated questionnaire assignment specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentAssignmentSpec {
    questionnaire_key: NonEmptyString,
    target: AssessmentTarget,
    target_id: String,
    assignee_subject: NonEmptyString,
    due_date: Option<NaiveDate>,
}

/// Input payload used to construct a validated assignment specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentAssignmentSpecInput {
    /// Stable questionnaire key, e.g. `soc2_lite`.
    pub questionnaire_key: String,
    /// Kind of record assessed.
    pub target: AssessmentTarget,
    /// Identifier of the assessed record.
    pub target_id: String,
    /// Subject expected to complete the questionnaire.
    pub assignee_subject: String,
    /// Optional completion due date.
    pub due_date: Option<NaiveDate>,
}

impl AssessmentAssignmentSpec {
    /// Creates a validated assignment specification.
    pub fn new(input: AssessmentAssignmentSpecInput) -> AppResult<Self> {
        let AssessmentAssignmentSpecInput {
            questionnaire_key,
            target,
            target_id,
            assignee_subject,
            due_date,
        } = input;

        let target_id = target_id.trim().to_owned();
        if target_id.is_empty() {
            return Err(AppError::Validation(
                "assessment target_id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            questionnaire_key: NonEmptyString::new(questionnaire_key)?,
            target,
            target_id,
            assignee_subject: NonEmptyString::new(assignee_subject)?,
            due_date,
        })
    }

    /// Returns the questionnaire key.
    #[must_use]
    pub fn questionnaire_key(&self) -> &NonEmptyString {
        &self.questionnaire_key
    }

    /// Returns the kind of record assessed.
    #[must_use]
    pub fn target(&self) -> AssessmentTarget {
        self.target
    }

    /// Returns the identifier of the assessed record.
    #[must_use]
    pub fn target_id(&self) -> &str {
        self.target_id.as_str()
    }

    /// Returns the assignee subject.
    #[must_use]
    pub fn assignee_subject(&self) -> &NonEmptyString {
        &self.assignee_subject
    }

    /// Returns the optional completion due date.
    #[must_use]
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
}

/// Validates a submitted questionnaire response payload.
///
/// Responses are semi-structured: a non-empty JSON object keyed by question
/// identifier.
pub fn validate_responses(responses: &Value) -> AppResult<()> {
    let Some(map) = responses.as_object() else {
        return Err(AppError::Validation(
            "questionnaire responses must be a JSON object".to_owned(),
        ));
    };

    if map.is_empty() {
        return Err(AppError::Validation(
            "questionnaire responses must not be empty".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        AssessmentAssignmentSpec, AssessmentAssignmentSpecInput, AssessmentTarget,
        validate_responses,
    };

    fn input() -> AssessmentAssignmentSpecInput {
        AssessmentAssignmentSpecInput {
            questionnaire_key: "soc2_lite".to_owned(),
            target: AssessmentTarget::Vendor,
            target_id: "vendor-1".to_owned(),
            assignee_subject: "bob".to_owned(),
            due_date: None,
        }
    }

    #[test]
    fn blank_target_id_is_rejected() {
        let spec = AssessmentAssignmentSpec::new(AssessmentAssignmentSpecInput {
            target_id: "  ".to_owned(),
            ..input()
        });
        assert!(spec.is_err());
    }

    #[test]
    fn non_object_responses_are_rejected() {
        assert!(validate_responses(&json!(["a", "b"])).is_err());
    }

    #[test]
    fn empty_responses_are_rejected() {
        assert!(validate_responses(&json!({})).is_err());
    }

    #[test]
    fn object_responses_are_accepted() {
        assert!(validate_responses(&json!({"q1": "yes"})).is_ok());
    }
}
