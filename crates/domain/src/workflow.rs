use serde::{Deserialize, Serialize};
use veritrail_core::{AppError, AppResult};

/// UI rendering mode derived from a workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    /// Requester-facing form layout.
    Submission,
    /// Reviewer/approver layout.
    Approver,
    /// Read-only terminal layout.
    Completed,
}

impl LayoutType {
    /// Returns a stable storage value for this layout.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Approver => "approver",
            Self::Completed => "completed",
        }
    }

    /// Maps a workflow stage string to its layout.
    ///
    /// Stages outside the known vocabulary default to [`LayoutType::Submission`].
    #[must_use]
    pub fn for_stage(stage: &str) -> Self {
        match stage {
            "draft" | "returned" | "resubmission" => Self::Submission,
            "submitted" | "screening" | "risk_review" | "compliance_review"
            | "pending_approval" => Self::Approver,
            "approved" | "rejected" | "completed" | "archived" => Self::Completed,
            _ => Self::Submission,
        }
    }
}

/// Validated workflow stage label.
///
/// Stage values are free-form by design: the platform records whatever stage a
/// permitted caller writes and only the layout mapping interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowStage(String);

impl WorkflowStage {
    /// Initial stage for newly created workflow-bearing entities.
    #[must_use]
    pub fn draft() -> Self {
        Self("draft".to_owned())
    }

    /// Stage written when a requester submits an item for review.
    #[must_use]
    pub fn submitted() -> Self {
        Self("submitted".to_owned())
    }

    /// Terminal stage written when an approver accepts an item.
    #[must_use]
    pub fn approved() -> Self {
        Self("approved".to_owned())
    }

    /// Terminal stage written when an approver rejects an item.
    #[must_use]
    pub fn rejected() -> Self {
        Self("rejected".to_owned())
    }

    /// Creates a stage from a caller-provided label.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "workflow stage must not be empty".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the stage label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the layout derived from this stage.
    #[must_use]
    pub fn layout(&self) -> LayoutType {
        LayoutType::for_stage(self.0.as_str())
    }
}

impl From<WorkflowStage> for String {
    fn from(value: WorkflowStage) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutType, WorkflowStage};

    #[test]
    fn review_stages_render_approver_layout() {
        assert_eq!(LayoutType::for_stage("risk_review"), LayoutType::Approver);
        assert_eq!(
            LayoutType::for_stage("pending_approval"),
            LayoutType::Approver
        );
    }

    #[test]
    fn terminal_stages_render_completed_layout() {
        assert_eq!(LayoutType::for_stage("approved"), LayoutType::Completed);
        assert_eq!(LayoutType::for_stage("rejected"), LayoutType::Completed);
    }

    #[test]
    fn unknown_stage_defaults_to_submission_layout() {
        assert_eq!(
            LayoutType::for_stage("some_custom_stage"),
            LayoutType::Submission
        );
        assert_eq!(LayoutType::for_stage(""), LayoutType::Submission);
    }

    #[test]
    fn stage_rejects_blank_labels() {
        assert!(WorkflowStage::new("   ").is_err());
    }

    #[test]
    fn stage_trims_whitespace() {
        let stage = WorkflowStage::new("  screening ");
        assert!(stage.is_ok());
        let stage = stage.unwrap_or_else(|_| panic!("test"));
        assert_eq!(stage.as_str(), "screening");
        assert_eq!(stage.layout(), LayoutType::Approver);
    }
}
