use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity};
use veritrail_domain::{
    AssessmentAssignmentSpec, AuditAction, LayoutType, Permission, WorkflowStage,
    validate_responses,
};

use crate::{AuditEvent, AuthorizationService, apply_row_filter, row_passes_filter};

/// Assessment assignment projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentRecord {
    /// Stable assignment identifier.
    pub assessment_id: String,
    /// Stable questionnaire key.
    pub questionnaire_key: String,
    /// Kind of record assessed.
    pub target: String,
    /// Identifier of the assessed record.
    pub target_id: String,
    /// Subject expected to complete the questionnaire.
    pub assignee_subject: String,
    /// Optional due date in ISO 8601.
    pub due_date: Option<String>,
    /// Free-form workflow stage.
    pub workflow_stage: String,
    /// Submitted responses, when present.
    pub responses: Option<Value>,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

/// Repository port for assessment assignment persistence.
///
/// Mutations persist the given audit event atomically with the row change.
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Lists assignments in tenant scope.
    async fn list_assessments(&self, tenant_id: TenantId) -> AppResult<Vec<AssessmentRecord>>;

    /// Finds one assignment by identifier.
    async fn find_assessment(
        &self,
        tenant_id: TenantId,
        assessment_id: &str,
    ) -> AppResult<Option<AssessmentRecord>>;

    /// Inserts an assignment in the draft stage.
    async fn create_assessment(
        &self,
        tenant_id: TenantId,
        spec: AssessmentAssignmentSpec,
        audit: AuditEvent,
    ) -> AppResult<AssessmentRecord>;

    /// Stores submitted responses and moves the assignment to `submitted`.
    async fn save_responses(
        &self,
        tenant_id: TenantId,
        assessment_id: &str,
        responses: Value,
        audit: AuditEvent,
    ) -> AppResult<AssessmentRecord>;

    /// Writes the workflow stage of an existing assignment.
    async fn set_assessment_stage(
        &self,
        tenant_id: TenantId,
        assessment_id: &str,
        stage: &WorkflowStage,
        audit: AuditEvent,
    ) -> AppResult<AssessmentRecord>;
}

/// Application service for questionnaire assignment workflows.
#[derive(Clone)]
pub struct AssessmentService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn AssessmentRepository>,
}

impl AssessmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Lists assignments visible to the actor after row filtering.
    pub async fn list_assessments(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<AssessmentRecord>> {
        let filter = self
            .authorization_service
            .require_access(actor, Permission::AssessmentRead)
            .await?;

        let assessments = self
            .repository
            .list_assessments(actor.tenant_scope())
            .await?;
        apply_row_filter(assessments, filter.as_ref())
    }

    /// Returns one assignment, hiding rows excluded by the actor's row filter.
    pub async fn get_assessment(
        &self,
        actor: &UserIdentity,
        assessment_id: &str,
    ) -> AppResult<AssessmentRecord> {
        let filter = self
            .authorization_service
            .require_access(actor, Permission::AssessmentRead)
            .await?;

        let assessment = self
            .repository
            .find_assessment(actor.tenant_scope(), assessment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("assessment '{assessment_id}' not found"))
            })?;

        if let Some(filter) = filter.as_ref()
            && !row_passes_filter(&assessment, filter)?
        {
            return Err(AppError::NotFound(format!(
                "assessment '{assessment_id}' not found"
            )));
        }

        Ok(assessment)
    }

    /// Assigns a questionnaire, recording the audit event in the same
    /// transaction.
    pub async fn assign_assessment(
        &self,
        actor: &UserIdentity,
        spec: AssessmentAssignmentSpec,
    ) -> AppResult<AssessmentRecord> {
        self.authorization_service
            .require_permission(actor, Permission::AssessmentAssign)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::AssessmentAssigned,
            Some(format!(
                "assigned questionnaire '{}' to '{}'",
                spec.questionnaire_key().as_str(),
                spec.assignee_subject().as_str()
            )),
        );
        self.repository
            .create_assessment(actor.tenant_scope(), spec, audit)
            .await
    }

    /// Stores questionnaire responses submitted by the assignee.
    ///
    /// Only the assigned subject may submit, and an assignment whose stage
    /// already maps to the completed layout rejects further submissions.
    pub async fn submit_responses(
        &self,
        actor: &UserIdentity,
        assessment_id: &str,
        responses: Value,
    ) -> AppResult<AssessmentRecord> {
        self.authorization_service
            .require_permission(actor, Permission::AssessmentSubmit)
            .await?;

        validate_responses(&responses)?;

        let assessment = self
            .repository
            .find_assessment(actor.tenant_scope(), assessment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("assessment '{assessment_id}' not found"))
            })?;

        if assessment.assignee_subject != actor.subject() {
            return Err(AppError::Forbidden(format!(
                "assessment '{assessment_id}' is assigned to '{}'",
                assessment.assignee_subject
            )));
        }

        if LayoutType::for_stage(&assessment.workflow_stage) == LayoutType::Completed {
            return Err(AppError::Conflict(format!(
                "assessment '{assessment_id}' is already completed"
            )));
        }

        let audit = AuditEvent::by(
            actor,
            AuditAction::AssessmentSubmitted,
            Some(format!(
                "submitted responses for questionnaire '{}'",
                assessment.questionnaire_key
            )),
        );
        self.repository
            .save_responses(actor.tenant_scope(), assessment_id, responses, audit)
            .await
    }

    /// Writes the assignment workflow stage, recording the audit event
    /// atomically.
    pub async fn advance_stage(
        &self,
        actor: &UserIdentity,
        assessment_id: &str,
        stage: WorkflowStage,
    ) -> AppResult<AssessmentRecord> {
        self.authorization_service
            .require_permission(actor, Permission::AssessmentStageAdvance)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::AssessmentStageAdvanced,
            Some(format!("moved assessment to stage '{}'", stage.as_str())),
        );
        self.repository
            .set_assessment_stage(actor.tenant_scope(), assessment_id, &stage, audit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::Mutex;
    use veritrail_core::{AppError, AppResult, TenantId, UserIdentity, UserRole};
    use veritrail_domain::{
        AssessmentAssignmentSpec, BusinessRuleCondition, Permission, WorkflowStage,
    };

    use crate::{
        AuditEvent, AuthorizationRepository, AuthorizationService, DataFilterSourceRepository,
        RoleGrant,
    };

    use super::{AssessmentRecord, AssessmentRepository, AssessmentService};

    struct FakeAuthorizationRepository {
        grants: Vec<RoleGrant>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_role_grants(
            &self,
            _tenant_id: TenantId,
            _role: UserRole,
        ) -> AppResult<Vec<RoleGrant>> {
            Ok(self.grants.clone())
        }
    }

    struct FakeFilterSources;

    #[async_trait]
    impl DataFilterSourceRepository for FakeFilterSources {
        async fn list_active_list_values(
            &self,
            _tenant_id: TenantId,
            _list_name: &str,
        ) -> AppResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn find_business_rule_condition(
            &self,
            _tenant_id: TenantId,
            _rule_key: &str,
        ) -> AppResult<Option<BusinessRuleCondition>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct FakeAssessmentRepository {
        assessments: Mutex<Vec<AssessmentRecord>>,
        events: Mutex<Vec<AuditEvent>>,
    }

    fn record(assessment_id: &str, assignee: &str, stage: &str) -> AssessmentRecord {
        AssessmentRecord {
            assessment_id: assessment_id.to_owned(),
            questionnaire_key: "soc2_lite".to_owned(),
            target: "vendor".to_owned(),
            target_id: "v-1".to_owned(),
            assignee_subject: assignee.to_owned(),
            due_date: None,
            workflow_stage: stage.to_owned(),
            responses: None,
            created_at: "2026-01-01T00:00:00Z".to_owned(),
            updated_at: "2026-01-01T00:00:00Z".to_owned(),
        }
    }

    #[async_trait]
    impl AssessmentRepository for FakeAssessmentRepository {
        async fn list_assessments(
            &self,
            _tenant_id: TenantId,
        ) -> AppResult<Vec<AssessmentRecord>> {
            Ok(self.assessments.lock().await.clone())
        }

        async fn find_assessment(
            &self,
            _tenant_id: TenantId,
            assessment_id: &str,
        ) -> AppResult<Option<AssessmentRecord>> {
            Ok(self
                .assessments
                .lock()
                .await
                .iter()
                .find(|assessment| assessment.assessment_id == assessment_id)
                .cloned())
        }

        async fn create_assessment(
            &self,
            _tenant_id: TenantId,
            spec: AssessmentAssignmentSpec,
            audit: AuditEvent,
        ) -> AppResult<AssessmentRecord> {
            self.events.lock().await.push(audit);
            let assessment = AssessmentRecord {
                assessment_id: "as-1".to_owned(),
                questionnaire_key: spec.questionnaire_key().as_str().to_owned(),
                target: spec.target().as_str().to_owned(),
                target_id: spec.target_id().to_owned(),
                assignee_subject: spec.assignee_subject().as_str().to_owned(),
                due_date: spec.due_date().map(|date| date.to_string()),
                workflow_stage: "draft".to_owned(),
                responses: None,
                created_at: "2026-01-01T00:00:00Z".to_owned(),
                updated_at: "2026-01-01T00:00:00Z".to_owned(),
            };
            self.assessments.lock().await.push(assessment.clone());
            Ok(assessment)
        }

        async fn save_responses(
            &self,
            _tenant_id: TenantId,
            assessment_id: &str,
            responses: Value,
            audit: AuditEvent,
        ) -> AppResult<AssessmentRecord> {
            self.events.lock().await.push(audit);
            let mut assessments = self.assessments.lock().await;
            let assessment = assessments
                .iter_mut()
                .find(|assessment| assessment.assessment_id == assessment_id)
                .ok_or_else(|| AppError::NotFound("assessment not found".to_owned()))?;
            assessment.responses = Some(responses);
            assessment.workflow_stage = "submitted".to_owned();
            Ok(assessment.clone())
        }

        async fn set_assessment_stage(
            &self,
            _tenant_id: TenantId,
            assessment_id: &str,
            stage: &WorkflowStage,
            audit: AuditEvent,
        ) -> AppResult<AssessmentRecord> {
            self.events.lock().await.push(audit);
            let mut assessments = self.assessments.lock().await;
            let assessment = assessments
                .iter_mut()
                .find(|assessment| assessment.assessment_id == assessment_id)
                .ok_or_else(|| AppError::NotFound("assessment not found".to_owned()))?;
            assessment.workflow_stage = stage.as_str().to_owned();
            Ok(assessment.clone())
        }
    }

    fn actor(subject: &str) -> UserIdentity {
        UserIdentity::new(
            subject,
            subject,
            None,
            UserRole::EndUser,
            Some(TenantId::new()),
        )
        .unwrap_or_else(|_| panic!("test"))
    }

    fn service(
        grants: Vec<RoleGrant>,
        repository: Arc<FakeAssessmentRepository>,
    ) -> AssessmentService {
        let authorization_service = AuthorizationService::new(
            Arc::new(FakeAuthorizationRepository { grants }),
            Arc::new(FakeFilterSources),
        );
        AssessmentService::new(authorization_service, repository)
    }

    fn grant(permission: Permission) -> RoleGrant {
        RoleGrant {
            permission,
            allowed: true,
            data_filter: None,
            tenant_scoped: true,
        }
    }

    #[tokio::test]
    async fn submit_by_non_assignee_is_forbidden() {
        let repository = Arc::new(FakeAssessmentRepository::default());
        repository
            .assessments
            .lock()
            .await
            .push(record("as-1", "bob", "draft"));

        let service = service(vec![grant(Permission::AssessmentSubmit)], repository);

        let result = service
            .submit_responses(&actor("mallory"), "as-1", json!({"q1": "yes"}))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn submit_on_completed_assessment_conflicts() {
        let repository = Arc::new(FakeAssessmentRepository::default());
        repository
            .assessments
            .lock()
            .await
            .push(record("as-1", "bob", "approved"));

        let service = service(vec![grant(Permission::AssessmentSubmit)], repository);

        let result = service
            .submit_responses(&actor("bob"), "as-1", json!({"q1": "yes"}))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn submit_moves_assessment_to_submitted_and_audits() {
        let repository = Arc::new(FakeAssessmentRepository::default());
        repository
            .assessments
            .lock()
            .await
            .push(record("as-1", "bob", "draft"));

        let service = service(
            vec![grant(Permission::AssessmentSubmit)],
            repository.clone(),
        );

        let result = service
            .submit_responses(&actor("bob"), "as-1", json!({"q1": "yes"}))
            .await;
        assert!(result.is_ok());
        assert_eq!(
            result.unwrap_or_else(|_| panic!("test")).workflow_stage,
            "submitted"
        );
        assert_eq!(repository.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn empty_responses_are_rejected_before_persistence() {
        let repository = Arc::new(FakeAssessmentRepository::default());
        repository
            .assessments
            .lock()
            .await
            .push(record("as-1", "bob", "draft"));

        let service = service(vec![grant(Permission::AssessmentSubmit)], repository);

        let result = service.submit_responses(&actor("bob"), "as-1", json!({})).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
