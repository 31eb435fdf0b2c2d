use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity};
use veritrail_domain::{
    AuditAction, LayoutType, OnboardingDecision, OnboardingRequestSpec, Permission,
};

use crate::{AuditEvent, AuthorizationService, apply_row_filter, row_passes_filter};

/// Onboarding request projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardingRecord {
    /// Stable request identifier.
    pub request_id: String,
    /// Kind of record proposed.
    pub kind: String,
    /// Short request title.
    pub title: String,
    /// Why the record should be onboarded.
    pub justification: String,
    /// Proposed record fields.
    pub payload: Value,
    /// Subject who submitted the request.
    pub requested_by: String,
    /// Free-form workflow stage.
    pub workflow_stage: String,
    /// Subject who decided the request, once decided.
    pub decided_by: Option<String>,
    /// Optional note captured with the decision.
    pub decision_note: Option<String>,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

/// Repository port for onboarding request persistence.
///
/// Mutations persist the given audit event atomically with the row change.
#[async_trait]
pub trait OnboardingRepository: Send + Sync {
    /// Lists requests in tenant scope.
    async fn list_requests(&self, tenant_id: TenantId) -> AppResult<Vec<OnboardingRecord>>;

    /// Finds one request by identifier.
    async fn find_request(
        &self,
        tenant_id: TenantId,
        request_id: &str,
    ) -> AppResult<Option<OnboardingRecord>>;

    /// Inserts a request in the submitted stage.
    async fn create_request(
        &self,
        tenant_id: TenantId,
        spec: OnboardingRequestSpec,
        requested_by: &str,
        audit: AuditEvent,
    ) -> AppResult<OnboardingRecord>;

    /// Records a terminal decision against a request.
    async fn record_decision(
        &self,
        tenant_id: TenantId,
        request_id: &str,
        decision: OnboardingDecision,
        decided_by: &str,
        note: Option<String>,
        audit: AuditEvent,
    ) -> AppResult<OnboardingRecord>;
}

/// Application service for onboarding request workflows.
#[derive(Clone)]
pub struct OnboardingService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn OnboardingRepository>,
}

impl OnboardingService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn OnboardingRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Lists requests visible to the actor after row filtering.
    pub async fn list_requests(&self, actor: &UserIdentity) -> AppResult<Vec<OnboardingRecord>> {
        let filter = self
            .authorization_service
            .require_access(actor, Permission::OnboardingRead)
            .await?;

        let requests = self.repository.list_requests(actor.tenant_scope()).await?;
        apply_row_filter(requests, filter.as_ref())
    }

    /// Returns one request, hiding rows excluded by the actor's row filter.
    pub async fn get_request(
        &self,
        actor: &UserIdentity,
        request_id: &str,
    ) -> AppResult<OnboardingRecord> {
        let filter = self
            .authorization_service
            .require_access(actor, Permission::OnboardingRead)
            .await?;

        let request = self
            .repository
            .find_request(actor.tenant_scope(), request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("onboarding request '{request_id}' not found"))
            })?;

        if let Some(filter) = filter.as_ref()
            && !row_passes_filter(&request, filter)?
        {
            return Err(AppError::NotFound(format!(
                "onboarding request '{request_id}' not found"
            )));
        }

        Ok(request)
    }

    /// Submits a new request, recording the audit event in the same
    /// transaction.
    pub async fn submit_request(
        &self,
        actor: &UserIdentity,
        spec: OnboardingRequestSpec,
    ) -> AppResult<OnboardingRecord> {
        self.authorization_service
            .require_permission(actor, Permission::OnboardingSubmit)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::OnboardingSubmitted,
            Some(format!(
                "submitted onboarding request '{}'",
                spec.title().as_str()
            )),
        );
        self.repository
            .create_request(actor.tenant_scope(), spec, actor.subject(), audit)
            .await
    }

    /// Records an approval or rejection with its audit event atomically.
    ///
    /// A request whose stage already maps to the completed layout rejects
    /// further decisions.
    pub async fn decide_request(
        &self,
        actor: &UserIdentity,
        request_id: &str,
        decision: OnboardingDecision,
        note: Option<String>,
    ) -> AppResult<OnboardingRecord> {
        self.authorization_service
            .require_permission(actor, Permission::OnboardingDecide)
            .await?;

        let request = self
            .repository
            .find_request(actor.tenant_scope(), request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("onboarding request '{request_id}' not found"))
            })?;

        if LayoutType::for_stage(&request.workflow_stage) == LayoutType::Completed {
            return Err(AppError::Conflict(format!(
                "onboarding request '{request_id}' is already decided"
            )));
        }

        let action = match decision {
            OnboardingDecision::Approved => AuditAction::OnboardingApproved,
            OnboardingDecision::Rejected => AuditAction::OnboardingRejected,
        };
        let audit = AuditEvent::by(
            actor,
            action,
            Some(format!(
                "decided onboarding request '{}' as '{}'",
                request.title,
                decision.as_stage()
            )),
        );
        self.repository
            .record_decision(
                actor.tenant_scope(),
                request_id,
                decision,
                actor.subject(),
                note,
                audit,
            )
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
        BusinessRuleCondition, OnboardingDecision, OnboardingKind, OnboardingRequestSpec,
        OnboardingRequestSpecInput, Permission,
    };

    use crate::{
        AuditEvent, AuthorizationRepository, AuthorizationService, DataFilterSourceRepository,
        RoleGrant,
    };

    use super::{OnboardingRecord, OnboardingRepository, OnboardingService};

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
    struct FakeOnboardingRepository {
        requests: Mutex<Vec<OnboardingRecord>>,
        events: Mutex<Vec<AuditEvent>>,
    }

    fn record(request_id: &str, stage: &str) -> OnboardingRecord {
        OnboardingRecord {
            request_id: request_id.to_owned(),
            kind: "vendor".to_owned(),
            title: "Onboard Sigma Cloud".to_owned(),
            justification: "Replaces legacy hosting".to_owned(),
            payload: json!({"name": "Sigma Cloud"}),
            requested_by: "bob".to_owned(),
            workflow_stage: stage.to_owned(),
            decided_by: None,
            decision_note: None,
            created_at: "2026-01-01T00:00:00Z".to_owned(),
            updated_at: "2026-01-01T00:00:00Z".to_owned(),
        }
    }

    #[async_trait]
    impl OnboardingRepository for FakeOnboardingRepository {
        async fn list_requests(&self, _tenant_id: TenantId) -> AppResult<Vec<OnboardingRecord>> {
            Ok(self.requests.lock().await.clone())
        }

        async fn find_request(
            &self,
            _tenant_id: TenantId,
            request_id: &str,
        ) -> AppResult<Option<OnboardingRecord>> {
            Ok(self
                .requests
                .lock()
                .await
                .iter()
                .find(|request| request.request_id == request_id)
                .cloned())
        }

        async fn create_request(
            &self,
            _tenant_id: TenantId,
            spec: OnboardingRequestSpec,
            requested_by: &str,
            audit: AuditEvent,
        ) -> AppResult<OnboardingRecord> {
            self.events.lock().await.push(audit);
            let request = OnboardingRecord {
                request_id: "req-1".to_owned(),
                kind: spec.kind().as_str().to_owned(),
                title: spec.title().as_str().to_owned(),
                justification: spec.justification().as_str().to_owned(),
                payload: spec.payload().clone(),
                requested_by: requested_by.to_owned(),
                workflow_stage: "submitted".to_owned(),
                decided_by: None,
                decision_note: None,
                created_at: "2026-01-01T00:00:00Z".to_owned(),
                updated_at: "2026-01-01T00:00:00Z".to_owned(),
            };
            self.requests.lock().await.push(request.clone());
            Ok(request)
        }

        async fn record_decision(
            &self,
            _tenant_id: TenantId,
            request_id: &str,
            decision: OnboardingDecision,
            decided_by: &str,
            note: Option<String>,
            audit: AuditEvent,
        ) -> AppResult<OnboardingRecord> {
            self.events.lock().await.push(audit);
            let mut requests = self.requests.lock().await;
            let request = requests
                .iter_mut()
                .find(|request| request.request_id == request_id)
                .ok_or_else(|| AppError::NotFound("request not found".to_owned()))?;
            request.workflow_stage = decision.as_stage().to_owned();
            request.decided_by = Some(decided_by.to_owned());
            request.decision_note = note;
            Ok(request.clone())
        }
    }

    fn actor(role: UserRole) -> UserIdentity {
        UserIdentity::new("carol", "Carol", None, role, Some(TenantId::new()))
            .unwrap_or_else(|_| panic!("test"))
    }

    fn service(
        grants: Vec<RoleGrant>,
        repository: Arc<FakeOnboardingRepository>,
    ) -> OnboardingService {
        let authorization_service = AuthorizationService::new(
            Arc::new(FakeAuthorizationRepository { grants }),
            Arc::new(FakeFilterSources),
        );
        OnboardingService::new(authorization_service, repository)
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
    async fn submit_request_records_requester_and_audits() {
        let repository = Arc::new(FakeOnboardingRepository::default());
        let service = service(
            vec![grant(Permission::OnboardingSubmit)],
            repository.clone(),
        );

        let spec = OnboardingRequestSpec::new(OnboardingRequestSpecInput {
            kind: OnboardingKind::Agent,
            title: "Onboard triage agent".to_owned(),
            justification: "Automates intake".to_owned(),
            payload: json!({"name": "Triage Agent"}),
        })
        .unwrap_or_else(|_| panic!("test"));

        let result = service.submit_request(&actor(UserRole::EndUser), spec).await;
        assert!(result.is_ok());
        assert_eq!(
            result.unwrap_or_else(|_| panic!("test")).requested_by,
            "carol"
        );
        assert_eq!(repository.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn decide_requires_decide_permission() {
        let repository = Arc::new(FakeOnboardingRepository::default());
        repository
            .requests
            .lock()
            .await
            .push(record("req-1", "submitted"));

        let service = service(Vec::new(), repository);

        let result = service
            .decide_request(
                &actor(UserRole::EndUser),
                "req-1",
                OnboardingDecision::Approved,
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn decided_request_rejects_second_decision() {
        let repository = Arc::new(FakeOnboardingRepository::default());
        repository
            .requests
            .lock()
            .await
            .push(record("req-1", "approved"));

        let service = service(vec![grant(Permission::OnboardingDecide)], repository);

        let result = service
            .decide_request(
                &actor(UserRole::Approver),
                "req-1",
                OnboardingDecision::Rejected,
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn rejection_moves_request_to_rejected_stage() {
        let repository = Arc::new(FakeOnboardingRepository::default());
        repository
            .requests
            .lock()
            .await
            .push(record("req-1", "submitted"));

        let service = service(
            vec![grant(Permission::OnboardingDecide)],
            repository.clone(),
        );

        let result = service
            .decide_request(
                &actor(UserRole::Approver),
                "req-1",
                OnboardingDecision::Rejected,
                Some("insufficient justification".to_owned()),
            )
            .await;
        assert!(result.is_ok());
        let request = result.unwrap_or_else(|_| panic!("test"));
        assert_eq!(request.workflow_stage, "rejected");
        assert_eq!(request.decided_by.as_deref(), Some("carol"));
        assert_eq!(repository.events.lock().await.len(), 1);
    }
}
