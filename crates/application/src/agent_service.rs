use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity};
use veritrail_domain::{AgentProfile, AuditAction, Permission, WorkflowStage};

use crate::{AuditEvent, AuthorizationService, apply_row_filter, row_passes_filter};

/// AI agent projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentRecord {
    /// Stable agent identifier.
    pub agent_id: String,
    /// Agent display name.
    pub name: String,
    /// Provider or platform operating the agent.
    pub provider: String,
    /// Optional underlying model identifier.
    pub model: Option<String>,
    /// Declared capability labels.
    pub capabilities: Vec<String>,
    /// Risk classification storage value.
    pub risk_tier: String,
    /// Subject accountable for the agent.
    pub owner_subject: String,
    /// Free-form workflow stage.
    pub workflow_stage: String,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

/// Repository port for AI agent persistence.
///
/// Mutations persist the given audit event atomically with the row change.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Lists agents in tenant scope.
    async fn list_agents(&self, tenant_id: TenantId) -> AppResult<Vec<AgentRecord>>;

    /// Finds one agent by identifier.
    async fn find_agent(
        &self,
        tenant_id: TenantId,
        agent_id: &str,
    ) -> AppResult<Option<AgentRecord>>;

    /// Registers an agent in the draft stage.
    async fn create_agent(
        &self,
        tenant_id: TenantId,
        profile: AgentProfile,
        audit: AuditEvent,
    ) -> AppResult<AgentRecord>;

    /// Replaces the profile fields of an existing agent.
    async fn update_agent(
        &self,
        tenant_id: TenantId,
        agent_id: &str,
        profile: AgentProfile,
        audit: AuditEvent,
    ) -> AppResult<AgentRecord>;

    /// Writes the workflow stage of an existing agent.
    async fn set_agent_stage(
        &self,
        tenant_id: TenantId,
        agent_id: &str,
        stage: &WorkflowStage,
        audit: AuditEvent,
    ) -> AppResult<AgentRecord>;

    /// Deletes an agent record.
    async fn delete_agent(
        &self,
        tenant_id: TenantId,
        agent_id: &str,
        audit: AuditEvent,
    ) -> AppResult<()>;
}

/// Application service for the AI agent registry.
#[derive(Clone)]
pub struct AgentService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn AgentRepository>,
}

impl AgentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn AgentRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Lists agents visible to the actor after row filtering.
    pub async fn list_agents(&self, actor: &UserIdentity) -> AppResult<Vec<AgentRecord>> {
        let filter = self
            .authorization_service
            .require_access(actor, Permission::AgentRead)
            .await?;

        let agents = self.repository.list_agents(actor.tenant_scope()).await?;
        apply_row_filter(agents, filter.as_ref())
    }

    /// Returns one agent, hiding rows excluded by the actor's row filter.
    pub async fn get_agent(&self, actor: &UserIdentity, agent_id: &str) -> AppResult<AgentRecord> {
        let filter = self
            .authorization_service
            .require_access(actor, Permission::AgentRead)
            .await?;

        let agent = self
            .repository
            .find_agent(actor.tenant_scope(), agent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("agent '{agent_id}' not found")))?;

        if let Some(filter) = filter.as_ref()
            && !row_passes_filter(&agent, filter)?
        {
            return Err(AppError::NotFound(format!("agent '{agent_id}' not found")));
        }

        Ok(agent)
    }

    /// Registers an agent, recording the audit event in the same transaction.
    pub async fn create_agent(
        &self,
        actor: &UserIdentity,
        profile: AgentProfile,
    ) -> AppResult<AgentRecord> {
        self.authorization_service
            .require_permission(actor, Permission::AgentCreate)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::AgentCreated,
            Some(format!("registered agent '{}'", profile.name().as_str())),
        );
        self.repository
            .create_agent(actor.tenant_scope(), profile, audit)
            .await
    }

    /// Updates agent profile fields, recording the audit event atomically.
    pub async fn update_agent(
        &self,
        actor: &UserIdentity,
        agent_id: &str,
        profile: AgentProfile,
    ) -> AppResult<AgentRecord> {
        self.authorization_service
            .require_permission(actor, Permission::AgentUpdate)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::AgentUpdated,
            Some(format!("updated agent '{}'", profile.name().as_str())),
        );
        self.repository
            .update_agent(actor.tenant_scope(), agent_id, profile, audit)
            .await
    }

    /// Writes the agent workflow stage, recording the audit event atomically.
    pub async fn advance_stage(
        &self,
        actor: &UserIdentity,
        agent_id: &str,
        stage: WorkflowStage,
    ) -> AppResult<AgentRecord> {
        self.authorization_service
            .require_permission(actor, Permission::AgentStageAdvance)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::AgentStageAdvanced,
            Some(format!("moved agent to stage '{}'", stage.as_str())),
        );
        self.repository
            .set_agent_stage(actor.tenant_scope(), agent_id, &stage, audit)
            .await
    }

    /// Deletes an agent, recording the audit event atomically.
    pub async fn delete_agent(&self, actor: &UserIdentity, agent_id: &str) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::AgentDelete)
            .await?;

        let audit = AuditEvent::by(actor, AuditAction::AgentDeleted, None);
        self.repository
            .delete_agent(actor.tenant_scope(), agent_id, audit)
            .await
    }
}
