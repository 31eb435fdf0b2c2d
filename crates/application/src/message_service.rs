use std::sync::Arc;

use async_trait::async_trait;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity};
use veritrail_domain::{AuditAction, MessageBody, Permission, ResourceKind};

use crate::{AuditEvent, AuthorizationService};

/// Message projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Stable message identifier.
    pub message_id: String,
    /// Kind of record the thread is attached to.
    pub resource_kind: String,
    /// Identifier of the record the thread is attached to.
    pub resource_id: String,
    /// Parent message for replies.
    pub parent_id: Option<String>,
    /// Author subject.
    pub author_subject: String,
    /// Message body text.
    pub body: String,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
}

/// Validated input for posting a message or reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMessageInput {
    /// Kind of record the thread is attached to.
    pub resource_kind: ResourceKind,
    /// Identifier of the record the thread is attached to.
    pub resource_id: String,
    /// Parent message for replies.
    pub parent_id: Option<String>,
    /// Message body.
    pub body: MessageBody,
}

/// Repository port for threaded message persistence.
///
/// Mutations persist the given audit event atomically with the row change.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Lists a resource thread in creation order.
    async fn list_thread(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: &str,
    ) -> AppResult<Vec<MessageRecord>>;

    /// Finds one message by identifier.
    async fn find_message(
        &self,
        tenant_id: TenantId,
        message_id: &str,
    ) -> AppResult<Option<MessageRecord>>;

    /// Appends a message to a thread.
    async fn create_message(
        &self,
        tenant_id: TenantId,
        input: PostMessageInput,
        author_subject: &str,
        audit: AuditEvent,
    ) -> AppResult<MessageRecord>;
}

/// Application service for resource-attached message threads.
#[derive(Clone)]
pub struct MessageService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn MessageRepository>,
}

impl MessageService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Lists a resource thread for the actor.
    pub async fn list_thread(
        &self,
        actor: &UserIdentity,
        resource_kind: ResourceKind,
        resource_id: &str,
    ) -> AppResult<Vec<MessageRecord>> {
        self.authorization_service
            .require_permission(actor, Permission::MessageRead)
            .await?;

        self.repository
            .list_thread(actor.tenant_scope(), resource_kind, resource_id)
            .await
    }

    /// Posts a message or reply, recording the audit event in the same
    /// transaction.
    ///
    /// A reply must target a parent inside the same resource thread.
    pub async fn post_message(
        &self,
        actor: &UserIdentity,
        input: PostMessageInput,
    ) -> AppResult<MessageRecord> {
        self.authorization_service
            .require_permission(actor, Permission::MessagePost)
            .await?;

        if let Some(parent_id) = input.parent_id.as_deref() {
            let parent = self
                .repository
                .find_message(actor.tenant_scope(), parent_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("parent message '{parent_id}' not found"))
                })?;

            if parent.resource_kind != input.resource_kind.as_str()
                || parent.resource_id != input.resource_id
            {
                return Err(AppError::Validation(format!(
                    "parent message '{parent_id}' belongs to a different thread"
                )));
            }
        }

        let audit = AuditEvent::by(
            actor,
            AuditAction::MessagePosted,
            Some(format!(
                "posted to {} '{}'",
                input.resource_kind.as_str(),
                input.resource_id
            )),
        );
        self.repository
            .create_message(actor.tenant_scope(), input, actor.subject(), audit)
            .await
    }
}
