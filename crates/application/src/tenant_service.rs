use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity};
use veritrail_domain::{AuditAction, Permission, TenantProfile};

use crate::{AuditEvent, AuthorizationService};

/// Tenant projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRecord {
    /// Stable tenant identifier.
    pub tenant_id: TenantId,
    /// URL-safe unique tenant slug.
    pub slug: String,
    /// Organization display name.
    pub name: String,
    /// Optional industry label.
    pub industry: Option<String>,
    /// BCP 47 locale tag.
    pub locale: String,
    /// IANA timezone name.
    pub timezone: String,
    /// Commercial tier storage value.
    pub license_tier: String,
    /// Named feature toggles.
    pub feature_flags: BTreeMap<String, bool>,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
}

/// Repository port for tenant persistence.
///
/// Mutations persist the given audit event atomically with the row change.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Lists all tenants.
    async fn list_tenants(&self) -> AppResult<Vec<TenantRecord>>;

    /// Finds one tenant by identifier.
    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<TenantRecord>>;

    /// Inserts a tenant.
    async fn create_tenant(
        &self,
        profile: TenantProfile,
        audit: AuditEvent,
    ) -> AppResult<TenantRecord>;

    /// Replaces the profile fields of an existing tenant.
    async fn update_tenant(
        &self,
        tenant_id: TenantId,
        profile: TenantProfile,
        audit: AuditEvent,
    ) -> AppResult<TenantRecord>;
}

/// Application service for tenant administration.
///
/// Platform administrators operate across tenants; tenant-assigned actors are
/// confined to their own tenant even when granted the manage permission.
#[derive(Clone)]
pub struct TenantService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn TenantRepository>,
}

impl TenantService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn TenantRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Lists tenants the actor administers.
    pub async fn list_tenants(&self, actor: &UserIdentity) -> AppResult<Vec<TenantRecord>> {
        self.authorization_service
            .require_permission(actor, Permission::TenantManage)
            .await?;

        let tenants = self.repository.list_tenants().await?;
        match actor.assigned_tenant_id() {
            Some(tenant_id) => Ok(tenants
                .into_iter()
                .filter(|tenant| tenant.tenant_id == tenant_id)
                .collect()),
            None => Ok(tenants),
        }
    }

    /// Returns one tenant the actor administers.
    pub async fn get_tenant(
        &self,
        actor: &UserIdentity,
        tenant_id: TenantId,
    ) -> AppResult<TenantRecord> {
        self.authorization_service
            .require_permission(actor, Permission::TenantManage)
            .await?;
        self.require_tenant_reach(actor, tenant_id)?;

        self.repository
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' not found")))
    }

    /// Creates a tenant, recording the audit event in the same transaction.
    ///
    /// Only platform administrators without a tenant assignment may create
    /// tenants.
    pub async fn create_tenant(
        &self,
        actor: &UserIdentity,
        profile: TenantProfile,
    ) -> AppResult<TenantRecord> {
        self.authorization_service
            .require_permission(actor, Permission::TenantManage)
            .await?;

        if actor.assigned_tenant_id().is_some() {
            return Err(AppError::Forbidden(
                "tenant creation requires platform scope".to_owned(),
            ));
        }

        let audit = AuditEvent::by(
            actor,
            AuditAction::TenantCreated,
            Some(format!("created tenant '{}'", profile.slug())),
        );
        self.repository.create_tenant(profile, audit).await
    }

    /// Updates a tenant profile, recording the audit event atomically.
    pub async fn update_tenant(
        &self,
        actor: &UserIdentity,
        tenant_id: TenantId,
        profile: TenantProfile,
    ) -> AppResult<TenantRecord> {
        self.authorization_service
            .require_permission(actor, Permission::TenantManage)
            .await?;
        self.require_tenant_reach(actor, tenant_id)?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::TenantUpdated,
            Some(format!("updated tenant '{}'", profile.slug())),
        );
        self.repository
            .update_tenant(tenant_id, profile, audit)
            .await
    }

    fn require_tenant_reach(&self, actor: &UserIdentity, tenant_id: TenantId) -> AppResult<()> {
        match actor.assigned_tenant_id() {
            Some(assigned) if assigned != tenant_id => Err(AppError::Forbidden(format!(
                "tenant '{tenant_id}' is outside the actor's scope"
            ))),
            _ => Ok(()),
        }
    }
}
