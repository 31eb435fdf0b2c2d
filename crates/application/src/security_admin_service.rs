use std::sync::Arc;

use async_trait::async_trait;
use veritrail_core::{AppResult, TenantId, UserIdentity, UserRole};
use veritrail_domain::{AuditAction, DataFilterRule, Permission, validate_data_filter};

use crate::{AuditEvent, AuthorizationService};

/// Role-permission matrix row returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionRecord {
    /// Role the row applies to.
    pub role: UserRole,
    /// Permission the row grants or denies.
    pub permission: Permission,
    /// Whether the row grants access.
    pub allowed: bool,
    /// Optional row-level narrowing applied to reads.
    pub data_filter: Option<DataFilterRule>,
    /// Whether the row is a tenant override or a platform default.
    pub tenant_scoped: bool,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

/// Input payload for saving a tenant role-permission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRolePermissionInput {
    /// Role the row applies to.
    pub role: UserRole,
    /// Permission the row grants or denies.
    pub permission: Permission,
    /// Whether the row grants access.
    pub allowed: bool,
    /// Optional row-level narrowing applied to reads.
    pub data_filter: Option<DataFilterRule>,
}

/// Audit log entry projection for administrative views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Stable event identifier.
    pub event_id: String,
    /// Actor subject.
    pub subject: String,
    /// Stable action identifier.
    pub action: String,
    /// Event resource type.
    pub resource_type: String,
    /// Event resource identifier.
    pub resource_id: String,
    /// Optional event detail.
    pub detail: Option<String>,
    /// Event timestamp in RFC3339.
    pub created_at: String,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Optional action filter.
    pub action: Option<String>,
    /// Optional subject filter.
    pub subject: Option<String>,
}

/// Repository port for role-permission matrix administration.
///
/// Mutations persist the given audit event atomically with the row change.
#[async_trait]
pub trait SecurityAdminRepository: Send + Sync {
    /// Lists platform defaults and tenant overrides visible to one tenant.
    async fn list_role_permissions(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<RolePermissionRecord>>;

    /// Inserts or replaces a tenant-scoped matrix row.
    async fn save_role_permission(
        &self,
        tenant_id: TenantId,
        input: SaveRolePermissionInput,
        audit: AuditEvent,
    ) -> AppResult<RolePermissionRecord>;

    /// Removes a tenant-scoped matrix row, restoring the platform default.
    async fn remove_role_permission(
        &self,
        tenant_id: TenantId,
        role: UserRole,
        permission: Permission,
        audit: AuditEvent,
    ) -> AppResult<()>;
}

/// Repository port for reading tenant audit logs.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists most recent tenant audit entries.
    async fn list_recent_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>>;
}

/// Application service for security administration workflows.
#[derive(Clone)]
pub struct SecurityAdminService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn SecurityAdminRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl SecurityAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn SecurityAdminRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_log_repository,
        }
    }

    /// Returns the effective role-permission matrix for administrative users.
    pub async fn list_role_permissions(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<RolePermissionRecord>> {
        self.authorization_service
            .require_permission(actor, Permission::SecurityPolicyManage)
            .await?;

        self.repository
            .list_role_permissions(actor.tenant_scope())
            .await
    }

    /// Saves a tenant matrix row, recording the audit event in the same
    /// transaction.
    pub async fn save_role_permission(
        &self,
        actor: &UserIdentity,
        input: SaveRolePermissionInput,
    ) -> AppResult<RolePermissionRecord> {
        self.authorization_service
            .require_permission(actor, Permission::SecurityPolicyManage)
            .await?;

        if let Some(rule) = input.data_filter.as_ref() {
            validate_data_filter(rule)?;
        }

        let audit = AuditEvent::by(
            actor,
            AuditAction::SecurityRolePermissionSaved,
            Some(format!(
                "set '{}' for role '{}' to {}",
                input.permission.as_str(),
                input.role.as_str(),
                if input.allowed { "allow" } else { "deny" }
            )),
        );
        self.repository
            .save_role_permission(actor.tenant_scope(), input, audit)
            .await
    }

    /// Removes a tenant matrix row, recording the audit event atomically.
    pub async fn remove_role_permission(
        &self,
        actor: &UserIdentity,
        role: UserRole,
        permission: Permission,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::SecurityPolicyManage)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::SecurityRolePermissionRemoved,
            Some(format!(
                "removed tenant override of '{}' for role '{}'",
                permission.as_str(),
                role.as_str()
            )),
        );
        self.repository
            .remove_role_permission(actor.tenant_scope(), role, permission, audit)
            .await
    }

    /// Returns recent audit entries.
    pub async fn list_audit_log(
        &self,
        actor: &UserIdentity,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.authorization_service
            .require_permission(actor, Permission::SecurityAuditRead)
            .await?;

        self.audit_log_repository
            .list_recent_entries(actor.tenant_scope(), query)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::Mutex;
    use veritrail_core::{AppError, AppResult, TenantId, UserIdentity, UserRole};
    use veritrail_domain::{BusinessRuleCondition, DataFilterRule, Permission};

    use crate::{
        AuditEvent, AuthorizationRepository, AuthorizationService, DataFilterSourceRepository,
        RoleGrant,
    };

    use super::{
        AuditLogEntry, AuditLogQuery, AuditLogRepository, RolePermissionRecord,
        SaveRolePermissionInput, SecurityAdminRepository, SecurityAdminService,
    };

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
    struct FakeSecurityAdminRepository {
        rows: Mutex<Vec<RolePermissionRecord>>,
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl SecurityAdminRepository for FakeSecurityAdminRepository {
        async fn list_role_permissions(
            &self,
            _tenant_id: TenantId,
        ) -> AppResult<Vec<RolePermissionRecord>> {
            Ok(self.rows.lock().await.clone())
        }

        async fn save_role_permission(
            &self,
            _tenant_id: TenantId,
            input: SaveRolePermissionInput,
            audit: AuditEvent,
        ) -> AppResult<RolePermissionRecord> {
            self.events.lock().await.push(audit);
            let row = RolePermissionRecord {
                role: input.role,
                permission: input.permission,
                allowed: input.allowed,
                data_filter: input.data_filter,
                tenant_scoped: true,
                updated_at: "2026-01-01T00:00:00Z".to_owned(),
            };
            let mut rows = self.rows.lock().await;
            rows.retain(|stored| {
                !(stored.role == row.role && stored.permission == row.permission)
            });
            rows.push(row.clone());
            Ok(row)
        }

        async fn remove_role_permission(
            &self,
            _tenant_id: TenantId,
            role: UserRole,
            permission: Permission,
            audit: AuditEvent,
        ) -> AppResult<()> {
            self.events.lock().await.push(audit);
            self.rows
                .lock()
                .await
                .retain(|stored| !(stored.role == role && stored.permission == permission));
            Ok(())
        }
    }

    struct FakeAuditLogRepository {
        entries: Vec<AuditLogEntry>,
    }

    #[async_trait]
    impl AuditLogRepository for FakeAuditLogRepository {
        async fn list_recent_entries(
            &self,
            _tenant_id: TenantId,
            _query: AuditLogQuery,
        ) -> AppResult<Vec<AuditLogEntry>> {
            Ok(self.entries.clone())
        }
    }

    fn actor() -> UserIdentity {
        UserIdentity::new(
            "alice",
            "Alice",
            None,
            UserRole::TenantAdmin,
            Some(TenantId::new()),
        )
        .unwrap_or_else(|_| panic!("test"))
    }

    fn service(
        permissions: Vec<Permission>,
    ) -> (SecurityAdminService, Arc<FakeSecurityAdminRepository>) {
        let grants = permissions
            .into_iter()
            .map(|permission| RoleGrant {
                permission,
                allowed: true,
                data_filter: None,
                tenant_scoped: true,
            })
            .collect();
        let authorization_service = AuthorizationService::new(
            Arc::new(FakeAuthorizationRepository { grants }),
            Arc::new(FakeFilterSources),
        );
        let repository = Arc::new(FakeSecurityAdminRepository::default());
        let service = SecurityAdminService::new(
            authorization_service,
            repository.clone(),
            Arc::new(FakeAuditLogRepository {
                entries: Vec::new(),
            }),
        );
        (service, repository)
    }

    #[tokio::test]
    async fn save_role_permission_requires_manage_permission() {
        let (service, _) = service(Vec::new());

        let result = service
            .save_role_permission(
                &actor(),
                SaveRolePermissionInput {
                    role: UserRole::EndUser,
                    permission: Permission::VendorRead,
                    allowed: true,
                    data_filter: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn save_role_permission_writes_audit_event() {
        let (service, repository) = service(vec![Permission::SecurityPolicyManage]);

        let result = service
            .save_role_permission(
                &actor(),
                SaveRolePermissionInput {
                    role: UserRole::EndUser,
                    permission: Permission::VendorRead,
                    allowed: true,
                    data_filter: None,
                },
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(repository.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_data_filter_is_rejected() {
        let (service, _) = service(vec![Permission::SecurityPolicyManage]);

        let result = service
            .save_role_permission(
                &actor(),
                SaveRolePermissionInput {
                    role: UserRole::EndUser,
                    permission: Permission::VendorRead,
                    allowed: true,
                    data_filter: Some(DataFilterRule::BusinessRule {
                        rule_key: "  ".to_owned(),
                    }),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn list_audit_log_requires_audit_permission() {
        let (service, _) = service(vec![Permission::SecurityPolicyManage]);

        let result = service
            .list_audit_log(
                &actor(),
                AuditLogQuery {
                    limit: 20,
                    offset: 0,
                    action: None,
                    subject: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
