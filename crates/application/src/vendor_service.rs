use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity};
use veritrail_domain::{AuditAction, Permission, VendorProfile, WorkflowStage};

use crate::{AuditEvent, AuthorizationService, apply_row_filter, row_passes_filter};

/// Vendor projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorRecord {
    /// Stable vendor identifier.
    pub vendor_id: String,
    /// Vendor legal or trading name.
    pub name: String,
    /// Optional category label.
    pub category: Option<String>,
    /// Optional primary contact email.
    pub contact_email: Option<String>,
    /// Risk classification storage value.
    pub risk_tier: String,
    /// Free-form workflow stage.
    pub workflow_stage: String,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

/// Repository port for vendor persistence.
///
/// Mutations persist the given audit event atomically with the row change.
#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// Lists vendors in tenant scope, excluding soft-deleted rows.
    async fn list_vendors(&self, tenant_id: TenantId) -> AppResult<Vec<VendorRecord>>;

    /// Finds one vendor by identifier.
    async fn find_vendor(
        &self,
        tenant_id: TenantId,
        vendor_id: &str,
    ) -> AppResult<Option<VendorRecord>>;

    /// Inserts a vendor in the draft stage.
    async fn create_vendor(
        &self,
        tenant_id: TenantId,
        profile: VendorProfile,
        audit: AuditEvent,
    ) -> AppResult<VendorRecord>;

    /// Replaces the profile fields of an existing vendor.
    async fn update_vendor(
        &self,
        tenant_id: TenantId,
        vendor_id: &str,
        profile: VendorProfile,
        audit: AuditEvent,
    ) -> AppResult<VendorRecord>;

    /// Writes the workflow stage of an existing vendor.
    async fn set_vendor_stage(
        &self,
        tenant_id: TenantId,
        vendor_id: &str,
        stage: &WorkflowStage,
        audit: AuditEvent,
    ) -> AppResult<VendorRecord>;

    /// Soft-deletes a vendor so history stays queryable.
    async fn soft_delete_vendor(
        &self,
        tenant_id: TenantId,
        vendor_id: &str,
        audit: AuditEvent,
    ) -> AppResult<()>;
}

/// Application service for vendor lifecycle workflows.
#[derive(Clone)]
pub struct VendorService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn VendorRepository>,
}

impl VendorService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn VendorRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Lists vendors visible to the actor after row filtering.
    pub async fn list_vendors(&self, actor: &UserIdentity) -> AppResult<Vec<VendorRecord>> {
        let filter = self
            .authorization_service
            .require_access(actor, Permission::VendorRead)
            .await?;

        let vendors = self.repository.list_vendors(actor.tenant_scope()).await?;
        apply_row_filter(vendors, filter.as_ref())
    }

    /// Returns one vendor, hiding rows excluded by the actor's row filter.
    pub async fn get_vendor(
        &self,
        actor: &UserIdentity,
        vendor_id: &str,
    ) -> AppResult<VendorRecord> {
        let filter = self
            .authorization_service
            .require_access(actor, Permission::VendorRead)
            .await?;

        let vendor = self
            .repository
            .find_vendor(actor.tenant_scope(), vendor_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("vendor '{vendor_id}' not found")))?;

        if let Some(filter) = filter.as_ref()
            && !row_passes_filter(&vendor, filter)?
        {
            return Err(AppError::NotFound(format!("vendor '{vendor_id}' not found")));
        }

        Ok(vendor)
    }

    /// Creates a vendor, recording the audit event in the same transaction.
    pub async fn create_vendor(
        &self,
        actor: &UserIdentity,
        profile: VendorProfile,
    ) -> AppResult<VendorRecord> {
        self.authorization_service
            .require_permission(actor, Permission::VendorCreate)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::VendorCreated,
            Some(format!("created vendor '{}'", profile.name().as_str())),
        );
        self.repository
            .create_vendor(actor.tenant_scope(), profile, audit)
            .await
    }

    /// Updates vendor profile fields, recording the audit event atomically.
    pub async fn update_vendor(
        &self,
        actor: &UserIdentity,
        vendor_id: &str,
        profile: VendorProfile,
    ) -> AppResult<VendorRecord> {
        self.authorization_service
            .require_permission(actor, Permission::VendorUpdate)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::VendorUpdated,
            Some(format!("updated vendor '{}'", profile.name().as_str())),
        );
        self.repository
            .update_vendor(actor.tenant_scope(), vendor_id, profile, audit)
            .await
    }

    /// Writes the vendor workflow stage, recording the audit event atomically.
    pub async fn advance_stage(
        &self,
        actor: &UserIdentity,
        vendor_id: &str,
        stage: WorkflowStage,
    ) -> AppResult<VendorRecord> {
        self.authorization_service
            .require_permission(actor, Permission::VendorStageAdvance)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::VendorStageAdvanced,
            Some(format!("moved vendor to stage '{}'", stage.as_str())),
        );
        self.repository
            .set_vendor_stage(actor.tenant_scope(), vendor_id, &stage, audit)
            .await
    }

    /// Soft-deletes a vendor, recording the audit event atomically.
    pub async fn delete_vendor(&self, actor: &UserIdentity, vendor_id: &str) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::VendorDelete)
            .await?;

        let audit = AuditEvent::by(actor, AuditAction::VendorDeleted, None);
        self.repository
            .soft_delete_vendor(actor.tenant_scope(), vendor_id, audit)
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
        BusinessRuleCondition, DataFilterRule, Permission, RiskTier, VendorProfile,
        VendorProfileInput, WorkflowStage,
    };

    use crate::{
        AuditEvent, AuthorizationRepository, AuthorizationService, DataFilterSourceRepository,
        RoleGrant,
    };

    use super::{VendorRecord, VendorRepository, VendorService};

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

    struct FakeFilterSources {
        list_values: Vec<Value>,
    }

    #[async_trait]
    impl DataFilterSourceRepository for FakeFilterSources {
        async fn list_active_list_values(
            &self,
            _tenant_id: TenantId,
            _list_name: &str,
        ) -> AppResult<Vec<Value>> {
            Ok(self.list_values.clone())
        }

        async fn find_business_rule_condition(
            &self,
            _tenant_id: TenantId,
            _rule_key: &str,
        ) -> AppResult<Option<BusinessRuleCondition>> {
            Ok(None)
        }
    }

    /// Stores the vendor and its audit event together, mirroring the
    /// all-or-nothing contract of the port. With `fail_audit` set the whole
    /// write fails and neither is stored.
    #[derive(Default)]
    struct FakeVendorRepository {
        vendors: Mutex<Vec<VendorRecord>>,
        events: Mutex<Vec<AuditEvent>>,
        fail_audit: bool,
    }

    impl FakeVendorRepository {
        async fn record_audit(&self, audit: AuditEvent) -> AppResult<()> {
            if self.fail_audit {
                return Err(AppError::Internal("audit log unavailable".to_owned()));
            }
            self.events.lock().await.push(audit);
            Ok(())
        }
    }

    fn record(vendor_id: &str, category: &str) -> VendorRecord {
        VendorRecord {
            vendor_id: vendor_id.to_owned(),
            name: format!("Vendor {vendor_id}"),
            category: Some(category.to_owned()),
            contact_email: None,
            risk_tier: "medium".to_owned(),
            workflow_stage: "draft".to_owned(),
            created_at: "2026-01-01T00:00:00Z".to_owned(),
            updated_at: "2026-01-01T00:00:00Z".to_owned(),
        }
    }

    #[async_trait]
    impl VendorRepository for FakeVendorRepository {
        async fn list_vendors(&self, _tenant_id: TenantId) -> AppResult<Vec<VendorRecord>> {
            Ok(self.vendors.lock().await.clone())
        }

        async fn find_vendor(
            &self,
            _tenant_id: TenantId,
            vendor_id: &str,
        ) -> AppResult<Option<VendorRecord>> {
            Ok(self
                .vendors
                .lock()
                .await
                .iter()
                .find(|vendor| vendor.vendor_id == vendor_id)
                .cloned())
        }

        async fn create_vendor(
            &self,
            _tenant_id: TenantId,
            profile: VendorProfile,
            audit: AuditEvent,
        ) -> AppResult<VendorRecord> {
            self.record_audit(audit).await?;
            let vendor = VendorRecord {
                vendor_id: "v-1".to_owned(),
                name: profile.name().as_str().to_owned(),
                category: profile.category().map(str::to_owned),
                contact_email: profile.contact_email().map(|email| email.as_str().to_owned()),
                risk_tier: profile.risk_tier().as_str().to_owned(),
                workflow_stage: "draft".to_owned(),
                created_at: "2026-01-01T00:00:00Z".to_owned(),
                updated_at: "2026-01-01T00:00:00Z".to_owned(),
            };
            self.vendors.lock().await.push(vendor.clone());
            Ok(vendor)
        }

        async fn update_vendor(
            &self,
            _tenant_id: TenantId,
            vendor_id: &str,
            profile: VendorProfile,
            audit: AuditEvent,
        ) -> AppResult<VendorRecord> {
            self.record_audit(audit).await?;
            let mut vendors = self.vendors.lock().await;
            let vendor = vendors
                .iter_mut()
                .find(|vendor| vendor.vendor_id == vendor_id)
                .ok_or_else(|| AppError::NotFound("vendor not found".to_owned()))?;
            vendor.name = profile.name().as_str().to_owned();
            Ok(vendor.clone())
        }

        async fn set_vendor_stage(
            &self,
            _tenant_id: TenantId,
            vendor_id: &str,
            stage: &WorkflowStage,
            audit: AuditEvent,
        ) -> AppResult<VendorRecord> {
            self.record_audit(audit).await?;
            let mut vendors = self.vendors.lock().await;
            let vendor = vendors
                .iter_mut()
                .find(|vendor| vendor.vendor_id == vendor_id)
                .ok_or_else(|| AppError::NotFound("vendor not found".to_owned()))?;
            vendor.workflow_stage = stage.as_str().to_owned();
            Ok(vendor.clone())
        }

        async fn soft_delete_vendor(
            &self,
            _tenant_id: TenantId,
            vendor_id: &str,
            audit: AuditEvent,
        ) -> AppResult<()> {
            self.record_audit(audit).await?;
            self.vendors
                .lock()
                .await
                .retain(|vendor| vendor.vendor_id != vendor_id);
            Ok(())
        }
    }

    fn actor() -> UserIdentity {
        UserIdentity::new(
            "alice",
            "Alice",
            None,
            UserRole::VendorManager,
            Some(TenantId::new()),
        )
        .unwrap_or_else(|_| panic!("test"))
    }

    fn grant(permission: Permission) -> RoleGrant {
        RoleGrant {
            permission,
            allowed: true,
            data_filter: None,
            tenant_scoped: true,
        }
    }

    fn service(
        grants: Vec<RoleGrant>,
        list_values: Vec<Value>,
        repository: Arc<FakeVendorRepository>,
    ) -> VendorService {
        let authorization_service = AuthorizationService::new(
            Arc::new(FakeAuthorizationRepository { grants }),
            Arc::new(FakeFilterSources { list_values }),
        );
        VendorService::new(authorization_service, repository)
    }

    fn profile(name: &str) -> VendorProfile {
        VendorProfile::new(VendorProfileInput {
            name: name.to_owned(),
            category: Some("cloud".to_owned()),
            contact_email: None,
            risk_tier: RiskTier::High,
        })
        .unwrap_or_else(|_| panic!("test"))
    }

    #[tokio::test]
    async fn create_vendor_requires_create_permission() {
        let service = service(
            Vec::new(),
            Vec::new(),
            Arc::new(FakeVendorRepository::default()),
        );

        let result = service.create_vendor(&actor(), profile("Sigma Cloud")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn create_vendor_writes_audit_event() {
        let repository = Arc::new(FakeVendorRepository::default());
        let service = service(
            vec![grant(Permission::VendorCreate)],
            Vec::new(),
            repository.clone(),
        );

        let result = service.create_vendor(&actor(), profile("Sigma Cloud")).await;
        assert!(result.is_ok());
        assert_eq!(repository.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_audit_write_persists_no_vendor() {
        let repository = Arc::new(FakeVendorRepository {
            fail_audit: true,
            ..FakeVendorRepository::default()
        });
        let service = service(
            vec![grant(Permission::VendorCreate)],
            Vec::new(),
            repository.clone(),
        );

        let result = service.create_vendor(&actor(), profile("Sigma Cloud")).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(repository.vendors.lock().await.is_empty());
        assert!(repository.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn list_vendors_applies_row_filter() {
        let repository = Arc::new(FakeVendorRepository::default());
        repository
            .vendors
            .lock()
            .await
            .extend([record("v-1", "cloud"), record("v-2", "staffing")]);

        let service = service(
            vec![RoleGrant {
                permission: Permission::VendorRead,
                allowed: true,
                data_filter: Some(DataFilterRule::MasterDataList {
                    list_name: "visible_categories".to_owned(),
                    field: "category".to_owned(),
                }),
                tenant_scoped: true,
            }],
            vec![json!("cloud")],
            repository,
        );

        let vendors = service.list_vendors(&actor()).await;
        assert!(vendors.is_ok());
        let vendors = vendors.unwrap_or_else(|_| panic!("test"));
        assert_eq!(vendors.len(), 1);
        assert_eq!(vendors[0].vendor_id, "v-1");
    }

    #[tokio::test]
    async fn filtered_vendor_reads_as_not_found() {
        let repository = Arc::new(FakeVendorRepository::default());
        repository
            .vendors
            .lock()
            .await
            .push(record("v-2", "staffing"));

        let service = service(
            vec![RoleGrant {
                permission: Permission::VendorRead,
                allowed: true,
                data_filter: Some(DataFilterRule::MasterDataList {
                    list_name: "visible_categories".to_owned(),
                    field: "category".to_owned(),
                }),
                tenant_scoped: true,
            }],
            vec![json!("cloud")],
            repository,
        );

        let result = service.get_vendor(&actor(), "v-2").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn advance_stage_writes_stage_and_audit_event() {
        let repository = Arc::new(FakeVendorRepository::default());
        repository.vendors.lock().await.push(record("v-1", "cloud"));

        let service = service(
            vec![grant(Permission::VendorStageAdvance)],
            Vec::new(),
            repository.clone(),
        );

        let stage = WorkflowStage::new("risk_review").unwrap_or_else(|_| panic!("test"));
        let result = service.advance_stage(&actor(), "v-1", stage).await;
        assert!(result.is_ok());
        assert_eq!(
            result.unwrap_or_else(|_| panic!("test")).workflow_stage,
            "risk_review"
        );
        assert_eq!(repository.events.lock().await.len(), 1);
    }
}
