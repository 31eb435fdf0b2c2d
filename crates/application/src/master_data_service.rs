use std::sync::Arc;

use async_trait::async_trait;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity};
use veritrail_domain::{AuditAction, MasterDataList, Permission};

use crate::{AuditEvent, AuthorizationService};

/// Repository port for master data list persistence.
///
/// Mutations persist the given audit event atomically with the row change.
#[async_trait]
pub trait MasterDataRepository: Send + Sync {
    /// Lists all lists in tenant scope.
    async fn list_lists(&self, tenant_id: TenantId) -> AppResult<Vec<MasterDataList>>;

    /// Finds one list by name.
    async fn find_list(
        &self,
        tenant_id: TenantId,
        list_name: &str,
    ) -> AppResult<Option<MasterDataList>>;

    /// Inserts or replaces a list and its values.
    async fn save_list(
        &self,
        tenant_id: TenantId,
        list: MasterDataList,
        audit: AuditEvent,
    ) -> AppResult<()>;

    /// Deletes a list and its values.
    async fn delete_list(
        &self,
        tenant_id: TenantId,
        list_name: &str,
        audit: AuditEvent,
    ) -> AppResult<()>;
}

/// Application service for tenant master data administration.
#[derive(Clone)]
pub struct MasterDataService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn MasterDataRepository>,
}

impl MasterDataService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn MasterDataRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Lists master data lists readable by the actor.
    pub async fn list_lists(&self, actor: &UserIdentity) -> AppResult<Vec<MasterDataList>> {
        self.authorization_service
            .require_permission(actor, Permission::MasterDataRead)
            .await?;

        self.repository.list_lists(actor.tenant_scope()).await
    }

    /// Returns one list by name.
    pub async fn get_list(
        &self,
        actor: &UserIdentity,
        list_name: &str,
    ) -> AppResult<MasterDataList> {
        self.authorization_service
            .require_permission(actor, Permission::MasterDataRead)
            .await?;

        self.repository
            .find_list(actor.tenant_scope(), list_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("master data list '{list_name}' not found"))
            })
    }

    /// Saves a list, recording the audit event in the same transaction.
    pub async fn save_list(
        &self,
        actor: &UserIdentity,
        list: MasterDataList,
    ) -> AppResult<MasterDataList> {
        self.authorization_service
            .require_permission(actor, Permission::MasterDataManage)
            .await?;

        let audit = AuditEvent::by(
            actor,
            AuditAction::MasterDataListSaved,
            Some(format!("saved {} value(s)", list.values().len())),
        );
        self.repository
            .save_list(actor.tenant_scope(), list.clone(), audit)
            .await?;

        Ok(list)
    }

    /// Deletes a list, recording the audit event atomically.
    pub async fn delete_list(&self, actor: &UserIdentity, list_name: &str) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::MasterDataManage)
            .await?;

        let audit = AuditEvent::by(actor, AuditAction::MasterDataListDeleted, None);
        self.repository
            .delete_list(actor.tenant_scope(), list_name, audit)
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
    use veritrail_domain::{
        BusinessRuleCondition, MasterDataList, MasterDataListInput, MasterDataValueInput,
        Permission, SelectionMode,
    };

    use crate::{
        AuditEvent, AuthorizationRepository, AuthorizationService, DataFilterSourceRepository,
        RoleGrant,
    };

    use super::{MasterDataRepository, MasterDataService};

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
    struct FakeMasterDataRepository {
        lists: Mutex<Vec<MasterDataList>>,
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl MasterDataRepository for FakeMasterDataRepository {
        async fn list_lists(&self, _tenant_id: TenantId) -> AppResult<Vec<MasterDataList>> {
            Ok(self.lists.lock().await.clone())
        }

        async fn find_list(
            &self,
            _tenant_id: TenantId,
            list_name: &str,
        ) -> AppResult<Option<MasterDataList>> {
            Ok(self
                .lists
                .lock()
                .await
                .iter()
                .find(|list| list.name() == list_name)
                .cloned())
        }

        async fn save_list(
            &self,
            _tenant_id: TenantId,
            list: MasterDataList,
            audit: AuditEvent,
        ) -> AppResult<()> {
            self.events.lock().await.push(audit);
            let mut lists = self.lists.lock().await;
            lists.retain(|stored| stored.name() != list.name());
            lists.push(list);
            Ok(())
        }

        async fn delete_list(
            &self,
            _tenant_id: TenantId,
            list_name: &str,
            audit: AuditEvent,
        ) -> AppResult<()> {
            self.events.lock().await.push(audit);
            self.lists
                .lock()
                .await
                .retain(|list| list.name() != list_name);
            Ok(())
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

    fn service(grants: Vec<RoleGrant>) -> (MasterDataService, Arc<FakeMasterDataRepository>) {
        let authorization_service = AuthorizationService::new(
            Arc::new(FakeAuthorizationRepository { grants }),
            Arc::new(FakeFilterSources),
        );
        let repository = Arc::new(FakeMasterDataRepository::default());
        let service = MasterDataService::new(authorization_service, repository.clone());
        (service, repository)
    }

    fn list() -> MasterDataList {
        MasterDataList::new(MasterDataListInput {
            name: "vendor_categories".to_owned(),
            display_name: "Vendor Categories".to_owned(),
            selection_mode: SelectionMode::Single,
            values: vec![MasterDataValueInput {
                value: "cloud".to_owned(),
                label: "Cloud".to_owned(),
                sort_order: 1,
                active: true,
            }],
        })
        .unwrap_or_else(|_| panic!("test"))
    }

    #[tokio::test]
    async fn save_list_requires_manage_permission() {
        let (service, _) = service(vec![RoleGrant {
            permission: Permission::MasterDataRead,
            allowed: true,
            data_filter: None,
            tenant_scoped: true,
        }]);

        let result = service.save_list(&actor(), list()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn save_list_writes_audit_event() {
        let (service, repository) = service(vec![RoleGrant {
            permission: Permission::MasterDataManage,
            allowed: true,
            data_filter: None,
            tenant_scoped: true,
        }]);

        let result = service.save_list(&actor(), list()).await;
        assert!(result.is_ok());
        assert_eq!(repository.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_list_reads_as_not_found() {
        let (service, _) = service(vec![RoleGrant {
            permission: Permission::MasterDataRead,
            allowed: true,
            data_filter: None,
            tenant_scoped: true,
        }]);

        let result = service.get_list(&actor(), "missing_list").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
