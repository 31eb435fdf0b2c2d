use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use veritrail_core::{AppError, AppResult, TenantId, UserIdentity, UserRole};
use veritrail_domain::{BusinessRuleCondition, DataFilterRule, Permission, RowFilter};

/// One role-permission matrix row resolved for a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    /// Permission the row grants or denies.
    pub permission: Permission,
    /// Whether the row grants access.
    pub allowed: bool,
    /// Optional row-level narrowing applied to reads.
    pub data_filter: Option<DataFilterRule>,
    /// Whether the row is a tenant override or a platform default.
    pub tenant_scoped: bool,
}

/// Repository port for role-permission matrix lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists platform-default and tenant-scoped matrix rows for one role.
    async fn list_role_grants(
        &self,
        tenant_id: TenantId,
        role: UserRole,
    ) -> AppResult<Vec<RoleGrant>>;
}

/// Repository port resolving data filter references to concrete values.
#[async_trait]
pub trait DataFilterSourceRepository: Send + Sync {
    /// Lists active values of a tenant master data list.
    async fn list_active_list_values(
        &self,
        tenant_id: TenantId,
        list_name: &str,
    ) -> AppResult<Vec<Value>>;

    /// Finds the stored condition behind a tenant business rule.
    async fn find_business_rule_condition(
        &self,
        tenant_id: TenantId,
        rule_key: &str,
    ) -> AppResult<Option<BusinessRuleCondition>>;
}

/// Application service for tenant-scoped authorization checks.
///
/// Resolution is deny-by-default: a permission is granted only when the matrix
/// holds an allowing row for the actor's role, with a tenant-scoped row always
/// overriding the platform default.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    filter_sources: Arc<dyn DataFilterSourceRepository>,
}

impl AuthorizationService {
    /// Creates a new service from repository implementations.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthorizationRepository>,
        filter_sources: Arc<dyn DataFilterSourceRepository>,
    ) -> Self {
        Self {
            repository,
            filter_sources,
        }
    }

    /// Ensures the actor's role has the required permission in its tenant scope.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<()> {
        self.require_access(actor, permission).await.map(|_| ())
    }

    /// Ensures the actor's role has the permission and resolves its row filter.
    ///
    /// Returns `None` when access is unrestricted; returns a resolved
    /// [`RowFilter`] when the granting row carries a data filter reference.
    pub async fn require_access(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<Option<RowFilter>> {
        let tenant_id = actor.tenant_scope();
        let grant = self
            .resolve_grant(tenant_id, actor.role(), permission)
            .await?;

        let Some(grant) = grant.filter(|grant| grant.allowed) else {
            return Err(AppError::Forbidden(format!(
                "role '{}' is missing permission '{}' in tenant '{tenant_id}'",
                actor.role().as_str(),
                permission.as_str()
            )));
        };

        match grant.data_filter {
            Some(rule) => Ok(Some(self.resolve_row_filter(tenant_id, rule).await?)),
            None => Ok(None),
        }
    }

    /// Returns whether the actor's role currently has the permission.
    pub async fn has_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<bool> {
        let grant = self
            .resolve_grant(actor.tenant_scope(), actor.role(), permission)
            .await?;
        Ok(grant.is_some_and(|grant| grant.allowed))
    }

    async fn resolve_grant(
        &self,
        tenant_id: TenantId,
        role: UserRole,
        permission: Permission,
    ) -> AppResult<Option<RoleGrant>> {
        let grants = self.repository.list_role_grants(tenant_id, role).await?;

        let mut default_grant = None;
        for grant in grants {
            if grant.permission != permission {
                continue;
            }
            if grant.tenant_scoped {
                return Ok(Some(grant));
            }
            default_grant = Some(grant);
        }

        Ok(default_grant)
    }

    async fn resolve_row_filter(
        &self,
        tenant_id: TenantId,
        rule: DataFilterRule,
    ) -> AppResult<RowFilter> {
        match rule {
            DataFilterRule::MasterDataList { list_name, field } => {
                let values = self
                    .filter_sources
                    .list_active_list_values(tenant_id, &list_name)
                    .await?;
                Ok(RowFilter::In { field, values })
            }
            DataFilterRule::BusinessRule { rule_key } => {
                let condition = self
                    .filter_sources
                    .find_business_rule_condition(tenant_id, &rule_key)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(format!(
                            "data filter references unknown business rule '{rule_key}'"
                        ))
                    })?;
                Ok(condition.to_row_filter())
            }
        }
    }
}

/// Returns whether a serializable row passes a resolved filter.
///
/// Rows missing the filtered field project to JSON null, which an `In` filter
/// excludes and a `NotIn` filter admits.
pub fn row_passes_filter<T: Serialize>(row: &T, filter: &RowFilter) -> AppResult<bool> {
    let projected = serde_json::to_value(row)
        .map_err(|error| AppError::Internal(format!("failed to project row for filtering: {error}")))?;
    let field_value = projected
        .get(filter.field())
        .cloned()
        .unwrap_or(Value::Null);
    Ok(filter.matches(&field_value))
}

/// Retains only the rows admitted by an optional resolved filter.
pub fn apply_row_filter<T: Serialize>(
    rows: Vec<T>,
    filter: Option<&RowFilter>,
) -> AppResult<Vec<T>> {
    let Some(filter) = filter else {
        return Ok(rows);
    };

    let mut visible = Vec::with_capacity(rows.len());
    for row in rows {
        if row_passes_filter(&row, filter)? {
            visible.push(row);
        }
    }

    Ok(visible)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde::Serialize;
    use serde_json::{Value, json};
    use veritrail_core::{AppError, AppResult, TenantId, UserIdentity, UserRole};
    use veritrail_domain::{
        BusinessRuleCondition, BusinessRuleOperator, DataFilterRule, Permission, RowFilter,
    };

    use super::{
        AuthorizationRepository, AuthorizationService, DataFilterSourceRepository, RoleGrant,
        apply_row_filter,
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

    struct FakeFilterSources {
        list_values: Vec<Value>,
        condition: Option<BusinessRuleCondition>,
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
            Ok(self.condition.clone())
        }
    }

    fn service(grants: Vec<RoleGrant>, filter_sources: FakeFilterSources) -> AuthorizationService {
        AuthorizationService::new(
            Arc::new(FakeAuthorizationRepository { grants }),
            Arc::new(filter_sources),
        )
    }

    fn empty_sources() -> FakeFilterSources {
        FakeFilterSources {
            list_values: Vec::new(),
            condition: None,
        }
    }

    fn actor() -> UserIdentity {
        UserIdentity::new(
            "alice",
            "Alice",
            None,
            UserRole::RiskManager,
            Some(TenantId::new()),
        )
        .unwrap_or_else(|_| panic!("test"))
    }

    #[tokio::test]
    async fn missing_row_denies_by_default() {
        let service = service(Vec::new(), empty_sources());

        let result = service
            .require_permission(&actor(), Permission::VendorRead)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn tenant_row_overrides_platform_default() {
        let service = service(
            vec![
                RoleGrant {
                    permission: Permission::VendorRead,
                    allowed: true,
                    data_filter: None,
                    tenant_scoped: false,
                },
                RoleGrant {
                    permission: Permission::VendorRead,
                    allowed: false,
                    data_filter: None,
                    tenant_scoped: true,
                },
            ],
            empty_sources(),
        );

        let result = service
            .require_permission(&actor(), Permission::VendorRead)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn platform_default_applies_without_tenant_row() {
        let service = service(
            vec![RoleGrant {
                permission: Permission::VendorRead,
                allowed: true,
                data_filter: None,
                tenant_scoped: false,
            }],
            empty_sources(),
        );

        let result = service.require_access(&actor(), Permission::VendorRead).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn master_data_filter_resolves_to_in_filter() {
        let service = service(
            vec![RoleGrant {
                permission: Permission::VendorRead,
                allowed: true,
                data_filter: Some(DataFilterRule::MasterDataList {
                    list_name: "vendor_categories".to_owned(),
                    field: "category".to_owned(),
                }),
                tenant_scoped: true,
            }],
            FakeFilterSources {
                list_values: vec![json!("cloud"), json!("payroll")],
                condition: None,
            },
        );

        let filter = service.require_access(&actor(), Permission::VendorRead).await;
        assert!(filter.is_ok());
        let filter = filter.unwrap_or_else(|_| panic!("test"));
        assert_eq!(
            filter,
            Some(RowFilter::In {
                field: "category".to_owned(),
                values: vec![json!("cloud"), json!("payroll")],
            })
        );
    }

    #[tokio::test]
    async fn missing_business_rule_fails_closed() {
        let service = service(
            vec![RoleGrant {
                permission: Permission::VendorRead,
                allowed: true,
                data_filter: Some(DataFilterRule::BusinessRule {
                    rule_key: "high_risk_only".to_owned(),
                }),
                tenant_scoped: true,
            }],
            empty_sources(),
        );

        let result = service.require_access(&actor(), Permission::VendorRead).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn business_rule_filter_narrows_rows() {
        let service = service(
            vec![RoleGrant {
                permission: Permission::VendorRead,
                allowed: true,
                data_filter: Some(DataFilterRule::BusinessRule {
                    rule_key: "no_internal".to_owned(),
                }),
                tenant_scoped: false,
            }],
            FakeFilterSources {
                list_values: Vec::new(),
                condition: Some(BusinessRuleCondition {
                    field: "category".to_owned(),
                    operator: BusinessRuleOperator::NotEquals,
                    value: json!("internal"),
                }),
            },
        );

        let filter = service
            .require_access(&actor(), Permission::VendorRead)
            .await;
        assert!(filter.is_ok());

        #[derive(Serialize)]
        struct Row {
            category: String,
        }

        let rows = vec![
            Row {
                category: "internal".to_owned(),
            },
            Row {
                category: "cloud".to_owned(),
            },
        ];
        let visible = apply_row_filter(
            rows,
            filter.unwrap_or_else(|_| panic!("test")).as_ref(),
        );
        assert!(visible.is_ok());
        let visible = visible.unwrap_or_else(|_| panic!("test"));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].category, "cloud");
    }

    #[test]
    fn row_without_filtered_field_fails_in_filter() {
        #[derive(Serialize)]
        struct Row {
            name: String,
        }

        let filter = RowFilter::In {
            field: "category".to_owned(),
            values: vec![json!("cloud")],
        };
        let passes = super::row_passes_filter(
            &Row {
                name: "Sigma".to_owned(),
            },
            &filter,
        );
        assert_eq!(passes.ok(), Some(false));
    }
}
