use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, TenantId};

/// Fixed role enumeration attached to every user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Operates the platform across tenants.
    PlatformAdmin,
    /// Administers a single tenant.
    TenantAdmin,
    /// Owns risk reviews inside a tenant.
    RiskManager,
    /// Approves or rejects items routed for decision.
    Approver,
    /// Manages vendor and agent records.
    VendorManager,
    /// Default role with read-mostly access.
    EndUser,
}

impl UserRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlatformAdmin => "platform_admin",
            Self::TenantAdmin => "tenant_admin",
            Self::RiskManager => "risk_manager",
            Self::Approver => "approver",
            Self::VendorManager => "vendor_manager",
            Self::EndUser => "end_user",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[UserRole] = &[
            UserRole::PlatformAdmin,
            UserRole::TenantAdmin,
            UserRole::RiskManager,
            UserRole::Approver,
            UserRole::VendorManager,
            UserRole::EndUser,
        ];

        ALL
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "platform_admin" => Ok(Self::PlatformAdmin),
            "tenant_admin" => Ok(Self::TenantAdmin),
            "risk_manager" => Ok(Self::RiskManager),
            "approver" => Ok(Self::Approver),
            "vendor_manager" => Ok(Self::VendorManager),
            "end_user" => Ok(Self::EndUser),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// User information resolved from a bearer token for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: Option<String>,
    role: UserRole,
    tenant_id: Option<TenantId>,
}

impl UserIdentity {
    /// Creates a user identity from directory and tenancy data.
    ///
    /// Only platform administrators may omit the tenant; every other role is
    /// rejected without one.
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        role: UserRole,
        tenant_id: Option<TenantId>,
    ) -> Result<Self, AppError> {
        if tenant_id.is_none() && role != UserRole::PlatformAdmin {
            return Err(AppError::Validation(format!(
                "role '{}' requires a tenant assignment",
                role.as_str()
            )));
        }

        Ok(Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email,
            role,
            tenant_id,
        })
    }

    /// Returns the stable subject identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the directory holds one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the fixed role for the current user.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Returns the tenant assignment, if any.
    #[must_use]
    pub fn assigned_tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the tenant scope used for every read and write.
    ///
    /// Platform administrators without a tenant map to the hardcoded default
    /// tenant at read time.
    #[must_use]
    pub fn tenant_scope(&self) -> TenantId {
        self.tenant_id.unwrap_or_else(TenantId::platform_default)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::TenantId;

    use super::{UserIdentity, UserRole};

    #[test]
    fn role_roundtrip_storage_value() {
        for role in UserRole::all() {
            let restored = UserRole::from_str(role.as_str());
            assert_eq!(restored.ok(), Some(*role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(UserRole::from_str("superuser").is_err());
    }

    #[test]
    fn tenantless_platform_admin_maps_to_default_tenant() {
        let identity = UserIdentity::new("ops", "Ops", None, UserRole::PlatformAdmin, None);
        assert!(identity.is_ok());
        let identity = identity.unwrap_or_else(|_| panic!("test"));
        assert_eq!(identity.tenant_scope(), TenantId::platform_default());
    }

    #[test]
    fn tenantless_end_user_is_rejected() {
        let identity = UserIdentity::new("eve", "Eve", None, UserRole::EndUser, None);
        assert!(identity.is_err());
    }

    #[test]
    fn assigned_tenant_wins_over_default() {
        let tenant_id = TenantId::new();
        let identity = UserIdentity::new(
            "alice",
            "Alice",
            Some("alice@example.com".to_owned()),
            UserRole::TenantAdmin,
            Some(tenant_id),
        );
        assert!(identity.is_ok());
        let identity = identity.unwrap_or_else(|_| panic!("test"));
        assert_eq!(identity.tenant_scope(), tenant_id);
    }
}
