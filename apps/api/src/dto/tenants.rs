use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use veritrail_application::TenantRecord;
use veritrail_core::AppResult;
use veritrail_domain::{LicenseTier, TenantProfile, TenantProfileInput};

/// API representation of a tenant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/tenant-response.ts"
)]
pub struct TenantResponse {
    /// Stable tenant identifier.
    pub tenant_id: String,
    /// Unique lowercase slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Optional industry label.
    pub industry: Option<String>,
    /// BCP 47 locale.
    pub locale: String,
    /// IANA timezone name.
    pub timezone: String,
    /// Licensed feature tier.
    pub license_tier: String,
    /// Named feature toggles.
    pub feature_flags: BTreeMap<String, bool>,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
}

impl From<TenantRecord> for TenantResponse {
    fn from(value: TenantRecord) -> Self {
        Self {
            tenant_id: value.tenant_id.to_string(),
            slug: value.slug,
            name: value.name,
            industry: value.industry,
            locale: value.locale,
            timezone: value.timezone,
            license_tier: value.license_tier,
            feature_flags: value.feature_flags,
            created_at: value.created_at,
        }
    }
}

/// Incoming payload for tenant creation and update.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-tenant-request.ts"
)]
pub struct SaveTenantRequest {
    /// Unique lowercase slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Optional industry label.
    pub industry: Option<String>,
    /// BCP 47 locale, defaults to `en-US`.
    pub locale: Option<String>,
    /// IANA timezone name, defaults to `UTC`.
    pub timezone: Option<String>,
    /// Licensed feature tier.
    pub license_tier: String,
    /// Named feature toggles.
    #[serde(default)]
    pub feature_flags: BTreeMap<String, bool>,
}

impl SaveTenantRequest {
    /// Validates the payload into a domain profile.
    pub fn into_profile(self) -> AppResult<TenantProfile> {
        let license_tier: LicenseTier = self.license_tier.parse()?;
        TenantProfile::new(TenantProfileInput {
            slug: self.slug,
            name: self.name,
            industry: self.industry,
            locale: self.locale.unwrap_or_else(|| "en-US".to_owned()),
            timezone: self.timezone.unwrap_or_else(|| "UTC".to_owned()),
            license_tier,
            feature_flags: self.feature_flags,
        })
    }
}
