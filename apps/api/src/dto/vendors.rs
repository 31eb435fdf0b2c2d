use serde::{Deserialize, Serialize};
use ts_rs::TS;
use veritrail_application::VendorRecord;
use veritrail_core::AppResult;
use veritrail_domain::{LayoutType, RiskTier, VendorProfile, VendorProfileInput};

/// API representation of a vendor.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/vendor-response.ts"
)]
pub struct VendorResponse {
    /// Stable vendor identifier.
    pub vendor_id: String,
    /// Vendor name.
    pub name: String,
    /// Optional category reference.
    pub category: Option<String>,
    /// Optional contact email.
    pub contact_email: Option<String>,
    /// Assessed risk tier.
    pub risk_tier: String,
    /// Free-form workflow stage.
    pub workflow_stage: String,
    /// Layout derived from the workflow stage.
    pub layout_type: String,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

impl From<VendorRecord> for VendorResponse {
    fn from(value: VendorRecord) -> Self {
        let layout_type = LayoutType::for_stage(&value.workflow_stage).as_str().to_owned();
        Self {
            vendor_id: value.vendor_id,
            name: value.name,
            category: value.category,
            contact_email: value.contact_email,
            risk_tier: value.risk_tier,
            workflow_stage: value.workflow_stage,
            layout_type,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Incoming payload for vendor creation and update.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-vendor-request.ts"
)]
pub struct SaveVendorRequest {
    /// Vendor name.
    pub name: String,
    /// Optional category reference.
    pub category: Option<String>,
    /// Optional contact email.
    pub contact_email: Option<String>,
    /// Risk tier identifier.
    pub risk_tier: String,
}

impl SaveVendorRequest {
    /// Validates the payload into a domain profile.
    pub fn into_profile(self) -> AppResult<VendorProfile> {
        let risk_tier: RiskTier = self.risk_tier.parse()?;
        VendorProfile::new(VendorProfileInput {
            name: self.name,
            category: self.category,
            contact_email: self.contact_email,
            risk_tier,
        })
    }
}
