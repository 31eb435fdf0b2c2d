use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veritrail_core::{AppError, AppResult, NonEmptyString};

use crate::user::EmailAddress;

/// Risk classification assigned to vendors and agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Minimal-impact third party.
    Low,
    /// Standard review cadence.
    Medium,
    /// Elevated review cadence.
    High,
    /// Business-critical or data-sensitive third party.
    Critical,
}

impl RiskTier {
    /// Returns a stable storage value for this tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for RiskTier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!("unknown risk tier '{value}'"))),
        }
    }
}

/// Validated vendor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProfile {
    name: NonEmptyString,
    category: Option<String>,
    contact_email: Option<EmailAddress>,
    risk_tier: RiskTier,
}

/// Input payload used to construct a validated vendor profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorProfileInput {
    /// Vendor legal or trading name.
    pub name: String,
    /// Optional vendor category label.
    pub category: Option<String>,
    /// Optional primary contact email.
    pub contact_email: Option<String>,
    /// Risk classification.
    pub risk_tier: RiskTier,
}

impl VendorProfile {
    /// Creates a validated vendor profile.
    pub fn new(input: VendorProfileInput) -> AppResult<Self> {
        let VendorProfileInput {
            name,
            category,
            contact_email,
            risk_tier,
        } = input;

        let category = category.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        let contact_email = contact_email
            .filter(|value| !value.trim().is_empty())
            .map(EmailAddress::new)
            .transpose()?;

        Ok(Self {
            name: NonEmptyString::new(name)?,
            category,
            contact_email,
            risk_tier,
        })
    }

    /// Returns the vendor name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional category label.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the optional primary contact email.
    #[must_use]
    pub fn contact_email(&self) -> Option<&EmailAddress> {
        self.contact_email.as_ref()
    }

    /// Returns the risk classification.
    #[must_use]
    pub fn risk_tier(&self) -> RiskTier {
        self.risk_tier
    }
}

#[cfg(test)]
mod tests {
    use super::{RiskTier, VendorProfile, VendorProfileInput};

    #[test]
    fn blank_name_is_rejected() {
        let profile = VendorProfile::new(VendorProfileInput {
            name: "  ".to_owned(),
            category: None,
            contact_email: None,
            risk_tier: RiskTier::Low,
        });
        assert!(profile.is_err());
    }

    #[test]
    fn malformed_contact_email_is_rejected() {
        let profile = VendorProfile::new(VendorProfileInput {
            name: "Sigma Cloud".to_owned(),
            category: Some("cloud".to_owned()),
            contact_email: Some("not-an-email".to_owned()),
            risk_tier: RiskTier::High,
        });
        assert!(profile.is_err());
    }

    #[test]
    fn empty_contact_email_is_treated_as_absent() {
        let profile = VendorProfile::new(VendorProfileInput {
            name: "Sigma Cloud".to_owned(),
            category: None,
            contact_email: Some("   ".to_owned()),
            risk_tier: RiskTier::Medium,
        });
        assert!(profile.is_ok());
        assert!(
            profile
                .unwrap_or_else(|_| panic!("test"))
                .contact_email()
                .is_none()
        );
    }
}
