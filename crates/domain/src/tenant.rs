use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veritrail_core::{AppError, AppResult, NonEmptyString};

/// Commercial tier assigned to a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseTier {
    /// Entry tier with baseline limits.
    Starter,
    /// Mid tier for growing programs.
    Professional,
    /// Full-feature tier.
    Enterprise,
}

impl LicenseTier {
    /// Returns a stable storage value for this tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }
}

impl FromStr for LicenseTier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "starter" => Ok(Self::Starter),
            "professional" => Ok(Self::Professional),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(AppError::Validation(format!(
                "unknown license tier '{value}'"
            ))),
        }
    }
}

/// Validated tenant profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantProfile {
    slug: String,
    name: NonEmptyString,
    industry: Option<String>,
    locale: String,
    timezone: String,
    license_tier: LicenseTier,
    feature_flags: BTreeMap<String, bool>,
}

/// Input payload used to construct a validated tenant profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantProfileInput {
    /// URL-safe unique tenant slug.
    pub slug: String,
    /// Organization display name.
    pub name: String,
    /// Optional industry label.
    pub industry: Option<String>,
    /// BCP 47 locale tag, e.g. `en-US`.
    pub locale: String,
    /// IANA timezone name, e.g. `Europe/Berlin`.
    pub timezone: String,
    /// Commercial tier.
    pub license_tier: LicenseTier,
    /// Named feature toggles.
    pub feature_flags: BTreeMap<String, bool>,
}

impl TenantProfile {
    /// Creates a validated tenant profile.
    pub fn new(input: TenantProfileInput) -> AppResult<Self> {
        let TenantProfileInput {
            slug,
            name,
            industry,
            locale,
            timezone,
            license_tier,
            feature_flags,
        } = input;

        let slug = slug.trim().to_lowercase();
        if slug.is_empty() {
            return Err(AppError::Validation(
                "tenant slug must not be empty".to_owned(),
            ));
        }

        let valid_slug = slug
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '-')
            && !slug.starts_with('-')
            && !slug.ends_with('-');
        if !valid_slug {
            return Err(AppError::Validation(format!(
                "tenant slug '{slug}' must contain only lowercase letters, digits, and inner hyphens"
            )));
        }

        let locale = locale.trim().to_owned();
        if locale.is_empty() {
            return Err(AppError::Validation(
                "tenant locale must not be empty".to_owned(),
            ));
        }

        let timezone = timezone.trim().to_owned();
        if timezone.is_empty() {
            return Err(AppError::Validation(
                "tenant timezone must not be empty".to_owned(),
            ));
        }

        let industry = industry.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            slug,
            name: NonEmptyString::new(name)?,
            industry,
            locale,
            timezone,
            license_tier,
            feature_flags,
        })
    }

    /// Returns the unique tenant slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the organization display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional industry label.
    #[must_use]
    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    /// Returns the locale tag.
    #[must_use]
    pub fn locale(&self) -> &str {
        self.locale.as_str()
    }

    /// Returns the timezone name.
    #[must_use]
    pub fn timezone(&self) -> &str {
        self.timezone.as_str()
    }

    /// Returns the commercial tier.
    #[must_use]
    pub fn license_tier(&self) -> LicenseTier {
        self.license_tier
    }

    /// Returns the named feature toggles.
    #[must_use]
    pub fn feature_flags(&self) -> &BTreeMap<String, bool> {
        &self.feature_flags
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{LicenseTier, TenantProfile, TenantProfileInput};

    fn input(slug: &str) -> TenantProfileInput {
        TenantProfileInput {
            slug: slug.to_owned(),
            name: "Acme Governance".to_owned(),
            industry: Some("finance".to_owned()),
            locale: "en-US".to_owned(),
            timezone: "UTC".to_owned(),
            license_tier: LicenseTier::Professional,
            feature_flags: BTreeMap::from([("agent_registry".to_owned(), true)]),
        }
    }

    #[test]
    fn profile_lowercases_slug() {
        let profile = TenantProfile::new(TenantProfileInput {
            slug: "Acme-Gov".to_owned(),
            ..input("unused")
        });
        assert!(profile.is_ok());
        assert_eq!(
            profile.unwrap_or_else(|_| panic!("test")).slug(),
            "acme-gov"
        );
    }

    #[test]
    fn slug_with_spaces_is_rejected() {
        assert!(TenantProfile::new(input("acme gov")).is_err());
    }

    #[test]
    fn slug_with_leading_hyphen_is_rejected() {
        assert!(TenantProfile::new(input("-acme")).is_err());
    }

    #[test]
    fn blank_timezone_is_rejected() {
        let profile = TenantProfile::new(TenantProfileInput {
            timezone: " ".to_owned(),
            ..input("acme")
        });
        assert!(profile.is_err());
    }
}
