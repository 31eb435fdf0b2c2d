use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use veritrail_core::{AppError, AppResult, NonEmptyString};

/// Kind of record an onboarding request introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingKind {
    /// Proposal to onboard a vendor.
    Vendor,
    /// Proposal to onboard an AI agent.
    Agent,
}

impl OnboardingKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Agent => "agent",
        }
    }
}

impl FromStr for OnboardingKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "vendor" => Ok(Self::Vendor),
            "agent" => Ok(Self::Agent),
            _ => Err(AppError::Validation(format!(
                "unknown onboarding kind '{value}'"
            ))),
        }
    }
}

/// Terminal decision recorded against an onboarding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingDecision {
    /// Request accepted; the proposed record may be created.
    Approved,
    /// Request declined.
    Rejected,
}

impl OnboardingDecision {
    /// Returns the workflow stage the decision resolves to.
    #[must_use]
    pub fn as_stage(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Validated onboarding request specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingRequestSpec {
    kind: OnboardingKind,
    title: NonEmptyString,
    justification: NonEmptyString,
    payload: Value,
}

/// Input payload used to construct a validated onboarding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingRequestSpecInput {
    /// Kind of record proposed.
    pub kind: OnboardingKind,
    /// Short request title.
    pub title: String,
    /// Why the record should be onboarded.
    pub justification: String,
    /// Proposed record fields as a JSON object.
    pub payload: Value,
}

impl OnboardingRequestSpec {
    /// Creates a validated onboarding request specification.
    ///
    /// The payload must be a non-empty JSON object holding the proposed
    /// record's fields.
    pub fn new(input: OnboardingRequestSpecInput) -> AppResult<Self> {
        let OnboardingRequestSpecInput {
            kind,
            title,
            justification,
            payload,
        } = input;

        let Some(map) = payload.as_object() else {
            return Err(AppError::Validation(
                "onboarding payload must be a JSON object".to_owned(),
            ));
        };
        if map.is_empty() {
            return Err(AppError::Validation(
                "onboarding payload must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            kind,
            title: NonEmptyString::new(title)?,
            justification: NonEmptyString::new(justification)?,
            payload,
        })
    }

    /// Returns the kind of record proposed.
    #[must_use]
    pub fn kind(&self) -> OnboardingKind {
        self.kind
    }

    /// Returns the request title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the request justification.
    #[must_use]
    pub fn justification(&self) -> &NonEmptyString {
        &self.justification
    }

    /// Returns the proposed record fields.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}
