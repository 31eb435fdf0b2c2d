use serde::{Deserialize, Serialize};
use veritrail_core::{AppError, AppResult, NonEmptyString};

use crate::vendor::RiskTier;

/// Validated AI agent profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    name: NonEmptyString,
    provider: NonEmptyString,
    model: Option<String>,
    capabilities: Vec<String>,
    risk_tier: RiskTier,
    owner_subject: NonEmptyString,
}

/// Input payload used to construct a validated AI agent profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfileInput {
    /// Agent display name.
    pub name: String,
    /// Provider or platform operating the agent.
    pub provider: String,
    /// Optional underlying model identifier.
    pub model: Option<String>,
    /// Declared capability labels.
    pub capabilities: Vec<String>,
    /// Risk classification.
    pub risk_tier: RiskTier,
    /// Subject accountable for the agent.
    pub owner_subject: String,
}

impl AgentProfile {
    /// Creates a validated AI agent profile.
    ///
    /// Capability labels are trimmed and deduplicated while preserving order.
    pub fn new(input: AgentProfileInput) -> AppResult<Self> {
        let AgentProfileInput {
            name,
            provider,
            model,
            capabilities,
            risk_tier,
            owner_subject,
        } = input;

        let model = model.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        let mut deduplicated: Vec<String> = Vec::with_capacity(capabilities.len());
        for capability in capabilities {
            let trimmed = capability.trim().to_owned();
            if trimmed.is_empty() {
                return Err(AppError::Validation(
                    "agent capability labels must not be empty".to_owned(),
                ));
            }
            if !deduplicated.contains(&trimmed) {
                deduplicated.push(trimmed);
            }
        }

        Ok(Self {
            name: NonEmptyString::new(name)?,
            provider: NonEmptyString::new(provider)?,
            model,
            capabilities: deduplicated,
            risk_tier,
            owner_subject: NonEmptyString::new(owner_subject)?,
        })
    }

    /// Returns the agent display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the provider label.
    #[must_use]
    pub fn provider(&self) -> &NonEmptyString {
        &self.provider
    }

    /// Returns the optional model identifier.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns the declared capability labels.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        self.capabilities.as_slice()
    }

    /// Returns the risk classification.
    #[must_use]
    pub fn risk_tier(&self) -> RiskTier {
        self.risk_tier
    }

    /// Returns the accountable owner subject.
    #[must_use]
    pub fn owner_subject(&self) -> &NonEmptyString {
        &self.owner_subject
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentProfile, AgentProfileInput, RiskTier};

    fn input() -> AgentProfileInput {
        AgentProfileInput {
            name: "Invoice Triage Agent".to_owned(),
            provider: "internal".to_owned(),
            model: Some("gpt-large".to_owned()),
            capabilities: vec!["read_invoices".to_owned(), "draft_replies".to_owned()],
            risk_tier: RiskTier::High,
            owner_subject: "alice".to_owned(),
        }
    }

    #[test]
    fn duplicate_capabilities_are_deduplicated() {
        let profile = AgentProfile::new(AgentProfileInput {
            capabilities: vec![
                "read_invoices".to_owned(),
                " read_invoices ".to_owned(),
                "draft_replies".to_owned(),
            ],
            ..input()
        });
        assert!(profile.is_ok());
        assert_eq!(
            profile.unwrap_or_else(|_| panic!("test")).capabilities(),
            ["read_invoices", "draft_replies"]
        );
    }

    #[test]
    fn blank_capability_is_rejected() {
        let profile = AgentProfile::new(AgentProfileInput {
            capabilities: vec!["".to_owned()],
            ..input()
        });
        assert!(profile.is_err());
    }

    #[test]
    fn blank_provider_is_rejected() {
        let profile = AgentProfile::new(AgentProfileInput {
            provider: " ".to_owned(),
            ..input()
        });
        assert!(profile.is_err());
    }
}
