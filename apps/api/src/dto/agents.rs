use serde::{Deserialize, Serialize};
use ts_rs::TS;
use veritrail_application::AgentRecord;
use veritrail_core::AppResult;
use veritrail_domain::{AgentProfile, AgentProfileInput, LayoutType, RiskTier};

/// API representation of an AI agent.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/agent-response.ts"
)]
pub struct AgentResponse {
    /// Stable agent identifier.
    pub agent_id: String,
    /// Agent name.
    pub name: String,
    /// Hosting provider.
    pub provider: String,
    /// Optional model identifier.
    pub model: Option<String>,
    /// Declared capabilities.
    pub capabilities: Vec<String>,
    /// Assessed risk tier.
    pub risk_tier: String,
    /// Accountable owner subject.
    pub owner_subject: String,
    /// Free-form workflow stage.
    pub workflow_stage: String,
    /// Layout derived from the workflow stage.
    pub layout_type: String,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Last update timestamp in RFC3339.
    pub updated_at: String,
}

impl From<AgentRecord> for AgentResponse {
    fn from(value: AgentRecord) -> Self {
        let layout_type = LayoutType::for_stage(&value.workflow_stage).as_str().to_owned();
        Self {
            agent_id: value.agent_id,
            name: value.name,
            provider: value.provider,
            model: value.model,
            capabilities: value.capabilities,
            risk_tier: value.risk_tier,
            owner_subject: value.owner_subject,
            workflow_stage: value.workflow_stage,
            layout_type,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Incoming payload for agent creation and update.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-agent-request.ts"
)]
pub struct SaveAgentRequest {
    /// Agent name.
    pub name: String,
    /// Hosting provider.
    pub provider: String,
    /// Optional model identifier.
    pub model: Option<String>,
    /// Declared capabilities.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Risk tier identifier.
    pub risk_tier: String,
    /// Accountable owner subject.
    pub owner_subject: String,
}

impl SaveAgentRequest {
    /// Validates the payload into a domain profile.
    pub fn into_profile(self) -> AppResult<AgentProfile> {
        let risk_tier: RiskTier = self.risk_tier.parse()?;
        AgentProfile::new(AgentProfileInput {
            name: self.name,
            provider: self.provider,
            model: self.model,
            capabilities: self.capabilities,
            risk_tier,
            owner_subject: self.owner_subject,
        })
    }
}
