use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veritrail_core::{AppError, AppResult};

/// Kind of governed record a message thread is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Vendor record.
    Vendor,
    /// AI agent record.
    Agent,
    /// Assessment assignment.
    Assessment,
    /// Onboarding request.
    Onboarding,
}

impl ResourceKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Agent => "agent",
            Self::Assessment => "assessment",
            Self::Onboarding => "onboarding",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "vendor" => Ok(Self::Vendor),
            "agent" => Ok(Self::Agent),
            "assessment" => Ok(Self::Assessment),
            "onboarding" => Ok(Self::Onboarding),
            _ => Err(AppError::Validation(format!(
                "unknown resource kind '{value}'"
            ))),
        }
    }
}

/// Validated message body.
///
/// Bodies are trimmed, must not be blank, and are capped at 10,000 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody(String);

impl MessageBody {
    const MAX_CHARS: usize = 10_000;

    /// Creates a validated message body.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_owned();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "message body must not be empty".to_owned(),
            ));
        }

        if trimmed.chars().count() > Self::MAX_CHARS {
            return Err(AppError::Validation(format!(
                "message body must not exceed {} characters",
                Self::MAX_CHARS
            )));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated body text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<MessageBody> for String {
    fn from(value: MessageBody) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::MessageBody;

    #[test]
    fn blank_body_is_rejected() {
        assert!(MessageBody::new("   ").is_err());
    }

    #[test]
    fn body_is_trimmed() {
        let body = MessageBody::new("  please review  ");
        assert!(body.is_ok());
        assert_eq!(
            body.unwrap_or_else(|_| panic!("test")).as_str(),
            "please review"
        );
    }

    #[test]
    fn oversized_body_is_rejected() {
        assert!(MessageBody::new("x".repeat(10_001)).is_err());
    }
}
